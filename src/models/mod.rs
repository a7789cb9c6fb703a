//! # 데이터 모델 모듈
//!
//! 생명주기 관리자에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! 각 하위 모듈은 특정 관심사의 데이터 타입을 담당합니다:
//! - `document`: 문서(Document), 상태, 컬렉션 종류, 새 문서 입력
//! - `patch`: 부분 업데이트용 패치 연산
//! - `api`: 백엔드 요청/응답 봉투와 삭제 결과
//!
//! `pub use X::*;`로 하위 모듈의 항목을 재공개하여
//! `crate::models::Document`처럼 짧게 접근할 수 있게 합니다.

pub mod api;
pub mod document;
pub mod patch;

pub use api::*;
pub use document::*;
pub use patch::*;
