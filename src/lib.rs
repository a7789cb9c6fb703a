//! # careerdocs: 클라이언트 측 문서 생명주기 관리자
//!
//! 이력서, 자기소개서, 채용공고 문서를 최종적 일관성 백엔드와 맞추는 라이브러리입니다.
//! 서로 독립적으로 끼어들고 실패할 수 있는 세 비동기 흐름을 다룹니다:
//! 1. 낙관적 생성 (서버 확인 전에 임시 문서를 보여줌)
//! 2. 실행 취소 가능한 지연 삭제
//! 3. 새 문서의 배경 구조화 (느린 서버 작업을 기다렸다가 병합)
//!
//! 그리고 저장 전에 원본과 편집본의 최소 패치를 계산하는 차이 엔진을 제공합니다.
//!
//! 모듈 구성:
//! - `models`: 문서, 상태, 패치 연산 등 데이터 타입
//! - `store`: 컬렉션 하나의 메모리 저장소
//! - `backend`: 백엔드 API 계약과 HTTP/메모리 구현
//! - `services`: 차이 계산, 중복 감지, 텍스트 추출
//! - `lifecycle`: 생성/구조화/삭제/저장 코디네이터와 `Workspace`
//! - `config`: 환경변수 설정 (CLI용)
//! - `error`: `AppError`

pub mod backend;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod services;
pub mod store;

pub use backend::{DocumentBackend, HttpBackend, MemoryBackend};
pub use error::{AppError, AppResult};
pub use lifecycle::{LifecycleEvent, LifecycleOptions, Workspace};
pub use models::{Document, DocumentKind, DocumentStatus, NewDocument, PatchOperation};
pub use store::{DocumentStore, SharedStore};
