//! # 서비스 모듈
//!
//! 저장소 상태를 갖지 않는 순수 로직과 외부 유틸리티:
//! - `diff`: 패치 차이 계산 (`diff`, `apply`)
//! - `duplicate`: 정규화 문자열 기반 중복 감지
//! - `extract`: 업로드 파일의 텍스트 추출

pub mod diff;
pub mod duplicate;
pub mod extract;

pub use diff::{apply, diff};
pub use duplicate::{find_duplicate, normalize};
pub use extract::{title_from_filename, FileTextExtractor, TextExtractor};
