//! # 문서 백엔드 계층
//!
//! 생명주기 관리자가 소비하는 외부 협력자(문서 백엔드 API)의 계약입니다.
//! 모든 메서드는 네트워크 호출이며, 코디네이터에게는 중단 지점(suspension point)입니다.
//!
//! 구현체:
//! - `http::HttpBackend`: reqwest로 실제 REST 백엔드를 호출
//! - `memory::MemoryBackend`: 테스트/오프라인용 메모리 백엔드 (호출 횟수 기록, 실패 주입)

pub mod http;
pub mod memory;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

use crate::error::AppResult;
use crate::models::{DeleteOutcome, Document, DocumentKind, NewDocument, PatchOperation};
use async_trait::async_trait;

/// 문서 백엔드 API 계약
///
/// `Send + Sync`: 여러 tokio 태스크(삭제 타이머, 구조화 배치)가
/// `Arc<dyn DocumentBackend>`로 같은 백엔드를 공유합니다.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// 소유자의 컬렉션 전체를 가져옵니다.
    async fn list(&self, kind: DocumentKind, owner_id: &str) -> AppResult<Vec<Document>>;

    /// 문서 하나를 가져옵니다. 없으면 `AppError::NotFound`.
    async fn get(&self, kind: DocumentKind, id: &str, owner_id: &str) -> AppResult<Document>;

    /// 새 문서를 만들고 서버가 확정한 문서를 반환합니다.
    async fn create(
        &self,
        kind: DocumentKind,
        draft: &NewDocument,
        owner_id: &str,
    ) -> AppResult<Document>;

    /// 패치 연산을 적용하고 갱신된 문서를 반환합니다.
    async fn patch(
        &self,
        kind: DocumentKind,
        id: &str,
        owner_id: &str,
        operations: &[PatchOperation],
    ) -> AppResult<Document>;

    /// 문서를 삭제합니다. 이미 없으면 에러가 아니라 `DeleteOutcome::NotFound`.
    async fn delete(&self, kind: DocumentKind, id: &str, owner_id: &str)
        -> AppResult<DeleteOutcome>;

    /// 구조화 작업을 요청하고 끝날 때까지 기다립니다.
    /// 결과 문서는 이후 `get`/`list`로 가져옵니다.
    async fn request_structuring(
        &self,
        kind: DocumentKind,
        id: &str,
        language: &str,
        owner_id: &str,
    ) -> AppResult<()>;
}
