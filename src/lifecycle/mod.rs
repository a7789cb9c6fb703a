//! # 문서 생명주기 관리자
//!
//! 로컬 상태(`DocumentStore`)를 최종적 일관성(eventually consistent) 백엔드와
//! 맞추는 코디네이터들을 모아둔 모듈입니다. 컬렉션 하나마다 `Workspace` 하나를 만들고,
//! 그 안의 코디네이터들이 같은 저장소와 백엔드를 공유합니다.
//!
//! 각 하위 모듈:
//! - `create`: 낙관적 생성 (임시 문서 → 서버 확정 문서)
//! - `structuring`: 비구조화 문서의 배경 구조화 (중복 요청 없음)
//! - `delete`: 실행 취소 가능한 지연 삭제 (id당 타이머 하나)
//! - `save`: 패치 차이 계산 후 부분 업데이트
//! - `events`: 종료 상태 알림 (`LifecycleEvent`)
//! - `workspace`: 위 코디네이터를 묶은 컬렉션 단위 진입점
//!
//! ## 동시성 모델
//! 코디네이터는 tokio 태스크 위에서 돌지만, 불변식은 잠금 구간 안의
//! 장부(book-keeping) 집합으로 지킵니다: "구조화 요청 중인 id", "삭제 대기 중인 id".
//! 잠금은 `.await`를 넘어 유지하지 않습니다.

pub mod create;
pub mod delete;
pub mod events;
pub mod save;
pub mod structuring;
pub mod workspace;

pub use create::{Created, CreateCoordinator};
pub use delete::{CancelOutcome, DeleteCoordinator, DeletePhase, ScheduleOutcome};
pub use events::{EventSink, LifecycleEvent};
pub use save::{SaveCoordinator, SaveOutcome};
pub use structuring::{StructuringOrchestrator, StructuringReport};
pub use workspace::{Refreshed, Workspace};

use crate::backend::DocumentBackend;
use crate::models::DocumentKind;
use crate::store::SharedStore;
use std::sync::Arc;
use std::time::Duration;

/// 기본 삭제 실행 취소 창
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(5);

/// 코디네이터 동작 옵션
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// 백엔드 호출에 넘기는 소유자 ID
    pub owner_id: String,
    /// 삭제 요청 후 실제 삭제까지의 대기 시간
    pub undo_window: Duration,
    /// 문서에 언어가 없을 때 구조화에 쓰는 언어
    pub default_language: String,
}

impl LifecycleOptions {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            undo_window: DEFAULT_UNDO_WINDOW,
            default_language: "de".to_string(),
        }
    }

    pub fn with_undo_window(mut self, undo_window: Duration) -> Self {
        self.undo_window = undo_window;
        self
    }

    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }
}

/// 한 컬렉션의 코디네이터들이 공유하는 의존성
#[derive(Clone)]
pub(crate) struct LifecycleContext {
    pub kind: DocumentKind,
    pub backend: Arc<dyn DocumentBackend>,
    pub store: SharedStore,
    pub options: LifecycleOptions,
    pub events: EventSink,
}
