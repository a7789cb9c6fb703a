//! # 워크스페이스: 컬렉션 하나의 진입점
//!
//! 저장소와 네 코디네이터를 한 컬렉션(이력서, 자기소개서, 채용공고 중 하나)
//! 단위로 묶습니다. 화면 계층은 이 구조체 하나를 참조로 들고 다니면 됩니다.
//! 모든 필드가 Arc 기반이라 clone해도 같은 상태를 공유합니다.

use super::{
    CancelOutcome, CreateCoordinator, Created, DeleteCoordinator, EventSink, LifecycleContext,
    LifecycleEvent, LifecycleOptions, SaveCoordinator, SaveOutcome, ScheduleOutcome,
    StructuringOrchestrator, StructuringReport,
};
use crate::backend::DocumentBackend;
use crate::error::{AppError, AppResult};
use crate::models::{DeleteOutcome, Document, DocumentKind, NewDocument};
use crate::services::{self, TextExtractor};
use crate::store::SharedStore;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// broadcast 채널 버퍼 크기. 느린 구독자는 오래된 알림을 놓칩니다(Lagged).
const EVENT_CAPACITY: usize = 64;

/// 목록 새로고침 결과
#[derive(Debug)]
pub struct Refreshed {
    /// 화면에 보일 문서 목록
    pub documents: Vec<Document>,
    /// 비구조화 문서가 있어 시작된 배경 구조화 태스크
    pub structuring: Option<JoinHandle<StructuringReport>>,
}

#[derive(Clone)]
pub struct Workspace {
    ctx: Arc<LifecycleContext>,
    creator: CreateCoordinator,
    structuring: StructuringOrchestrator,
    deleter: DeleteCoordinator,
    saver: SaveCoordinator,
}

impl Workspace {
    pub fn new(
        kind: DocumentKind,
        backend: Arc<dyn DocumentBackend>,
        options: LifecycleOptions,
    ) -> Self {
        let ctx = Arc::new(LifecycleContext {
            kind,
            backend,
            store: SharedStore::new(),
            options,
            events: EventSink::new(EVENT_CAPACITY),
        });
        let structuring = StructuringOrchestrator::new(ctx.clone());

        Self {
            creator: CreateCoordinator::new(ctx.clone(), structuring.clone()),
            deleter: DeleteCoordinator::new(ctx.clone()),
            saver: SaveCoordinator::new(ctx.clone()),
            structuring,
            ctx,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.ctx.kind
    }

    pub fn options(&self) -> &LifecycleOptions {
        &self.ctx.options
    }

    pub fn store(&self) -> &SharedStore {
        &self.ctx.store
    }

    /// 화면에 보일 목록 (삭제 대기 문서 제외)
    pub fn list(&self) -> Vec<Document> {
        self.ctx.store.list()
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        self.ctx.store.get(id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.ctx.events.subscribe()
    }

    pub fn structuring(&self) -> &StructuringOrchestrator {
        &self.structuring
    }

    pub fn deletes(&self) -> &DeleteCoordinator {
        &self.deleter
    }

    /// 서버 목록을 가져와 저장소를 맞추고, 비구조화 문서가 있으면 구조화를 시작합니다.
    ///
    /// 목록 요청이 오가는 동안 삭제가 확정된 문서는 응답에 있어도 다시 넣지 않습니다.
    pub async fn refresh(&self) -> AppResult<Refreshed> {
        let ctx = &self.ctx;

        // ── 1단계: 조회 시작 시점의 삭제 표식을 먼저 기록 ──
        // 응답이 도착하기 전에 확정된 삭제는 이 표식보다 큰 번호를 받습니다.
        let since = ctx.store.with(|store| store.removal_mark());
        let server_docs = ctx.backend.list(ctx.kind, &ctx.options.owner_id).await?;
        tracing::debug!(kind = %ctx.kind, count = server_docs.len(), "Fetched documents");

        // ── 2단계: 한 번의 잠금 안에서 맞추고 구조화 필요 여부 확인 ──
        let needs_structuring = ctx.store.with(|store| {
            store.reconcile(server_docs, since);
            store
                .list_all()
                .iter()
                .any(|doc| doc.status.needs_structuring())
        });

        // ── 3단계: 비구조화 문서가 있으면 배경에서 구조화 ──
        let structuring = needs_structuring.then(|| self.structuring.spawn_trigger());
        Ok(Refreshed {
            documents: self.list(),
            structuring,
        })
    }

    pub async fn create(&self, draft: NewDocument) -> AppResult<Created> {
        self.creator.create(draft).await
    }

    /// 정규화된 내용이 같은 문서가 이미 있으면 임시 문서를 넣기 전에 거절합니다.
    pub async fn create_unique(&self, draft: NewDocument) -> AppResult<Created> {
        let duplicate = self.ctx.store.with(|store| {
            let existing = store.list_all();
            services::find_duplicate(&existing, &draft.content).map(|doc| doc.title.clone())
        });
        if let Some(title) = duplicate {
            tracing::warn!(%title, "Duplicate upload rejected");
            return Err(AppError::Conflict(format!(
                "a document with the same content already exists: {title}"
            )));
        }
        self.creator.create(draft).await
    }

    /// 파일에서 텍스트를 추출해 새 문서를 만듭니다.
    ///
    /// 제목은 파일 이름에서 확장자를 뗀 것입니다. 채용공고는 중복 업로드를 거절합니다.
    /// 추출 실패는 저장소를 건드리지 않습니다.
    pub async fn upload(&self, path: &Path, extractor: &dyn TextExtractor) -> AppResult<Created> {
        let content = extractor.extract_text(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let draft = NewDocument {
            title: services::title_from_filename(filename),
            content,
            language: None,
        };

        match self.ctx.kind {
            DocumentKind::JobDescription => self.create_unique(draft).await,
            _ => self.create(draft).await,
        }
    }

    /// 편집 시작 시점의 `original`과 `edited`를 비교해 바뀐 필드만 저장합니다.
    pub async fn save(&self, original: &Document, edited: &Document) -> AppResult<SaveOutcome> {
        self.saver.save(original, edited).await
    }

    pub fn delete(&self, id: &str) -> ScheduleOutcome {
        self.deleter.request_delete(id)
    }

    pub fn cancel_delete(&self, id: &str) -> CancelOutcome {
        self.deleter.cancel(id)
    }

    pub async fn delete_now(&self, id: &str) -> AppResult<DeleteOutcome> {
        self.deleter.delete_now(id).await
    }

    pub async fn structure(&self) -> StructuringReport {
        self.structuring.trigger().await
    }

    pub async fn retry_failed_structuring(&self) -> StructuringReport {
        self.structuring.retry_failed().await
    }
}
