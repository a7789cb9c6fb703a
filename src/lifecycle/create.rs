//! # 생성 코디네이터 (낙관적 생성)
//!
//! 사용자가 문서를 만들면 서버 응답을 기다리지 않고 임시 문서(placeholder)를
//! 목록 맨 위에 바로 넣은 뒤, 서버 확정 문서로 교체합니다.
//!
//! 1. 세션 안에서 유일한 `temporaryId` 생성 (UUIDv7, 재사용 없음)
//! 2. `status = processing`인 임시 문서를 `upsert` ← 유일한 즉시 관찰 가능한 효과
//! 3. 백엔드에 생성 요청
//! 4. 성공: `replace(temporaryId, 서버 문서)`. 서버 문서가 `unstructured`이면
//!    그 문서 하나만 구조화 오케스트레이터에 넘김
//! 5. 실패: 임시 문서를 제거하고 에러를 호출자에게 돌려줌 (재시도 상태는 보관하지 않음)
//!
//! 서버가 `id` 없는 문서를 돌려주면 확정할 키가 없으므로 5번과 같은 실패로 처리합니다.

use super::{LifecycleContext, LifecycleEvent, StructuringOrchestrator, StructuringReport};
use crate::error::{AppError, AppResult};
use crate::models::{Document, NewDocument};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// 생성 성공 결과
#[derive(Debug)]
pub struct Created {
    /// 서버가 확정한 문서
    pub document: Document,
    /// 확정 문서가 비구조화 상태라 시작된 배경 구조화 태스크
    pub structuring: Option<JoinHandle<StructuringReport>>,
}

#[derive(Clone)]
pub struct CreateCoordinator {
    ctx: Arc<LifecycleContext>,
    structuring: StructuringOrchestrator,
}

impl CreateCoordinator {
    pub(crate) fn new(ctx: Arc<LifecycleContext>, structuring: StructuringOrchestrator) -> Self {
        Self { ctx, structuring }
    }

    /// 새 임시 ID를 만듭니다. UUIDv7이라 동시에 만들어도 겹치지 않습니다.
    pub fn next_temporary_id() -> String {
        format!("temp-{}", Uuid::now_v7())
    }

    pub async fn create(&self, draft: NewDocument) -> AppResult<Created> {
        let ctx = &self.ctx;

        // ── 1단계: 임시 문서를 목록에 바로 넣기 ──
        // 사용자는 서버 응답 전에 "처리 중" 문서를 봅니다.
        let temporary_id = Self::next_temporary_id();
        ctx.store
            .with(|store| store.upsert(Document::placeholder(&temporary_id, &draft)));
        tracing::debug!(%temporary_id, title = %draft.title, "Placeholder inserted");

        // ── 2단계: 서버에 생성 요청 ──
        // 잠금을 잡지 않은 채 기다리므로 그동안 다른 코디네이터가 저장소를 쓸 수 있습니다.
        let created = ctx
            .backend
            .create(ctx.kind, &draft, &ctx.options.owner_id)
            .await;

        // id가 없는 응답은 교체할 키가 없으므로 실패와 같게 취급합니다.
        let confirmed = created.and_then(|document| match document.id.clone() {
            Some(id) if !id.is_empty() => Ok((id, document)),
            _ => Err(AppError::Internal(
                "backend confirmed the document without an id".into(),
            )),
        });

        match confirmed {
            // ── 3단계(성공): 임시 문서를 확정 문서로 교체 ──
            Ok((id, document)) => {
                ctx.store
                    .with(|store| store.replace(&temporary_id, document.clone()));

                tracing::info!(%id, %temporary_id, kind = %ctx.kind, "Document created");
                ctx.events.emit(LifecycleEvent::Created {
                    id: id.clone(),
                    temporary_id,
                });

                // 이 문서 하나만 구조화합니다. 다른 비구조화 문서는 새로고침이 맡습니다.
                let structuring = document
                    .status
                    .needs_structuring()
                    .then(|| self.structuring.spawn_structure(vec![id]));

                Ok(Created {
                    document,
                    structuring,
                })
            }
            // ── 3단계(실패): 임시 문서 철회 ──
            Err(e) => {
                ctx.store
                    .with(|store| store.remove_by_temporary_id(&temporary_id));
                tracing::error!(%temporary_id, error = %e, "Document creation failed");
                ctx.events.emit(LifecycleEvent::CreateFailed {
                    temporary_id,
                    title: draft.title,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}
