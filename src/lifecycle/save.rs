//! # 저장 코디네이터 (부분 업데이트)
//!
//! 편집을 시작할 때 받은 원본(스냅샷)과 편집본을 비교해 바뀐 필드만 패치로 보냅니다.
//! 바뀐 것이 없으면 네트워크 호출 없이 끝납니다.
//!
//! 비교 기준이 저장소의 현재 문서가 아니라 스냅샷이므로, 편집 중에 구조화 결과가
//! 병합되어도 사용자가 건드리지 않은 `structuredContent`는 패치에 들어가지 않습니다.
//! 실패하면 저장소는 그대로이고, 호출자는 같은 스냅샷과 편집본으로 다시 저장할 수 있습니다.

use super::{LifecycleContext, LifecycleEvent};
use crate::error::{AppError, AppResult};
use crate::models::Document;
use crate::services;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// 차이가 없어 요청을 보내지 않음
    Unchanged,
    /// 서버가 반환한 갱신 문서
    Saved(Document),
}

#[derive(Clone)]
pub struct SaveCoordinator {
    ctx: Arc<LifecycleContext>,
}

impl SaveCoordinator {
    pub(crate) fn new(ctx: Arc<LifecycleContext>) -> Self {
        Self { ctx }
    }

    /// `original`은 편집을 시작할 때의 문서, `edited`는 사용자가 고친 사본입니다.
    pub async fn save(&self, original: &Document, edited: &Document) -> AppResult<SaveOutcome> {
        let ctx = &self.ctx;

        // ── 1단계: 저장 가능한 문서인지 확인 ──
        // 임시 문서(id 없음)는 아직 서버에 없으므로 패치할 수 없습니다.
        let id = edited
            .id
            .as_deref()
            .ok_or_else(|| AppError::NotEditable("document is not confirmed yet".into()))?;
        if original.id.as_deref() != Some(id) {
            return Err(AppError::BadRequest(format!(
                "edited document {id} does not match its original"
            )));
        }

        // 상태 확인은 스냅샷이 아니라 저장소의 현재 문서로 합니다.
        let current = ctx.store.get(id).ok_or(AppError::NotFound)?;
        if !current.status.is_editable() {
            return Err(AppError::NotEditable(format!("{id} is still processing")));
        }

        // ── 2단계: 스냅샷 기준으로 바뀐 필드만 추림 ──
        let operations = services::diff(original, edited);
        if operations.is_empty() {
            tracing::debug!(id, "Nothing changed, skipping save");
            return Ok(SaveOutcome::Unchanged);
        }

        // ── 3단계: 패치 전송. 실패하면 저장소는 손대지 않음 ──
        let saved = ctx
            .backend
            .patch(ctx.kind, id, &ctx.options.owner_id, &operations)
            .await
            .map_err(|e| {
                tracing::error!(id, error = %e, "Save failed");
                e
            })?;

        // ── 4단계: 서버가 돌려준 문서로 갱신 ──
        // 서버 문서에는 다른 필드(구조화 결과 등)의 최신 값도 들어 있습니다.
        // 저장 중 삭제된 문서는 되살리지 않습니다.
        ctx.store.with(|store| {
            if store.get(id).is_some() {
                store.upsert(saved.clone());
            }
        });

        tracing::info!(id, operations = operations.len(), "Document saved");
        ctx.events.emit(LifecycleEvent::Saved {
            id: id.to_string(),
            operations: operations.len(),
        });
        Ok(SaveOutcome::Saved(saved))
    }
}
