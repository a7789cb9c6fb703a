//! # 삭제 코디네이터 (실행 취소 가능한 지연 삭제)
//!
//! 문서 id마다 다음 상태 기계를 돌립니다:
//!
//! ```text
//! Idle ──delete──▶ PendingDelete ──cancel──▶ Idle
//!                        │
//!                   (타이머 만료)
//!                        ▼
//!                    Committing ──백엔드 삭제──▶ Removed
//! ```
//!
//! - `Idle → PendingDelete`: 저장소에 삭제 대기 표시를 켜서 목록에서 즉시 숨기고,
//!   취소 가능한 타이머(기본 5초)를 시작합니다.
//! - `PendingDelete → Idle`: 타이머 만료 전 `cancel`. 문서가 그대로 다시 보입니다.
//! - `PendingDelete → Committing`: 타이머 만료. 백엔드 삭제 요청을 보냅니다.
//!   성공이든 404든 다른 실패든, 문서는 저장소에서 제거되고 대기 표시도 지워집니다.
//!
//! 장부(`pending` 맵)의 항목은 타이머가 자신을 "확정"으로 바꾸는 순간과
//! `cancel`이 항목을 지우는 순간이 같은 잠금 안에서 경쟁합니다.
//! 그래서 만료 이후의 `cancel`은 아무 일도 하지 않으며, 이중 삭제나 부활이 없습니다.

use super::{LifecycleContext, LifecycleEvent};
use crate::error::{AppError, AppResult};
use crate::models::DeleteOutcome;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::AbortHandle;

/// `request_delete`의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// 타이머가 시작됨
    Scheduled,
    /// 이미 삭제 대기/확정 중. 타이머를 다시 시작하거나 복제하지 않음
    AlreadyPending,
    /// 저장소에 그런 id의 문서가 없음
    UnknownDocument,
}

/// `cancel`의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// 대기 중이 아님 (이미 만료되었거나 요청된 적 없음). 아무 일도 하지 않음
    NotPending,
}

/// id 하나의 현재 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePhase {
    Idle,
    PendingDelete,
    Committing,
}

#[derive(Debug)]
enum Slot {
    Pending { generation: u64, timer: AbortHandle },
    Committing,
}

#[derive(Debug, Default)]
struct Ledger {
    slots: HashMap<String, Slot>,
    next_generation: u64,
}

#[derive(Clone)]
pub struct DeleteCoordinator {
    ctx: Arc<LifecycleContext>,
    ledger: Arc<Mutex<Ledger>>,
}

impl DeleteCoordinator {
    pub(crate) fn new(ctx: Arc<LifecycleContext>) -> Self {
        Self {
            ctx,
            ledger: Arc::default(),
        }
    }

    /// 사용자가 삭제를 요청했을 때 호출합니다 (`Idle → PendingDelete`).
    ///
    /// 문서는 즉시 목록에서 사라지고, 실행 취소 창이 지나면 백엔드에서 삭제됩니다.
    pub fn request_delete(&self, id: &str) -> ScheduleOutcome {
        // 장부 잠금을 끝까지 잡아, 같은 id의 두 요청이 둘 다 타이머를 만들지 못하게 합니다.
        // 잠금 순서는 항상 장부 → 저장소입니다.
        let mut ledger = self.ledger();

        // ── 1단계: 중복 요청 확인 ──
        if ledger.slots.contains_key(id) {
            tracing::debug!(id, "Delete already pending, ignoring");
            return ScheduleOutcome::AlreadyPending;
        }

        // ── 2단계: 목록에서 즉시 숨김 ──
        // 저장소에 남겨 두므로 취소하면 같은 자리에 다시 보입니다.
        if !self.ctx.store.with(|store| store.set_pending_delete(id, true)) {
            return ScheduleOutcome::UnknownDocument;
        }

        // ── 3단계: 취소 가능한 타이머 시작 ──
        // 세대 번호: 취소 후 다시 요청했을 때 예전 타이머가 새 항목을 확정하지 못하게 합니다.
        ledger.next_generation += 1;
        let generation = ledger.next_generation;
        let undo_window = self.ctx.options.undo_window;

        // 타이머 태스크는 장부 잠금이 풀린 뒤에야 자신의 항목을 볼 수 있으므로,
        // 항목 등록보다 먼저 만료 처리가 실행되는 일은 없습니다.
        let this = self.clone();
        let owned_id = id.to_string();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(undo_window).await;
            this.on_timer_elapsed(&owned_id, generation).await;
        })
        .abort_handle(); // JoinHandle 대신 AbortHandle만 보관 (결과는 이벤트로 알림)

        ledger
            .slots
            .insert(id.to_string(), Slot::Pending { generation, timer });
        drop(ledger);

        tracing::info!(id, ?undo_window, "Delete scheduled");
        self.ctx.events.emit(LifecycleEvent::DeleteScheduled {
            id: id.to_string(),
            undo_window,
        });
        ScheduleOutcome::Scheduled
    }

    /// 실행 취소 (`PendingDelete → Idle`). 만료 이후에는 아무 일도 하지 않습니다.
    pub fn cancel(&self, id: &str) -> CancelOutcome {
        let mut ledger = self.ledger();
        // Committing 항목은 이미 백엔드 요청이 나갔으므로 되돌릴 수 없습니다.
        match ledger.slots.get(id) {
            Some(Slot::Pending { .. }) => {}
            _ => return CancelOutcome::NotPending,
        }
        if let Some(Slot::Pending { timer, .. }) = ledger.slots.remove(id) {
            // 잠들어 있는 타이머 태스크를 깨우지 않고 그대로 버립니다.
            timer.abort();
        }
        self.ctx
            .store
            .with(|store| store.set_pending_delete(id, false));
        drop(ledger);

        tracing::info!(id, "Delete cancelled");
        self.ctx
            .events
            .emit(LifecycleEvent::DeleteCancelled { id: id.to_string() });
        CancelOutcome::Cancelled
    }

    /// 실행 취소 창 없이 바로 삭제합니다.
    ///
    /// 대기 중인 타이머가 있으면 먼저 멈추므로 백엔드 호출은 여전히 한 번뿐입니다.
    /// 이미 확정 중인 id면 `AppError::Conflict`.
    pub async fn delete_now(&self, id: &str) -> AppResult<DeleteOutcome> {
        {
            let mut ledger = self.ledger();
            match ledger.slots.remove(id) {
                Some(Slot::Committing) => {
                    ledger.slots.insert(id.to_string(), Slot::Committing);
                    return Err(AppError::Conflict(format!("delete of {id} already in progress")));
                }
                Some(Slot::Pending { timer, .. }) => timer.abort(),
                None => {}
            }
            ledger.slots.insert(id.to_string(), Slot::Committing);
        }
        self.ctx
            .store
            .with(|store| store.set_pending_delete(id, true));

        self.commit(id).await
    }

    pub fn phase(&self, id: &str) -> DeletePhase {
        match self.ledger().slots.get(id) {
            None => DeletePhase::Idle,
            Some(Slot::Pending { .. }) => DeletePhase::PendingDelete,
            Some(Slot::Committing) => DeletePhase::Committing,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.ledger().slots.len()
    }

    async fn on_timer_elapsed(&self, id: &str, generation: u64) {
        {
            let mut ledger = self.ledger();
            match ledger.slots.get(id) {
                Some(Slot::Pending { generation: current, .. }) if *current == generation => {}
                // 취소되었거나 다른 요청의 항목
                _ => return,
            }
            ledger.slots.insert(id.to_string(), Slot::Committing);
        }

        // 결과는 commit 안에서 이벤트로 알립니다.
        let _ = self.commit(id).await;
    }

    /// 백엔드 삭제 후 저장소에서 제거합니다 (`Committing → Removed`).
    async fn commit(&self, id: &str) -> AppResult<DeleteOutcome> {
        let ctx = &self.ctx;

        // ── 1단계: 백엔드 삭제 (잠금 없이 대기) ──
        let result = ctx
            .backend
            .delete(ctx.kind, id, &ctx.options.owner_id)
            .await;

        // 404는 "이미 지워짐"이므로 성공으로 봅니다.
        let result = match result {
            Err(e) if e.is_not_found() => Ok(DeleteOutcome::NotFound),
            other => other,
        };

        // ── 2단계: 저장소와 장부 정리 ──
        // 어떤 결과든 "영원히 삭제 중" 상태가 남지 않도록 정리합니다.
        // remove_by_id가 제거 시점을 기록하므로, 진행 중인 목록 조회가 이 문서를 되살리지 않습니다.
        ctx.store.with(|store| store.remove_by_id(id));
        self.ledger().slots.remove(id);

        // ── 3단계: 결과 알림 ──
        match &result {
            Ok(outcome) => {
                let already_gone = *outcome == DeleteOutcome::NotFound;
                tracing::info!(id, already_gone, "Document deleted");
                ctx.events.emit(LifecycleEvent::Deleted {
                    id: id.to_string(),
                    already_gone,
                });
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Delete failed");
                ctx.events.emit(LifecycleEvent::DeleteFailed {
                    id: id.to_string(),
                    message: e.to_string(),
                });
            }
        }
        result
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|p| p.into_inner())
    }
}
