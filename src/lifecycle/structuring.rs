//! # 구조화 오케스트레이터 (Structuring Orchestrator)
//!
//! `status = unstructured`인 모든 문서를 백엔드 구조화 작업에 통과시킵니다.
//!
//! ## 알고리즘
//! 1. 호출 시점의 비구조화 문서 중, 이미 요청 중이 아닌 id만 모읍니다 (`in_flight` 집합에 등록).
//! 2. 모은 id마다 구조화 요청을 **병렬로** 보냅니다. 한 문서의 실패가 다른 문서를 막지 않습니다.
//! 3. 배치 전체가 끝나면 성공한 문서를 다시 가져와 저장소에 병합합니다.
//!    상태는 `structured_complete` 또는 `structuring_failed`가 됩니다.
//! 4. 병합이 끝난 뒤에야 `in_flight`에서 해제합니다.
//!
//! 요청 중인 id에 대해 다시 호출되면 그 id는 건너뜁니다 (멱등 재호출).
//! 요청 중에 저장소에서 사라진 문서의 결과는 버립니다 (삭제된 문서를 되살리지 않음).

use super::{LifecycleContext, LifecycleEvent};
use crate::error::AppError;
use crate::models::{Document, DocumentStatus};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

/// 한 번의 배치 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuringReport {
    /// 구조화가 끝나 `structured_complete`가 된 id
    pub structured: Vec<String>,
    /// 실패하여 `structuring_failed`가 된 id
    pub failed: Vec<String>,
    /// 이미 요청 중이어서 이번 배치에서 건너뛴 id
    pub skipped: Vec<String>,
}

impl StructuringReport {
    /// 이번 호출이 요청을 하나도 보내지 않았는지 여부
    pub fn is_empty(&self) -> bool {
        self.structured.is_empty() && self.failed.is_empty()
    }
}

/// 배치에 들어갈 문서 하나
struct Candidate {
    id: String,
    language: String,
}

/// 요청 결과: 구조화 요청 자체의 결과 + (성공 시) 다시 가져온 문서
type Outcome = (String, Result<Option<Document>, AppError>);

#[derive(Clone)]
pub struct StructuringOrchestrator {
    ctx: Arc<LifecycleContext>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl StructuringOrchestrator {
    pub(crate) fn new(ctx: Arc<LifecycleContext>) -> Self {
        Self {
            ctx,
            in_flight: Arc::default(),
        }
    }

    /// 저장소의 모든 비구조화 문서를 구조화합니다.
    pub async fn trigger(&self) -> StructuringReport {
        let ids: Vec<String> = self.ctx.store.with(|store| {
            store
                .list_all()
                .into_iter()
                .filter(|doc| doc.status.needs_structuring())
                .filter_map(|doc| doc.id)
                .collect()
        });
        self.structure(&ids).await
    }

    /// 주어진 id 중 아직 비구조화 상태인 문서만 구조화합니다.
    ///
    /// 생성 코디네이터가 새로 확정된 문서 하나만 넘길 때 사용합니다.
    pub async fn structure(&self, ids: &[String]) -> StructuringReport {
        let mut report = StructuringReport::default();
        let candidates = self.claim(ids, &mut report);
        if candidates.is_empty() {
            return report;
        }

        tracing::info!(
            kind = %self.ctx.kind,
            count = candidates.len(),
            skipped = report.skipped.len(),
            "Structuring batch started"
        );

        // ── 1단계: 구조화 요청을 모두 병렬로 보냄 ──
        // join_all: 모든 future를 동시에 진행시키고 전부 끝날 때까지 기다립니다.
        let outcomes: Vec<Outcome> = join_all(candidates.iter().map(|c| self.run_one(c))).await;

        // ── 2단계: 배치가 끝난 뒤 한 번에 병합 ──
        for (id, outcome) in outcomes {
            self.merge(&id, outcome, &mut report);
        }

        // ── 3단계: 병합 후 장부에서 해제 ──
        let mut in_flight = self.in_flight();
        for candidate in &candidates {
            in_flight.remove(&candidate.id);
        }
        drop(in_flight);

        tracing::info!(
            kind = %self.ctx.kind,
            structured = report.structured.len(),
            failed = report.failed.len(),
            "Structuring batch finished"
        );
        report
    }

    /// `trigger()`를 백그라운드 태스크로 실행합니다.
    pub fn spawn_trigger(&self) -> JoinHandle<StructuringReport> {
        let this = self.clone();
        tokio::spawn(async move { this.trigger().await })
    }

    /// `structure(ids)`를 백그라운드 태스크로 실행합니다.
    pub fn spawn_structure(&self, ids: Vec<String>) -> JoinHandle<StructuringReport> {
        let this = self.clone();
        tokio::spawn(async move { this.structure(&ids).await })
    }

    /// `structuring_failed` 문서를 다시 `unstructured`로 돌리고 배치를 실행합니다.
    pub async fn retry_failed(&self) -> StructuringReport {
        let reset = self.ctx.store.with(|store| {
            let failed: Vec<Document> = store
                .list_all()
                .into_iter()
                .filter(|doc| doc.status == DocumentStatus::StructuringFailed)
                .collect();
            let count = failed.len();
            for mut doc in failed {
                doc.status = DocumentStatus::Unstructured;
                store.upsert(doc);
            }
            count
        });
        tracing::debug!(kind = %self.ctx.kind, reset, "Retrying failed structuring");
        self.trigger().await
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight().contains(id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight().len()
    }

    /// 요청할 문서를 고르고 `in_flight`에 등록합니다.
    ///
    /// 저장소 확인과 등록이 같은 잠금 구간에서 일어나므로,
    /// 동시에 두 번 호출되어도 같은 id가 두 번 등록되지 않습니다.
    fn claim(&self, ids: &[String], report: &mut StructuringReport) -> Vec<Candidate> {
        let default_language = &self.ctx.options.default_language;
        // 잠금 순서: in_flight → 저장소. 다른 곳에서도 이 순서를 지킵니다.
        let mut in_flight = self.in_flight();
        // 같은 호출에 같은 id가 두 번 들어와도 한 번만 요청
        let mut seen = HashSet::new();

        self.ctx.store.with(|store| {
            ids.iter()
                .filter(|id| seen.insert(id.as_str()))
                .filter_map(|id| {
                    let doc = store.get(id)?;
                    if !doc.status.needs_structuring() {
                        return None;
                    }
                    // insert가 false면 다른 배치가 이미 요청 중
                    if !in_flight.insert(id.clone()) {
                        report.skipped.push(id.clone());
                        return None;
                    }
                    Some(Candidate {
                        id: id.clone(),
                        language: doc
                            .language
                            .clone()
                            .unwrap_or_else(|| default_language.clone()),
                    })
                })
                .collect()
        })
    }

    async fn run_one(&self, candidate: &Candidate) -> Outcome {
        let ctx = &self.ctx;
        let owner = ctx.options.owner_id.as_str();
        tracing::debug!(id = %candidate.id, language = %candidate.language, "Requesting structuring");

        let requested = ctx
            .backend
            .request_structuring(ctx.kind, &candidate.id, &candidate.language, owner)
            .await;

        let outcome = match requested {
            Ok(()) => match ctx.backend.get(ctx.kind, &candidate.id, owner).await {
                Ok(doc) => Ok(Some(doc)),
                Err(e) => {
                    // 작업은 성공했으므로 상태만 갱신하고, 본문은 다음 새로고침에서 받습니다.
                    tracing::warn!(id = %candidate.id, error = %e, "Structured document could not be re-fetched");
                    Ok(None)
                }
            },
            Err(e) => Err(e),
        };
        (candidate.id.clone(), outcome)
    }

    fn merge(
        &self,
        id: &str,
        outcome: Result<Option<Document>, AppError>,
        report: &mut StructuringReport,
    ) {
        // 배치를 시작할 때의 사본이 아니라 지금 저장소에 있는 문서에 병합합니다.
        // 그 사이 사용자가 저장한 제목/본문이 그대로 남습니다.
        let merged = self.ctx.store.with(|store| {
            // 요청 중에 삭제된 문서: 결과를 버림
            let Some(mut current) = store.get(id).cloned() else {
                return false;
            };

            match &outcome {
                Ok(Some(fetched)) => {
                    // 제목/본문 등 사용자가 바꿀 수 있는 필드는 건드리지 않습니다.
                    current.structured_content = fetched.structured_content.clone();
                    current.status = match fetched.status {
                        DocumentStatus::Optimized => DocumentStatus::Optimized,
                        _ => DocumentStatus::StructuredComplete,
                    };
                    current.language = fetched.language.clone().or(current.language);
                    current.updated_at = fetched.updated_at.or(current.updated_at);
                }
                Ok(None) => current.status = DocumentStatus::StructuredComplete,
                Err(_) => current.status = DocumentStatus::StructuringFailed,
            }
            store.upsert(current);
            true
        });

        if !merged {
            tracing::debug!(id, "Document left the store during structuring, result dropped");
            return;
        }

        match outcome {
            Ok(_) => {
                tracing::info!(id, "Document structured");
                report.structured.push(id.to_string());
                self.ctx
                    .events
                    .emit(LifecycleEvent::Structured { id: id.to_string() });
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "Structuring failed");
                report.failed.push(id.to_string());
                self.ctx.events.emit(LifecycleEvent::StructuringFailed {
                    id: id.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn in_flight(&self) -> MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(|p| p.into_inner())
    }
}
