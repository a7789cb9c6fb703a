//! # 메모리 문서 백엔드
//!
//! 테스트와 CLI의 `--offline` 모드에서 REST 백엔드를 대신합니다.
//! id별 호출 횟수를 기록하고, 테스트가 실패와 지연을 주입할 수 있습니다.

use super::DocumentBackend;
use crate::error::{AppError, AppResult};
use crate::models::{
    DeleteOutcome, Document, DocumentKind, DocumentStatus, NewDocument, PatchOperation,
};
use crate::services;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct MemoryState {
    documents: HashMap<DocumentKind, Vec<Document>>,
    next_id: u64,
    create_calls: usize,
    patch_calls: usize,
    structuring_calls: HashMap<String, usize>,
    delete_calls: HashMap<String, usize>,
    fail_next_create: bool,
    fail_next_patch: bool,
    failing_structuring: HashSet<String>,
    failing_delete: HashMap<String, u16>,
    create_delay: Duration,
    structuring_delay: Duration,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// `create`를 거치지 않고 서버 측 문서를 직접 넣습니다.
    pub fn seed(&self, kind: DocumentKind, doc: Document) {
        self.state().documents.entry(kind).or_default().push(doc);
    }

    /// 클라이언트 모르게 문서를 지웁니다 (다른 탭에서 삭제한 상황).
    pub fn remove_remotely(&self, kind: DocumentKind, id: &str) -> bool {
        let mut state = self.state();
        let docs = state.documents.entry(kind).or_default();
        let before = docs.len();
        docs.retain(|d| d.id.as_deref() != Some(id));
        docs.len() != before
    }

    pub fn contains(&self, kind: DocumentKind, id: &str) -> bool {
        self.state()
            .documents
            .get(&kind)
            .map(|docs| docs.iter().any(|d| d.id.as_deref() == Some(id)))
            .unwrap_or(false)
    }

    pub fn fail_next_create(&self) {
        self.state().fail_next_create = true;
    }

    pub fn fail_next_patch(&self) {
        self.state().fail_next_patch = true;
    }

    pub fn fail_structuring_for(&self, id: &str) {
        self.state().failing_structuring.insert(id.to_string());
    }

    pub fn clear_structuring_failures(&self) {
        self.state().failing_structuring.clear();
    }

    /// `delete(id)`가 주어진 HTTP 상태로 실패하게 합니다.
    pub fn fail_delete_with(&self, id: &str, status: u16) {
        self.state().failing_delete.insert(id.to_string(), status);
    }

    pub fn set_create_delay(&self, delay: Duration) {
        self.state().create_delay = delay;
    }

    pub fn set_structuring_delay(&self, delay: Duration) {
        self.state().structuring_delay = delay;
    }

    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }

    pub fn patch_calls(&self) -> usize {
        self.state().patch_calls
    }

    pub fn structuring_calls(&self, id: &str) -> usize {
        self.state().structuring_calls.get(id).copied().unwrap_or(0)
    }

    pub fn delete_calls(&self, id: &str) -> usize {
        self.state().delete_calls.get(id).copied().unwrap_or(0)
    }

    fn find_mut<'a>(
        state: &'a mut MemoryState,
        kind: DocumentKind,
        id: &str,
        owner_id: &str,
    ) -> AppResult<&'a mut Document> {
        state
            .documents
            .entry(kind)
            .or_default()
            .iter_mut()
            .find(|d| d.id.as_deref() == Some(id) && owned_by(d, owner_id))
            .ok_or(AppError::NotFound)
    }
}

fn owned_by(doc: &Document, owner_id: &str) -> bool {
    doc.owner_id.as_deref().map(|o| o == owner_id).unwrap_or(true)
}

fn id_prefix(kind: DocumentKind) -> char {
    match kind {
        DocumentKind::Resume => 'r',
        DocumentKind::CoverLetter => 'c',
        DocumentKind::JobDescription => 'j',
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn list(&self, kind: DocumentKind, owner_id: &str) -> AppResult<Vec<Document>> {
        Ok(self
            .state()
            .documents
            .get(&kind)
            .map(|docs| docs.iter().filter(|d| owned_by(d, owner_id)).cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, kind: DocumentKind, id: &str, owner_id: &str) -> AppResult<Document> {
        let mut state = self.state();
        Self::find_mut(&mut state, kind, id, owner_id).map(|d| d.clone())
    }

    async fn create(
        &self,
        kind: DocumentKind,
        draft: &NewDocument,
        owner_id: &str,
    ) -> AppResult<Document> {
        let delay = {
            let mut state = self.state();
            state.create_calls += 1;
            state.create_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if std::mem::take(&mut state.fail_next_create) {
            return Err(AppError::Backend {
                status: 500,
                message: "create failed".into(),
            });
        }
        if draft.title.trim().is_empty() {
            return Err(AppError::Backend {
                status: 422,
                message: "title must not be empty".into(),
            });
        }

        state.next_id += 1;
        let now = Utc::now();
        let doc = Document {
            id: Some(format!("{}{}", id_prefix(kind), state.next_id)),
            temporary_id: None,
            title: draft.title.clone(),
            content: draft.content.clone(),
            language: draft.language.clone(),
            structured_content: None,
            status: DocumentStatus::Unstructured,
            owner_id: Some(owner_id.to_string()),
            created_at: Some(now),
            updated_at: Some(now),
        };
        state.documents.entry(kind).or_default().push(doc.clone());
        Ok(doc)
    }

    async fn patch(
        &self,
        kind: DocumentKind,
        id: &str,
        owner_id: &str,
        operations: &[PatchOperation],
    ) -> AppResult<Document> {
        let mut state = self.state();
        state.patch_calls += 1;
        if std::mem::take(&mut state.fail_next_patch) {
            return Err(AppError::Backend {
                status: 500,
                message: "patch failed".into(),
            });
        }

        let doc = Self::find_mut(&mut state, kind, id, owner_id)?;
        let mut patched = services::apply(doc, operations)?;
        patched.updated_at = Some(Utc::now());
        *doc = patched.clone();
        Ok(patched)
    }

    async fn delete(
        &self,
        kind: DocumentKind,
        id: &str,
        owner_id: &str,
    ) -> AppResult<DeleteOutcome> {
        let mut state = self.state();
        *state.delete_calls.entry(id.to_string()).or_default() += 1;

        if let Some(status) = state.failing_delete.get(id).copied() {
            return Err(AppError::from_status(status, "delete failed"));
        }

        let docs = state.documents.entry(kind).or_default();
        let before = docs.len();
        docs.retain(|d| !(d.id.as_deref() == Some(id) && owned_by(d, owner_id)));
        Ok(if docs.len() == before {
            DeleteOutcome::NotFound
        } else {
            DeleteOutcome::Deleted
        })
    }

    async fn request_structuring(
        &self,
        kind: DocumentKind,
        id: &str,
        language: &str,
        owner_id: &str,
    ) -> AppResult<()> {
        let delay = {
            let mut state = self.state();
            *state.structuring_calls.entry(id.to_string()).or_default() += 1;
            state.structuring_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.failing_structuring.contains(id) {
            return Err(AppError::Backend {
                status: 502,
                message: format!("structuring of {id} failed"),
            });
        }

        let doc = Self::find_mut(&mut state, kind, id, owner_id)?;
        let sections: Vec<&str> = doc
            .content
            .split("\n\n")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        doc.structured_content = Some(json!({
            "documentType": kind.structuring_type(),
            "title": doc.title,
            "sections": sections,
        }));
        doc.language = Some(language.to_string());
        doc.status = DocumentStatus::StructuredComplete;
        doc.updated_at = Some(Utc::now());
        Ok(())
    }
}
