//! 통합 테스트 공용 헬퍼

#![allow(dead_code)]

use careerdocs::lifecycle::LifecycleEvent;
use careerdocs::{Document, DocumentKind, DocumentStatus, LifecycleOptions, MemoryBackend, Workspace};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;

pub const OWNER: &str = "owner-1";

pub fn workspace(kind: DocumentKind) -> (Arc<MemoryBackend>, Workspace) {
    let backend = Arc::new(MemoryBackend::new());
    let workspace = Workspace::new(kind, backend.clone(), LifecycleOptions::new(OWNER));
    (backend, workspace)
}

/// 서버에 이미 있는 문서. `age_minutes`가 클수록 오래된 문서입니다.
pub fn server_doc(id: &str, status: DocumentStatus, age_minutes: i64) -> Document {
    let created = Utc::now() - ChronoDuration::minutes(age_minutes);
    Document {
        id: Some(id.to_string()),
        temporary_id: None,
        title: format!("Document {id}"),
        content: format!("Summary of {id}\n\nExperience of {id}"),
        language: None,
        structured_content: None,
        status,
        owner_id: Some(OWNER.to_string()),
        created_at: Some(created),
        updated_at: Some(created),
    }
}

pub fn ids(docs: &[Document]) -> Vec<String> {
    docs.iter().map(|d| d.key().to_string()).collect()
}

/// 지금까지 쌓인 이벤트를 모두 꺼냅니다.
pub fn drain(rx: &mut broadcast::Receiver<LifecycleEvent>) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
