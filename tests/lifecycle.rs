//! 생성, 구조화, 저장, 새로고침 흐름 통합 테스트 (메모리 백엔드)

mod common;

use careerdocs::lifecycle::{LifecycleEvent, SaveOutcome};
use careerdocs::services::FileTextExtractor;
use careerdocs::{AppError, DocumentBackend, DocumentKind, DocumentStatus, NewDocument};
use common::{drain, ids, server_doc, workspace, OWNER};
use std::time::Duration;

#[tokio::test]
async fn created_document_is_confirmed_then_structured() {
    let (backend, ws) = workspace(DocumentKind::Resume);
    let mut events = ws.subscribe();

    let created = ws
        .create(NewDocument::new("Draft A", "Summary\n\nExperience"))
        .await
        .unwrap();

    assert_eq!(created.document.id.as_deref(), Some("r1"));
    assert_eq!(created.document.status, DocumentStatus::Unstructured);

    let report = created.structuring.expect("structuring started").await.unwrap();
    assert_eq!(report.structured, vec!["r1".to_string()]);

    let doc = ws.get("r1").unwrap();
    assert_eq!(doc.status, DocumentStatus::StructuredComplete);
    assert_eq!(doc.title, "Draft A");
    assert!(doc.temporary_id.is_none());
    let structured = doc.structured_content.unwrap();
    assert_eq!(structured["documentType"], "resume");
    assert_eq!(structured["sections"][1], "Experience");
    // 문서에 언어가 없으면 기본 언어로 요청
    assert_eq!(doc.language.as_deref(), Some("de"));

    assert_eq!(ids(&ws.list()), vec!["r1"]);
    assert_eq!(backend.structuring_calls("r1"), 1);

    let events = drain(&mut events);
    assert!(matches!(&events[0], LifecycleEvent::Created { id, .. } if id == "r1"));
    assert!(events.contains(&LifecycleEvent::Structured { id: "r1".into() }));
}

#[tokio::test(start_paused = true)]
async fn placeholder_is_visible_while_create_is_in_flight() {
    let (backend, ws) = workspace(DocumentKind::CoverLetter);
    backend.set_create_delay(Duration::from_secs(2));

    let creating = {
        let ws = ws.clone();
        tokio::spawn(async move { ws.create(NewDocument::new("Anschreiben", "Sehr geehrte")).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let visible = ws.list();
    assert_eq!(visible.len(), 1);
    assert!(visible[0].is_placeholder());
    assert_eq!(visible[0].status, DocumentStatus::Processing);
    assert_eq!(visible[0].title, "Anschreiben");
    let temporary_id = visible[0].temporary_id.clone().unwrap();
    assert!(temporary_id.starts_with("temp-"));

    let created = creating.await.unwrap().unwrap();
    assert_eq!(created.document.id.as_deref(), Some("c1"));

    // 임시 문서와 확정 문서가 함께 보이는 일은 없음
    let visible = ws.list();
    assert_eq!(ids(&visible), vec!["c1"]);
    assert!(ws.store().with(|s| s.get_by_temporary_id(&temporary_id).is_none()));
}

#[tokio::test]
async fn failed_create_retracts_the_placeholder() {
    let (backend, ws) = workspace(DocumentKind::Resume);
    backend.fail_next_create();
    let mut events = ws.subscribe();

    let err = ws.create(NewDocument::new("Draft B", "text")).await.unwrap_err();

    assert!(matches!(err, AppError::Backend { status: 500, .. }));
    assert!(ws.list().is_empty());
    assert!(ws.store().with(|s| s.is_empty()));
    assert!(matches!(
        drain(&mut events).as_slice(),
        [LifecycleEvent::CreateFailed { title, .. }] if title == "Draft B"
    ));
}

#[tokio::test]
async fn concurrent_creates_get_distinct_temporary_ids() {
    let (_backend, ws) = workspace(DocumentKind::Resume);

    let (a, b) = tokio::join!(
        ws.create(NewDocument::new("A", "a")),
        ws.create(NewDocument::new("B", "b")),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.document.id, b.document.id);
    assert_eq!(ws.list().len(), 2);
    assert!(ws.list().iter().all(|d| !d.is_placeholder()));
}

#[tokio::test(start_paused = true)]
async fn overlapping_triggers_do_not_duplicate_structuring_requests() {
    let (backend, ws) = workspace(DocumentKind::Resume);
    backend.seed(DocumentKind::Resume, server_doc("r1", DocumentStatus::Unstructured, 1));
    backend.set_structuring_delay(Duration::from_secs(3));

    let refreshed = ws.refresh().await.unwrap();
    let first = refreshed.structuring.expect("unstructured document triggers structuring");

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(ws.structuring().is_in_flight("r1"));

    let second = ws.structure().await;
    assert!(second.is_empty());
    assert_eq!(second.skipped, vec!["r1".to_string()]);

    let first = first.await.unwrap();
    assert_eq!(first.structured, vec!["r1".to_string()]);
    assert_eq!(backend.structuring_calls("r1"), 1);
    assert_eq!(ws.structuring().in_flight_count(), 0);
    assert_eq!(ws.get("r1").unwrap().status, DocumentStatus::StructuredComplete);
}

#[tokio::test]
async fn one_failure_does_not_block_the_batch_and_can_be_retried() {
    let (backend, ws) = workspace(DocumentKind::Resume);
    backend.seed(DocumentKind::Resume, server_doc("r1", DocumentStatus::Unstructured, 2));
    backend.seed(DocumentKind::Resume, server_doc("r2", DocumentStatus::Unstructured, 1));
    backend.fail_structuring_for("r2");

    let report = ws.refresh().await.unwrap().structuring.unwrap().await.unwrap();
    assert_eq!(report.structured, vec!["r1".to_string()]);
    assert_eq!(report.failed, vec!["r2".to_string()]);
    assert_eq!(ws.get("r2").unwrap().status, DocumentStatus::StructuringFailed);

    // 실패한 문서는 다시 트리거해도 자동으로 재시도되지 않음
    assert!(ws.structure().await.is_empty());

    backend.clear_structuring_failures();
    let retried = ws.retry_failed_structuring().await;
    assert_eq!(retried.structured, vec!["r2".to_string()]);
    assert_eq!(ws.get("r2").unwrap().status, DocumentStatus::StructuredComplete);
    assert_eq!(backend.structuring_calls("r1"), 1);
    assert_eq!(backend.structuring_calls("r2"), 2);
}

#[tokio::test(start_paused = true)]
async fn structuring_result_for_deleted_document_is_dropped() {
    let (backend, ws) = workspace(DocumentKind::Resume);
    backend.seed(DocumentKind::Resume, server_doc("r1", DocumentStatus::Unstructured, 1));
    backend.set_structuring_delay(Duration::from_secs(2));

    let batch = ws.refresh().await.unwrap().structuring.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    ws.delete_now("r1").await.unwrap();
    let report = batch.await.unwrap();

    assert!(report.structured.is_empty());
    assert!(report.failed.is_empty());
    assert!(ws.get("r1").is_none());
    assert!(ws.list().is_empty());
}

#[tokio::test]
async fn save_sends_only_changed_fields() {
    let (backend, ws) = workspace(DocumentKind::Resume);
    backend.seed(DocumentKind::Resume, server_doc("r1", DocumentStatus::StructuredComplete, 1));
    assert!(ws.refresh().await.unwrap().structuring.is_none());
    let mut events = ws.subscribe();

    let original = ws.get("r1").unwrap();
    assert_eq!(ws.save(&original, &original).await.unwrap(), SaveOutcome::Unchanged);
    assert_eq!(backend.patch_calls(), 0);

    let mut edited = original.clone();
    edited.title = "Lebenslauf 2024".into();
    let SaveOutcome::Saved(saved) = ws.save(&original, &edited).await.unwrap() else {
        panic!("expected a save");
    };

    assert_eq!(saved.title, "Lebenslauf 2024");
    assert_eq!(saved.content, original.content);
    assert_eq!(backend.patch_calls(), 1);
    assert_eq!(ws.get("r1").unwrap().title, "Lebenslauf 2024");
    assert_eq!(
        drain(&mut events),
        vec![LifecycleEvent::Saved {
            id: "r1".into(),
            operations: 1
        }]
    );
}

#[tokio::test]
async fn failed_save_keeps_the_stored_original() {
    let (backend, ws) = workspace(DocumentKind::Resume);
    backend.seed(DocumentKind::Resume, server_doc("r1", DocumentStatus::StructuredComplete, 1));
    ws.refresh().await.unwrap();
    backend.fail_next_patch();

    let original = ws.get("r1").unwrap();
    let mut edited = original.clone();
    edited.title = "Changed".into();

    assert!(ws.save(&original, &edited).await.is_err());
    assert_eq!(ws.get("r1").unwrap().title, "Document r1");

    // 같은 편집본으로 다시 저장 가능
    assert!(matches!(
        ws.save(&original, &edited).await.unwrap(),
        SaveOutcome::Saved(_)
    ));
}

#[tokio::test]
async fn processing_documents_cannot_be_edited() {
    let (backend, ws) = workspace(DocumentKind::Resume);
    backend.seed(DocumentKind::Resume, server_doc("r1", DocumentStatus::Processing, 1));
    ws.refresh().await.unwrap();

    let original = ws.get("r1").unwrap();
    let mut edited = original.clone();
    edited.title = "Changed".into();

    assert!(matches!(
        ws.save(&original, &edited).await,
        Err(AppError::NotEditable(_))
    ));
    assert_eq!(backend.patch_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn save_from_an_older_snapshot_keeps_the_structuring_result() {
    let (backend, ws) = workspace(DocumentKind::Resume);
    backend.seed(DocumentKind::Resume, server_doc("r1", DocumentStatus::Unstructured, 1));
    backend.set_structuring_delay(Duration::from_secs(3));

    let batch = ws.refresh().await.unwrap().structuring.unwrap();

    // 구조화가 도는 동안 편집을 시작
    let original = ws.get("r1").unwrap();
    assert!(original.structured_content.is_none());
    let mut edited = original.clone();
    edited.title = "Renamed".into();

    batch.await.unwrap();
    assert!(ws.get("r1").unwrap().structured_content.is_some());

    let SaveOutcome::Saved(saved) = ws.save(&original, &edited).await.unwrap() else {
        panic!("expected a save");
    };
    assert_eq!(saved.title, "Renamed");
    assert!(saved.structured_content.is_some());

    let stored = ws.get("r1").unwrap();
    assert_eq!(stored.title, "Renamed");
    assert_eq!(stored.status, DocumentStatus::StructuredComplete);
    assert_eq!(stored.structured_content.unwrap()["sections"][0], "Summary of r1");

    let on_server = backend.get(DocumentKind::Resume, "r1", OWNER).await.unwrap();
    assert_eq!(on_server.title, "Renamed");
    assert!(on_server.structured_content.is_some());
}

#[tokio::test(start_paused = true)]
async fn title_saved_during_structuring_survives_the_merge() {
    let (backend, ws) = workspace(DocumentKind::Resume);
    backend.seed(DocumentKind::Resume, server_doc("r1", DocumentStatus::Unstructured, 1));
    backend.set_structuring_delay(Duration::from_secs(3));

    let batch = ws.refresh().await.unwrap().structuring.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(ws.structuring().is_in_flight("r1"));

    let original = ws.get("r1").unwrap();
    let mut edited = original.clone();
    edited.title = "Lebenslauf (neu)".into();
    assert!(matches!(
        ws.save(&original, &edited).await.unwrap(),
        SaveOutcome::Saved(_)
    ));

    let report = batch.await.unwrap();
    assert_eq!(report.structured, vec!["r1".to_string()]);

    // 병합은 구조화 결과만 가져오고 사용자가 바꾼 제목은 그대로 둠
    let doc = ws.get("r1").unwrap();
    assert_eq!(doc.title, "Lebenslauf (neu)");
    assert_eq!(doc.status, DocumentStatus::StructuredComplete);
    assert!(doc.structured_content.is_some());
    assert_eq!(backend.patch_calls(), 1);
    assert_eq!(backend.structuring_calls("r1"), 1);
}

#[tokio::test]
async fn save_rejects_an_original_of_another_document() {
    let (backend, ws) = workspace(DocumentKind::Resume);
    backend.seed(DocumentKind::Resume, server_doc("r1", DocumentStatus::StructuredComplete, 2));
    backend.seed(DocumentKind::Resume, server_doc("r2", DocumentStatus::StructuredComplete, 1));
    ws.refresh().await.unwrap();

    let other = ws.get("r2").unwrap();
    let mut edited = ws.get("r1").unwrap();
    edited.title = "Changed".into();

    assert!(matches!(
        ws.save(&other, &edited).await,
        Err(AppError::BadRequest(_))
    ));
    assert_eq!(backend.patch_calls(), 0);
}

#[tokio::test]
async fn refresh_reconciles_with_the_server_list() {
    let (backend, ws) = workspace(DocumentKind::CoverLetter);
    backend.seed(DocumentKind::CoverLetter, server_doc("c1", DocumentStatus::StructuredComplete, 2));
    backend.seed(DocumentKind::CoverLetter, server_doc("c2", DocumentStatus::StructuredComplete, 1));

    let first = ws.refresh().await.unwrap();
    assert_eq!(ids(&first.documents), vec!["c2", "c1"]);

    backend.remove_remotely(DocumentKind::CoverLetter, "c1");
    let second = ws.refresh().await.unwrap();
    assert_eq!(ids(&second.documents), vec!["c2"]);
    assert!(ws.get("c1").is_none());
}

#[tokio::test]
async fn duplicate_job_description_is_rejected_before_create() {
    let (backend, ws) = workspace(DocumentKind::JobDescription);
    ws.create_unique(NewDocument::new("Posting", "Senior  Rust\nEngineer"))
        .await
        .unwrap();

    let err = ws
        .create_unique(NewDocument::new("Posting again", "senior rust engineer"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(backend.create_calls(), 1);
    assert_eq!(ws.list().len(), 1);
}

#[tokio::test]
async fn upload_uses_the_file_name_as_title() {
    let (_backend, ws) = workspace(DocumentKind::JobDescription);
    let dir = std::env::temp_dir().join(format!("careerdocs-{}", uuid::Uuid::now_v7()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("backend-engineer.md");
    tokio::fs::write(&path, "  We are hiring a backend engineer.  \n")
        .await
        .unwrap();

    let created = ws.upload(&path, &FileTextExtractor).await.unwrap();
    assert_eq!(created.document.title, "backend-engineer");
    assert_eq!(created.document.content, "We are hiring a backend engineer.");

    // 같은 내용을 다시 올리면 거절
    let again = ws.upload(&path, &FileTextExtractor).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
