//! # careerdocs CLI 진입점
//!
//! 문서 컬렉션 하나를 터미널에서 다루는 명령줄 프로그램입니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. 설정 로딩 및 백엔드(HTTP 또는 메모리) 생성
//! 4. 명령 실행: list / create / edit / delete / structure

use anyhow::{bail, Context, Result};
use careerdocs::backend::{DocumentBackend, HttpBackend, MemoryBackend};
use careerdocs::config::Config;
use careerdocs::lifecycle::{
    CancelOutcome, LifecycleEvent, SaveOutcome, ScheduleOutcome, StructuringReport,
};
use careerdocs::services::FileTextExtractor;
use careerdocs::{Document, DocumentKind, NewDocument, Workspace};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "careerdocs", version, about = "Manage résumés, cover letters and job descriptions")]
struct Cli {
    /// 문서 컬렉션: resume, coverletter, jobdescription
    kind: DocumentKind,

    /// HTTP 대신 메모리 백엔드 사용 (실행이 끝나면 사라짐)
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 문서 목록 출력 (비구조화 문서는 구조화를 시작)
    List,
    /// 새 문서 생성. --file이면 파일에서 텍스트를 추출
    Create {
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "content")]
        file: Option<PathBuf>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    /// 문서 수정 (바뀐 필드만 패치로 전송)
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    /// 문서 삭제. 실행 취소 창 동안 Ctrl-C를 누르면 취소
    Delete {
        id: String,
        /// 실행 취소 창 없이 바로 삭제
        #[arg(long)]
        now: bool,
    },
    /// 비구조화 문서 구조화
    Structure {
        /// 구조화에 실패한 문서도 다시 시도
        #[arg(long)]
        retry_failed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 careerdocs 모듈을 debug 레벨로 출력합니다.
    // 로그는 stderr로 보내 명령 결과(stdout)와 섞이지 않게 합니다.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "careerdocs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // ── 3단계: 설정 및 백엔드 ──
    let config = Config::from_env().context("failed to load configuration")?;
    let backend: Arc<dyn DocumentBackend> = if cli.offline {
        tracing::warn!("Using in-memory backend, nothing will be persisted");
        Arc::new(MemoryBackend::new())
    } else {
        tracing::info!(url = %config.api_base_url, "Using HTTP backend");
        Arc::new(HttpBackend::new(&config.api_base_url, config.request_timeout)?)
    };

    let workspace = Workspace::new(cli.kind, backend, config.lifecycle_options());

    // ── 4단계: 명령 실행 ──
    match cli.command {
        Command::List => list(&workspace).await,
        Command::Create {
            title,
            file,
            content,
            language,
        } => create(&workspace, title, file, content, language).await,
        Command::Edit {
            id,
            title,
            content,
            language,
        } => edit(&workspace, &id, title, content, language).await,
        Command::Delete { id, now } => delete(&workspace, &id, now).await,
        Command::Structure { retry_failed } => structure(&workspace, retry_failed).await,
    }
}

async fn list(workspace: &Workspace) -> Result<()> {
    let refreshed = workspace.refresh().await?;
    print_documents(&refreshed.documents);

    if let Some(task) = refreshed.structuring {
        println!("structuring unstructured documents...");
        print_report(&task.await?);
        print_documents(&workspace.list());
    }
    Ok(())
}

async fn create(
    workspace: &Workspace,
    title: Option<String>,
    file: Option<PathBuf>,
    content: Option<String>,
    language: Option<String>,
) -> Result<()> {
    // 중복 검사를 위해 기존 목록을 먼저 가져옵니다.
    workspace.refresh().await?;

    let created = match (file, title) {
        (Some(path), None) => workspace.upload(&path, &FileTextExtractor).await?,
        (file, Some(title)) => {
            let content = match file {
                Some(path) => {
                    use careerdocs::services::TextExtractor;
                    FileTextExtractor.extract_text(&path).await?
                }
                None => content.unwrap_or_default(),
            };
            let mut draft = NewDocument::new(title, content);
            draft.language = language;
            if workspace.kind() == DocumentKind::JobDescription {
                workspace.create_unique(draft).await?
            } else {
                workspace.create(draft).await?
            }
        }
        (None, None) => bail!("either --title or --file is required"),
    };

    println!("created {}", created.document.key());
    if let Some(task) = created.structuring {
        print_report(&task.await?);
    }
    Ok(())
}

async fn edit(
    workspace: &Workspace,
    id: &str,
    title: Option<String>,
    content: Option<String>,
    language: Option<String>,
) -> Result<()> {
    workspace.refresh().await?;
    let original = workspace
        .get(id)
        .with_context(|| format!("document {id} not found"))?;
    // 원본은 그대로 두고 사본만 고칩니다. 저장 시 둘을 비교합니다.
    let mut edited = original.clone();

    if let Some(title) = title {
        edited.title = title;
    }
    if let Some(content) = content {
        edited.content = content;
    }
    if language.is_some() {
        edited.language = language;
    }

    match workspace.save(&original, &edited).await? {
        SaveOutcome::Unchanged => println!("nothing changed"),
        SaveOutcome::Saved(doc) => println!("saved {}", doc.key()),
    }
    Ok(())
}

async fn delete(workspace: &Workspace, id: &str, now: bool) -> Result<()> {
    workspace.refresh().await?;

    if now {
        let outcome = workspace.delete_now(id).await?;
        println!("deleted {id} ({outcome:?})");
        return Ok(());
    }

    let mut events = workspace.subscribe();
    match workspace.delete(id) {
        ScheduleOutcome::Scheduled => {}
        ScheduleOutcome::AlreadyPending => bail!("delete of {id} is already pending"),
        ScheduleOutcome::UnknownDocument => bail!("document {id} not found"),
    }
    println!(
        "deleting {id} in {}s, press Ctrl-C to undo",
        workspace.options().undo_window.as_secs()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => match workspace.cancel_delete(id) {
                CancelOutcome::Cancelled => {
                    println!("delete of {id} cancelled");
                    return Ok(());
                }
                // 창이 이미 지나 삭제가 확정되는 중. 여기서 끝내면 런타임과 함께
                // 요청이 끊기므로 Deleted/DeleteFailed 알림을 계속 기다립니다.
                CancelOutcome::NotPending => {
                    println!("delete of {id} is already being committed, waiting for it to finish");
                }
            },
            event = events.recv() => match event? {
                LifecycleEvent::Deleted { id: deleted, already_gone } if deleted == id => {
                    println!("deleted {id}{}", if already_gone { " (was already gone)" } else { "" });
                    return Ok(());
                }
                LifecycleEvent::DeleteFailed { id: failed, message } if failed == id => {
                    bail!("delete of {id} failed: {message}");
                }
                _ => {}
            }
        }
    }
}

async fn structure(workspace: &Workspace, retry_failed: bool) -> Result<()> {
    let refreshed = workspace.refresh().await?;
    // refresh가 시작한 배치를 먼저 기다립니다.
    if let Some(task) = refreshed.structuring {
        print_report(&task.await?);
    }
    if retry_failed {
        print_report(&workspace.retry_failed_structuring().await);
    }
    print_documents(&workspace.list());
    Ok(())
}

fn print_documents(documents: &[Document]) {
    if documents.is_empty() {
        println!("(no documents)");
        return;
    }
    for doc in documents {
        let created = doc
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "now".to_string());
        let status = serde_json::to_value(doc.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        println!("{:<28} {:<20} {:<16} {}", doc.key(), status, created, doc.title);
    }
}

fn print_report(report: &StructuringReport) {
    println!(
        "structured: {}, failed: {}, skipped: {}",
        report.structured.len(),
        report.failed.len(),
        report.skipped.len()
    );
    for id in &report.failed {
        println!("  structuring failed for {id}");
    }
}
