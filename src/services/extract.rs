//! # 파일 텍스트 추출 서비스
//!
//! 업로드된 파일을 평문 텍스트로 바꿉니다. 추출은 문서가 생명주기 관리자에
//! 들어오기 전에 일어나며, 실패해도 문서 저장소에는 아무 영향이 없습니다.
//!
//! 지원 형식:
//! - `.txt`, `.md`, `.markdown`: UTF-8로 그대로 읽기
//! - `.pdf`: `pdf-extract`로 텍스트 추출

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::path::Path;
// tokio::fs: 비동기 파일 시스템 모듈. 파일 I/O 중에도 다른 작업이 진행됩니다.
use tokio::fs;

/// 파일 → 평문 텍스트 변환기
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> AppResult<String>;
}

/// 로컬 파일에서 텍스트를 읽는 기본 구현
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTextExtractor;

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract_text(&self, path: &Path) -> AppResult<String> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let text = match extension.as_str() {
            "txt" | "md" | "markdown" => fs::read_to_string(path).await?,
            "pdf" => {
                let bytes = fs::read(path).await?;
                // PDF 파싱은 CPU 작업이므로 블로킹 스레드에서 실행합니다.
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?
                    .map_err(|e| AppError::Extraction(e.to_string()))?
            }
            other => {
                return Err(AppError::Extraction(format!(
                    "unsupported file type '.{other}'"
                )))
            }
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::Extraction(format!(
                "no text found in {}",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), chars = trimmed.chars().count(), "Extracted text");
        Ok(trimmed.to_string())
    }
}

/// 파일 이름에서 마지막 확장자를 떼어 문서 제목으로 씁니다.
///
/// # 예시
/// ```
/// use careerdocs::services::title_from_filename;
/// assert_eq!(title_from_filename("lebenslauf.pdf"), "lebenslauf");
/// assert_eq!(title_from_filename("cv.final.pdf"), "cv.final");
/// assert_eq!(title_from_filename("notes"), "notes");
/// ```
pub fn title_from_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("careerdocs-{}-{name}", uuid::Uuid::now_v7()))
    }

    #[test]
    fn titles_drop_only_the_last_extension() {
        assert_eq!(title_from_filename("Anschreiben Siemens.docx"), "Anschreiben Siemens");
        assert_eq!(title_from_filename("uploads/cv.v2.txt"), "cv.v2");
        assert_eq!(title_from_filename("trailing."), "trailing.");
    }

    #[tokio::test]
    async fn reads_plain_text_files() {
        let path = temp_path("job.txt");
        fs::write(&path, "  Rust Engineer\nRemote  \n").await.unwrap();

        let text = FileTextExtractor.extract_text(&path).await.unwrap();
        assert_eq!(text, "Rust Engineer\nRemote");

        fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn rejects_empty_and_unsupported_files() {
        let empty = temp_path("empty.md");
        fs::write(&empty, "   \n").await.unwrap();
        assert!(matches!(
            FileTextExtractor.extract_text(&empty).await,
            Err(AppError::Extraction(_))
        ));
        fs::remove_file(&empty).await.ok();

        let image = temp_path("photo.png");
        assert!(matches!(
            FileTextExtractor.extract_text(&image).await,
            Err(AppError::Extraction(_))
        ));
    }
}
