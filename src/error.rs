//! # 에러 처리 모듈
//!
//! 문서 생명주기 관리자에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//! Rust에서는 예외(exception) 대신 `Result<T, E>` 타입으로 에러를 처리합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `is_not_found()`: "이미 사라진 문서"를 판별하여 멱등 삭제에 사용
//! - `from_status()`: HTTP 상태 코드와 응답 본문을 에러로 변환

use thiserror::Error;

/// 라이브러리 전체에서 사용하는 Result 별칭
pub type AppResult<T> = Result<T, AppError>;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 코디네이터는 이 에러를 경계에서 받아 종료 상태(terminal state)와
/// 사용자 알림(`LifecycleEvent`)으로 변환합니다.
/// 문서 저장소(`DocumentStore`)를 불일치 상태로 두는 에러는 없습니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 문서를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 요청 (알 수 없는 패치 경로, 빈 제목 등)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 중복 업로드 등 리소스 충돌
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 편집할 수 없는 상태의 문서 (서버 확인 전의 임시 문서)
    #[error("Document is not editable: {0}")]
    NotEditable(String),

    /// 백엔드가 404가 아닌 실패 상태 코드를 반환함
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// 네트워크/전송 계층 오류
    /// #[from]: reqwest::Error → AppError::Http 자동 변환
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON 직렬화/역직렬화 오류
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 파일 입출력 오류 (업로드 파일 읽기)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 파일에서 텍스트를 추출하지 못함
    #[error("Text extraction failed: {0}")]
    Extraction(String),

    /// 내부 오류
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 이 에러가 "대상이 이미 없음"을 뜻하는지 판별합니다.
    ///
    /// 삭제 코디네이터는 이 경우를 성공으로 취급합니다.
    /// 원하는 최종 상태("문서 없음")는 어느 쪽이 먼저 지웠든 달성되기 때문입니다.
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::NotFound => true,
            AppError::Backend { status, .. } => *status == 404 || *status == 410,
            // reqwest 에러에 상태 코드가 담겨 있으면 그것으로 판단
            AppError::Http(e) => e.status().map(|s| s.as_u16() == 404).unwrap_or(false),
            _ => false,
        }
    }

    /// HTTP 상태 코드와 응답 본문으로부터 에러를 만듭니다.
    ///
    /// 본문이 `{ "detail": ... }`(FastAPI) 또는 `{ "message": ... }` 형태이면
    /// 그 메시지를 꺼내고, 아니면 본문 전체를 메시지로 사용합니다.
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 404 {
            return AppError::NotFound;
        }

        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                // detail은 문자열일 수도, 검증 에러 배열일 수도 있습니다.
                let field = v.get("detail").or_else(|| v.get("message"))?;
                Some(match field {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
            })
            .unwrap_or_else(|| body.trim().to_string());

        AppError::Backend { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_statuses_are_classified() {
        assert!(AppError::NotFound.is_not_found());
        assert!(AppError::from_status(404, "").is_not_found());
        assert!(AppError::Backend { status: 410, message: String::new() }.is_not_found());
        assert!(!AppError::from_status(500, "boom").is_not_found());
        assert!(!AppError::BadRequest("x".into()).is_not_found());
    }

    #[test]
    fn backend_message_prefers_detail_field() {
        match AppError::from_status(422, r#"{"detail":"title missing"}"#) {
            AppError::Backend { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "title missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        match AppError::from_status(500, "plain failure\n") {
            AppError::Backend { message, .. } => assert_eq!(message, "plain failure"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
