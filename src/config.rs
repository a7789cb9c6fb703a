//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 CLI 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `API_BASE_URL`: 문서 백엔드 주소
//! - `OWNER_ID`: 문서 소유자 ID (백엔드의 `user_id` 파라미터)
//! - `UNDO_WINDOW_SECS`: 삭제 실행 취소 대기 시간(초)
//! - `STRUCTURING_LANGUAGE`: 구조화 작업의 기본 언어
//! - `REQUEST_TIMEOUT_SECS`: HTTP 요청 타임아웃(초)
//!
//! 라이브러리 코드는 환경변수를 직접 읽지 않습니다.
//! 여기서 읽은 값은 `LifecycleOptions`로 변환되어 전달됩니다.

use crate::lifecycle::LifecycleOptions;
use std::env;
use std::time::Duration;

/// 설정 로딩 실패
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 필수 환경변수가 없음
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    /// 지원하지 않는 구조화 언어
    #[error("unsupported structuring language '{0}' (expected en, de or pl)")]
    Language(String),
}

/// 구조화 작업이 받아들이는 언어 코드
pub const SUPPORTED_LANGUAGES: [&str; 3] = ["en", "de", "pl"];

/// CLI 전체 설정을 담는 구조체
#[derive(Debug, Clone)]
pub struct Config {
    /// 백엔드 API 기본 주소 (기본값: "http://localhost:3002")
    pub api_base_url: String,
    /// 문서 소유자 ID
    pub owner_id: String,
    /// 삭제 실행 취소 창 (기본값: 5초)
    pub undo_window: Duration,
    /// 구조화 기본 언어 (기본값: "de")
    pub structuring_language: String,
    /// HTTP 요청 타임아웃 (기본값: 30초)
    pub request_timeout: Duration,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `OWNER_ID`는 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    pub fn from_env() -> Result<Self, ConfigError> {
        let owner_id = env::var("OWNER_ID").map_err(|_| ConfigError::Missing("OWNER_ID"))?;

        let structuring_language = env::var("STRUCTURING_LANGUAGE")
            .unwrap_or_else(|_| "de".to_string())
            .to_lowercase();
        if !SUPPORTED_LANGUAGES.contains(&structuring_language.as_str()) {
            return Err(ConfigError::Language(structuring_language));
        }

        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3002".to_string()),
            owner_id,
            // 숫자 파싱 실패 시 기본값 사용
            undo_window: Duration::from_secs(
                env::var("UNDO_WINDOW_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            structuring_language,
            request_timeout: Duration::from_secs(
                env::var("REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            ),
        })
    }

    /// 코디네이터에 넘길 생명주기 옵션을 만듭니다.
    pub fn lifecycle_options(&self) -> LifecycleOptions {
        LifecycleOptions {
            owner_id: self.owner_id.clone(),
            undo_window: self.undo_window,
            default_language: self.structuring_language.clone(),
        }
    }
}
