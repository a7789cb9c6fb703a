use serde::{Deserialize, Serialize};

/// 백엔드 공통 응답 봉투 `{ status, message, data }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// 봉투에 담겨 오거나 그대로 오는 응답을 모두 받습니다.
/// 봉투(`data` 필드 필수)를 먼저 시도합니다.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MaybeEnveloped<T> {
    Enveloped(ApiEnvelope<T>),
    Bare(T),
}

impl<T> MaybeEnveloped<T> {
    pub fn into_inner(self) -> T {
        match self {
            MaybeEnveloped::Enveloped(envelope) => envelope.data,
            MaybeEnveloped::Bare(data) => data,
        }
    }
}

/// `POST /create` 요청 본문
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub title: String,
    pub content: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// 백엔드 삭제 결과. 둘 다 "문서 없음"이라는 최종 상태에 도달합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}
