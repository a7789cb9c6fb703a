//! # HTTP 문서 백엔드
//!
//! reqwest 클라이언트로 REST 백엔드를 호출합니다.
//!
//! ## 엔드포인트 (`{base}/api/v1/{segment}` 아래)
//! - `GET    /view?user_id=`                 → 문서 목록
//! - `GET    /view/{id}?user_id=`            → 단일 문서
//! - `POST   /create`                        → 새 문서 생성
//! - `PATCH  /patch/{id}?user_id=`           → 부분 업데이트 (`{ operations }`)
//! - `DELETE /delete/{id}?user_id=`          → 삭제 (404는 "이미 없음")
//! - `GET    /extract-structured?document_id=&language=&user_id=` → 구조화 실행
//!
//! 응답은 문서 그대로이거나 `{ status, message, data }` 봉투에 담겨 옵니다.

use super::DocumentBackend;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateDocumentRequest, DeleteOutcome, Document, DocumentKind, MaybeEnveloped, NewDocument,
    PatchOperation, PatchRequest,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// REST 백엔드 클라이언트
///
/// `reqwest::Client`는 내부적으로 Arc를 사용하므로 clone해도 연결 풀이 공유됩니다.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// # 매개변수
    /// - `base_url`: 백엔드 주소 (예: "http://localhost:3002", 끝의 `/`는 무시)
    /// - `timeout`: 요청 하나의 최대 대기 시간
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url(&self, kind: DocumentKind, path: &str) -> String {
        format!("{}/api/v1/{}/{}", self.base_url, kind.segment(), path)
    }

    /// 응답 상태를 확인하고 본문을 파싱합니다.
    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AppError::from_status(status.as_u16(), &body));
        }
        let parsed: MaybeEnveloped<T> = serde_json::from_str(&body)?;
        Ok(parsed.into_inner())
    }
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn list(&self, kind: DocumentKind, owner_id: &str) -> AppResult<Vec<Document>> {
        let response = self
            .client
            .get(self.url(kind, "view"))
            .query(&[("user_id", owner_id)])
            .send()
            .await?;
        Self::read(response).await
    }

    async fn get(&self, kind: DocumentKind, id: &str, owner_id: &str) -> AppResult<Document> {
        let response = self
            .client
            .get(self.url(kind, &format!("view/{id}")))
            .query(&[("user_id", owner_id)])
            .send()
            .await?;
        Self::read(response).await
    }

    async fn create(
        &self,
        kind: DocumentKind,
        draft: &NewDocument,
        owner_id: &str,
    ) -> AppResult<Document> {
        let body = CreateDocumentRequest {
            title: draft.title.clone(),
            content: draft.content.clone(),
            user_id: owner_id.to_string(),
            language: draft.language.clone(),
        };
        let response = self
            .client
            .post(self.url(kind, "create"))
            .json(&body)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn patch(
        &self,
        kind: DocumentKind,
        id: &str,
        owner_id: &str,
        operations: &[PatchOperation],
    ) -> AppResult<Document> {
        let body = PatchRequest {
            operations: operations.to_vec(),
        };
        let response = self
            .client
            .patch(self.url(kind, &format!("patch/{id}")))
            .query(&[("user_id", owner_id)])
            .json(&body)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn delete(
        &self,
        kind: DocumentKind,
        id: &str,
        owner_id: &str,
    ) -> AppResult<DeleteOutcome> {
        let response = self
            .client
            .delete(self.url(kind, &format!("delete/{id}")))
            .query(&[("user_id", owner_id)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(DeleteOutcome::Deleted);
        }
        let body = response.text().await?;
        match AppError::from_status(status.as_u16(), &body) {
            e if e.is_not_found() => Ok(DeleteOutcome::NotFound),
            e => Err(e),
        }
    }

    async fn request_structuring(
        &self,
        kind: DocumentKind,
        id: &str,
        language: &str,
        owner_id: &str,
    ) -> AppResult<()> {
        let response = self
            .client
            .get(self.url(kind, "extract-structured"))
            .query(&[
                ("document_id", id),
                ("language", language),
                ("user_id", owner_id),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(AppError::from_status(status.as_u16(), &body));
        }
        Ok(())
    }
}
