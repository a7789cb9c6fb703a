use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// 문서 컬렉션 종류. 세 컬렉션은 구조가 같고 백엔드 경로만 다릅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    Resume,
    CoverLetter,
    JobDescription,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Resume,
        DocumentKind::CoverLetter,
        DocumentKind::JobDescription,
    ];

    /// 백엔드 URL 경로 조각 (`/api/v1/{segment}/...`)
    pub fn segment(self) -> &'static str {
        match self {
            DocumentKind::Resume => "resumes",
            DocumentKind::CoverLetter => "coverletters",
            DocumentKind::JobDescription => "jobdescriptions",
        }
    }

    /// 구조화 요청에 넘기는 문서 타입 문자열
    pub fn structuring_type(self) -> &'static str {
        match self {
            DocumentKind::Resume => "resume",
            DocumentKind::CoverLetter => "coverletter",
            DocumentKind::JobDescription => "jobdescription",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.structuring_type())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "resume" | "resumes" | "cv" => Ok(DocumentKind::Resume),
            "coverletter" | "coverletters" => Ok(DocumentKind::CoverLetter),
            "jobdescription" | "jobdescriptions" | "job" | "jobs" => {
                Ok(DocumentKind::JobDescription)
            }
            other => Err(format!("unknown document kind '{other}'")),
        }
    }
}

/// 문서 상태. 구조화를 (다시) 요청할지, 편집을 허용할지를 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// 서버 확인 전의 임시 문서
    Processing,
    #[default]
    Unstructured,
    StructuringFailed,
    #[serde(alias = "structured")]
    StructuredComplete,
    Optimized,
}

impl DocumentStatus {
    pub fn needs_structuring(self) -> bool {
        self == DocumentStatus::Unstructured
    }

    pub fn is_editable(self) -> bool {
        self != DocumentStatus::Processing
    }
}

/// 저장소가 관리하는 문서 단위
///
/// `id`는 서버가 부여한 뒤에만 존재하고, 그 전에는 `temporary_id`가 조회 키입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "DocumentWire")]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// 서버 확인 전 목록 맨 위에 보여줄 임시 문서를 만듭니다.
    pub fn placeholder(temporary_id: impl Into<String>, draft: &NewDocument) -> Self {
        Self {
            id: None,
            temporary_id: Some(temporary_id.into()),
            title: draft.title.clone(),
            content: draft.content.clone(),
            language: draft.language.clone(),
            structured_content: None,
            status: DocumentStatus::Processing,
            owner_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }

    /// 사람이 읽을 수 있는 식별자 (로그용)
    pub fn key(&self) -> &str {
        self.id
            .as_deref()
            .or(self.temporary_id.as_deref())
            .unwrap_or("<unidentified>")
    }
}

/// 사용자가 입력한 새 문서 내용
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl NewDocument {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// 백엔드가 내보내는 두 가지 모양(`id`/`_id`, `content`/`rawText`)을 모두 받기 위한 중간 표현
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    temporary_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    raw_text: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    structured_content: Option<Value>,
    #[serde(default)]
    status: Option<DocumentStatus>,
    #[serde(default, alias = "userId")]
    owner_id: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<DocumentWire> for Document {
    fn from(wire: DocumentWire) -> Self {
        Self {
            id: wire.id.or(wire.mongo_id),
            temporary_id: wire.temporary_id,
            title: wire.title.unwrap_or_default(),
            content: wire.content.or(wire.raw_text).unwrap_or_default(),
            language: wire.language,
            // JSON null은 "구조화 결과 없음"과 같습니다
            structured_content: wire.structured_content.filter(|v| !v.is_null()),
            status: wire.status.unwrap_or_default(),
            owner_id: wire.owner_id,
            created_at: wire.created_at.as_deref().and_then(parse_timestamp),
            updated_at: wire.updated_at.as_deref().and_then(parse_timestamp),
        }
    }
}

/// RFC 3339 또는 시간대 없는 ISO 8601(UTC로 간주) 타임스탬프를 파싱합니다.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_mongo_shaped_documents() {
        let doc: Document = serde_json::from_value(json!({
            "_id": "r1",
            "title": "CV",
            "rawText": "hello",
            "status": "structured",
            "userId": "u1",
            "createdAt": "2024-03-01T10:00:00.123456",
            "structuredContent": null
        }))
        .unwrap();

        assert_eq!(doc.id.as_deref(), Some("r1"));
        assert_eq!(doc.content, "hello");
        assert_eq!(doc.status, DocumentStatus::StructuredComplete);
        assert_eq!(doc.owner_id.as_deref(), Some("u1"));
        assert!(doc.structured_content.is_none());
        assert!(doc.created_at.is_some());
        assert!(doc.updated_at.is_none());
    }

    #[test]
    fn serializes_camel_case_without_empty_optionals() {
        let doc = Document::placeholder("temp-1", &NewDocument::new("Draft A", ""));
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["temporaryId"], "temp-1");
        assert_eq!(value["status"], "processing");
        assert!(value.get("id").is_none());
        assert!(value.get("structuredContent").is_none());
    }

    #[test]
    fn kind_parsing_is_lenient() {
        assert_eq!("cover-letter".parse::<DocumentKind>(), Ok(DocumentKind::CoverLetter));
        assert_eq!("Resume".parse::<DocumentKind>(), Ok(DocumentKind::Resume));
        assert_eq!("jobs".parse::<DocumentKind>(), Ok(DocumentKind::JobDescription));
        assert!("invoice".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn status_predicates() {
        assert!(DocumentStatus::Unstructured.needs_structuring());
        assert!(!DocumentStatus::StructuringFailed.needs_structuring());
        assert!(!DocumentStatus::Processing.is_editable());
        assert!(DocumentStatus::Optimized.is_editable());
    }
}
