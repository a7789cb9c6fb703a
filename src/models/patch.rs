use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 패치 연산 종류. 최상위 필드 교체만 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Replace,
}

/// `{op, path, value}` 형태의 필드 단위 변경 지시
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: Value,
}

impl PatchOperation {
    pub fn replace(field: DocumentField, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: field.path().to_string(),
            value,
        }
    }
}

/// 비교 대상이 되는 최상위 필드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentField {
    Title,
    Content,
    Language,
    StructuredContent,
}

impl DocumentField {
    /// 비교 순서 = 생성되는 연산의 순서
    pub const TRACKED: [DocumentField; 4] = [
        DocumentField::Title,
        DocumentField::Content,
        DocumentField::Language,
        DocumentField::StructuredContent,
    ];

    pub fn path(self) -> &'static str {
        match self {
            DocumentField::Title => "/title",
            DocumentField::Content => "/content",
            DocumentField::Language => "/language",
            DocumentField::StructuredContent => "/structuredContent",
        }
    }

    /// 경로 문자열을 필드로 변환합니다. `/rawText`는 `/content`의 별칭입니다.
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/title" => Some(DocumentField::Title),
            "/content" | "/rawText" => Some(DocumentField::Content),
            "/language" => Some(DocumentField::Language),
            "/structuredContent" => Some(DocumentField::StructuredContent),
            _ => None,
        }
    }
}

/// PATCH 요청 본문
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRequest {
    pub operations: Vec<PatchOperation>,
}
