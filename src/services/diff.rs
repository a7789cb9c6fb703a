//! # 패치 차이 계산 엔진 (Patch Diff Engine)
//!
//! 원본 문서와 편집된 문서를 비교하여, 바뀐 최상위 필드마다
//! `replace` 연산 하나씩을 만드는 순수 함수들입니다.
//!
//! - `diff()`: (원본, 편집본) → 패치 연산 목록
//! - `apply()`: 패치 연산 목록을 문서에 적용
//!
//! 중첩된 `structuredContent`는 통째로 교체합니다 (하위 필드 단위 비교 없음).
//! `diff()` 결과가 비어 있으면 저장은 네트워크 호출 없이 끝납니다.

use crate::error::{AppError, AppResult};
use crate::models::{Document, DocumentField, PatchOp, PatchOperation};
use serde_json::Value;

/// 두 문서의 차이를 최소 패치 연산 목록으로 계산합니다.
///
/// 비교는 구조적(깊은) 동등성입니다. `serde_json::Value`의 `==`는
/// 객체 키 순서와 무관하게 내용을 비교합니다.
///
/// # 반환값
/// 변경된 필드만 `DocumentField::TRACKED` 순서대로 담긴 목록.
/// `diff(d, d)`는 항상 빈 목록입니다.
pub fn diff(original: &Document, edited: &Document) -> Vec<PatchOperation> {
    DocumentField::TRACKED
        .iter()
        .filter_map(|&field| {
            let before = field_value(original, field);
            let after = field_value(edited, field);
            // (조건).then(|| 값): 조건이 참일 때만 Some(값)
            (before != after).then(|| PatchOperation::replace(field, after))
        })
        .collect()
}

/// 패치 연산을 문서에 적용한 새 문서를 반환합니다.
///
/// # 에러
/// - 알 수 없는 경로, 또는 필드 타입과 맞지 않는 값이면 `AppError::BadRequest`
pub fn apply(document: &Document, operations: &[PatchOperation]) -> AppResult<Document> {
    let mut patched = document.clone();

    for operation in operations {
        // PatchOp는 지금 Replace 하나뿐이지만, match로 새 연산 추가 시 컴파일러가 알려줍니다.
        match operation.op {
            PatchOp::Replace => {}
        }

        let field = DocumentField::from_path(&operation.path).ok_or_else(|| {
            AppError::BadRequest(format!("unknown patch path '{}'", operation.path))
        })?;

        match field {
            DocumentField::Title => patched.title = expect_string(field, &operation.value)?,
            DocumentField::Content => patched.content = expect_string(field, &operation.value)?,
            DocumentField::Language => {
                patched.language = match &operation.value {
                    Value::Null => None,
                    other => Some(expect_string(field, other)?),
                }
            }
            DocumentField::StructuredContent => {
                patched.structured_content = match &operation.value {
                    Value::Null => None,
                    other => Some(other.clone()),
                }
            }
        }
    }

    Ok(patched)
}

fn field_value(document: &Document, field: DocumentField) -> Value {
    match field {
        DocumentField::Title => Value::String(document.title.clone()),
        DocumentField::Content => Value::String(document.content.clone()),
        DocumentField::Language => document
            .language
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
        DocumentField::StructuredContent => {
            document.structured_content.clone().unwrap_or(Value::Null)
        }
    }
}

fn expect_string(field: DocumentField, value: &Value) -> AppResult<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        AppError::BadRequest(format!("{} expects a string value", field.path()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentStatus, NewDocument};
    use serde_json::json;

    fn resume() -> Document {
        let mut doc = Document::placeholder("temp", &NewDocument::new("CV", "raw text"));
        doc.id = Some("r1".into());
        doc.status = DocumentStatus::StructuredComplete;
        doc.structured_content = Some(json!({
            "personal": { "name": "Ada", "city": "Berlin" },
            "skills": ["rust", "sql"]
        }));
        doc
    }

    #[test]
    fn identical_documents_produce_no_operations() {
        let doc = resume();
        assert!(diff(&doc, &doc).is_empty());
        assert!(diff(&doc, &doc.clone()).is_empty());
    }

    #[test]
    fn key_order_inside_structured_content_is_irrelevant() {
        let original = resume();
        let mut edited = original.clone();
        edited.structured_content = Some(json!({
            "skills": ["rust", "sql"],
            "personal": { "city": "Berlin", "name": "Ada" }
        }));

        assert!(diff(&original, &edited).is_empty());
    }

    #[test]
    fn only_changed_fields_are_replaced_in_tracked_order() {
        let original = resume();
        let mut edited = original.clone();
        edited.structured_content = Some(json!({
            "personal": { "name": "Ada", "city": "Hamburg" },
            "skills": ["rust", "sql"]
        }));
        edited.title = "CV 2024".into();

        let ops = diff(&original, &edited);

        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].path, "/title");
        assert_eq!(ops[0].value, json!("CV 2024"));
        assert_eq!(ops[1].path, "/structuredContent");
        // 중첩 필드는 통째로 교체
        assert_eq!(ops[1].value["skills"], json!(["rust", "sql"]));
        assert!(ops.iter().all(|op| op.op == PatchOp::Replace));
    }

    #[test]
    fn untracked_fields_are_ignored() {
        let original = resume();
        let mut edited = original.clone();
        edited.status = DocumentStatus::Optimized;
        edited.updated_at = Some(chrono::Utc::now());

        assert!(diff(&original, &edited).is_empty());
    }

    #[test]
    fn applying_the_diff_reproduces_the_edit() {
        let original = resume();
        let mut edited = original.clone();
        edited.content = "new raw text".into();
        edited.language = Some("en".into());
        edited.structured_content = None;

        let ops = diff(&original, &edited);
        assert_eq!(ops.len(), 3);
        assert_eq!(apply(&original, &ops).unwrap(), edited);
    }

    #[test]
    fn apply_rejects_unknown_paths_and_bad_values() {
        let doc = resume();
        let unknown = PatchOperation {
            op: PatchOp::Replace,
            path: "/status".into(),
            value: json!("optimized"),
        };
        assert!(matches!(apply(&doc, &[unknown]), Err(AppError::BadRequest(_))));

        let wrong_type = PatchOperation::replace(DocumentField::Title, json!(42));
        assert!(matches!(apply(&doc, &[wrong_type]), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn operations_serialize_as_json_patch() {
        let op = PatchOperation::replace(DocumentField::Content, json!("x"));
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({ "op": "replace", "path": "/content", "value": "x" })
        );
    }
}
