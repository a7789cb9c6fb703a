//! # 중복 업로드 감지
//!
//! 업로드 전에 같은 내용의 문서가 이미 있는지 확인합니다.
//! 비교는 정규화된 문자열의 완전 일치뿐이며, 유사도 점수는 쓰지 않습니다.

use crate::models::Document;

/// 비교용으로 텍스트를 정규화합니다.
///
/// 소문자로 바꾸고, 연속된 공백(스페이스, 탭, 줄바꿈)을 스페이스 하나로 줄이고,
/// 앞뒤 공백을 제거합니다.
pub fn normalize(text: &str) -> String {
    // split_whitespace()는 앞뒤 공백을 버리고 연속 공백을 하나의 구분자로 봅니다.
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 정규화된 내용이 `content`와 같은 첫 번째 문서를 찾습니다.
pub fn find_duplicate<'a, I>(existing: I, content: &str) -> Option<&'a Document>
where
    I: IntoIterator<Item = &'a Document>,
{
    let candidate = normalize(content);
    existing
        .into_iter()
        .find(|doc| normalize(&doc.content) == candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDocument;

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize("  Senior\tRust   Engineer\n\nBerlin "), "senior rust engineer berlin");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn duplicates_require_exact_normalized_equality() {
        let docs = vec![
            Document::placeholder("a", &NewDocument::new("A", "Backend Developer (m/w/d)\nMunich")),
            Document::placeholder("b", &NewDocument::new("B", "Data Engineer")),
        ];

        let hit = find_duplicate(&docs, "backend developer (M/W/D) munich");
        assert_eq!(hit.map(|d| d.title.as_str()), Some("A"));

        // 거의 같아도 정확히 같지 않으면 중복이 아닙니다
        assert!(find_duplicate(&docs, "Data Engineers").is_none());
    }
}
