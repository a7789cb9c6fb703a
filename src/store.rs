//! # 문서 저장소 (Document Store)
//!
//! 한 컬렉션의 문서 목록을 메모리에 보관하는 정식(canonical) 클라이언트 상태입니다.
//! 모든 코디네이터는 `upsert` / `remove_by_id` / `replace`라는 좁은 계약으로만
//! 저장소를 바꾸며, 문서 필드를 밖에서 직접 고치지 않습니다.
//!
//! 불변식:
//! - 같은 `id`의 문서는 저장소에 언제나 하나뿐입니다.
//! - 임시 문서와 그 확정 문서는 동시에 존재하지 않습니다 (`replace`는 원자적).
//! - 삭제 대기 중인 문서는 저장소에 남아 있지만 `list()`에서는 보이지 않습니다.
//! - 삭제가 확정된 id는 그 뒤에 시작된 목록 조회가 아니면 다시 들어오지 않습니다.
//!
//! 정렬: `createdAt` 내림차순. 서버 타임스탬프가 없는 임시 문서는 "지금"으로
//! 취급되어 맨 위에 옵니다.

use crate::models::Document;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct Entry {
    doc: Document,
    // 삽입 순서. 타임스탬프가 같거나 없을 때 최신 삽입이 위로 갑니다.
    seq: u64,
}

/// 한 컬렉션의 문서 저장소
#[derive(Debug, Default)]
pub struct DocumentStore {
    entries: Vec<Entry>,
    pending_delete: HashSet<String>,
    next_seq: u64,
    // 삭제 확정 기록: id → 제거 시점의 표식 번호
    removed: HashMap<String, u64>,
    removals: u64,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 화면에 보일 문서 목록 (삭제 대기 문서 제외, 정렬됨)
    pub fn list(&self) -> Vec<Document> {
        self.sorted(|entry| !self.is_hidden(&entry.doc))
    }

    /// 삭제 대기 문서까지 포함한 전체 목록
    pub fn list_all(&self) -> Vec<Document> {
        self.sorted(|_| true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.position_by_id(id).map(|idx| &self.entries[idx].doc)
    }

    pub fn get_by_temporary_id(&self, temporary_id: &str) -> Option<&Document> {
        self.position_by_temporary_id(temporary_id)
            .map(|idx| &self.entries[idx].doc)
    }

    /// 문서를 삽입하거나 덮어씁니다.
    ///
    /// `id`로 먼저 찾고, 없으면 `temporaryId`로 찾습니다.
    /// 그래서 서버가 확정한 문서가 자신의 임시 문서를 올바르게 덮어씁니다.
    /// 두 키가 서로 다른 항목을 가리키면 `id` 쪽을 남기고 임시 항목은 제거합니다.
    pub fn upsert(&mut self, doc: Document) {
        let by_id = doc.id.as_deref().and_then(|id| self.position_by_id(id));
        let by_temp = doc
            .temporary_id
            .as_deref()
            .and_then(|temp| self.position_by_temporary_id(temp));

        match (by_id, by_temp) {
            // 새로고침이 확정 문서를 먼저 넣어 둔 경우: 임시 항목을 정리
            (Some(idx), Some(temp_idx)) if idx != temp_idx => {
                self.entries[idx].doc = doc;
                self.entries.remove(temp_idx);
            }
            (Some(idx), _) | (None, Some(idx)) => {
                self.entries[idx].doc = doc;
            }
            (None, None) => {
                let seq = self.bump_seq();
                self.entries.push(Entry { doc, seq });
            }
        }
    }

    /// 확정된 `id`로 문서를 제거합니다. 삭제 대기 표시도 함께 지웁니다.
    ///
    /// 제거 시점을 기록해 두므로, 이보다 먼저 시작된 목록 조회의 결과가
    /// `reconcile`에서 이 문서를 되살리지 못합니다.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Document> {
        self.pending_delete.remove(id);
        // 저장소에 없던 id라도 서버 쪽 삭제는 일어났으므로 기록은 남깁니다.
        self.removals += 1;
        self.removed.insert(id.to_string(), self.removals);
        let idx = self.position_by_id(id)?;
        Some(self.entries.remove(idx).doc)
    }

    /// 임시 문서를 `temporaryId`로 제거합니다 (생성 실패 시 철회).
    pub fn remove_by_temporary_id(&mut self, temporary_id: &str) -> Option<Document> {
        let idx = self.position_by_temporary_id(temporary_id)?;
        Some(self.entries.remove(idx).doc)
    }

    /// 임시 문서를 서버 확정 문서로 교체합니다.
    ///
    /// `&mut self` 안에서 한 번에 일어나므로, 둘 다 존재하는 순간은 관찰되지 않습니다.
    /// 확정 문서의 `id`가 이미 목록 새로고침으로 들어와 있었다면 그 항목을 갱신합니다.
    pub fn replace(&mut self, temporary_id: &str, mut confirmed: Document) {
        let seq = self
            .position_by_temporary_id(temporary_id)
            .map(|idx| self.entries.remove(idx).seq);

        // 확정된 뒤에는 임시 키로 다시 찾을 일이 없습니다.
        confirmed.temporary_id = None;

        match confirmed.id.as_deref().and_then(|id| self.position_by_id(id)) {
            Some(idx) => self.entries[idx].doc = confirmed,
            None => {
                let seq = seq.unwrap_or_else(|| self.bump_seq());
                self.entries.push(Entry { doc: confirmed, seq });
            }
        }
    }

    /// 지금까지의 삭제 확정 횟수. 목록 조회를 시작하기 직전에 읽어 `reconcile`에 넘깁니다.
    pub fn removal_mark(&self) -> u64 {
        self.removals
    }

    /// 서버 목록으로 확정 문서들을 맞춥니다.
    ///
    /// 진행 중인 생성의 임시 문서와 삭제 대기 표시는 유지됩니다.
    /// `since`는 목록 조회를 시작할 때의 `removal_mark()`입니다. 조회가 진행되는
    /// 동안 삭제가 확정된 id는 서버 목록에 들어 있어도 건너뜁니다.
    pub fn reconcile(&mut self, server_docs: Vec<Document>, since: u64) {
        // 임시 문서만 남기고 확정 문서는 서버 목록으로 다시 채웁니다.
        let mut kept: Vec<Entry> = self
            .entries
            .drain(..)
            .filter(|entry| entry.doc.is_placeholder())
            .collect();
        self.entries.append(&mut kept);

        for doc in server_docs {
            let Some(id) = doc.id.as_deref() else {
                continue;
            };
            if self.removed_after(id, since) {
                tracing::debug!(id, "Skipping document deleted while the list was in flight");
                continue;
            }
            self.upsert(doc);
        }
    }

    /// 삭제 대기 표시를 켜거나 끕니다. 저장소에 없는 id면 `false`를 반환합니다.
    pub fn set_pending_delete(&mut self, id: &str, pending: bool) -> bool {
        if pending {
            if self.position_by_id(id).is_none() {
                return false;
            }
            self.pending_delete.insert(id.to_string());
            true
        } else {
            self.pending_delete.remove(id)
        }
    }

    pub fn is_pending_delete(&self, id: &str) -> bool {
        self.pending_delete.contains(id)
    }

    fn removed_after(&self, id: &str, since: u64) -> bool {
        self.removed.get(id).is_some_and(|&mark| mark > since)
    }

    fn is_hidden(&self, doc: &Document) -> bool {
        doc.id
            .as_deref()
            .map(|id| self.pending_delete.contains(id))
            .unwrap_or(false)
    }

    fn position_by_id(&self, id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.doc.id.as_deref() == Some(id))
    }

    fn position_by_temporary_id(&self, temporary_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.doc.temporary_id.as_deref() == Some(temporary_id))
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn sorted(&self, keep: impl Fn(&Entry) -> bool) -> Vec<Document> {
        let mut visible: Vec<&Entry> = self.entries.iter().filter(|e| keep(e)).collect();
        visible.sort_by(|a, b| newest_first(a, b));
        visible.into_iter().map(|entry| entry.doc.clone()).collect()
    }
}

fn newest_first(a: &Entry, b: &Entry) -> Ordering {
    match (a.doc.created_at, b.doc.created_at) {
        (None, None) => b.seq.cmp(&a.seq),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| b.seq.cmp(&a.seq)),
    }
}

/// 코디네이터들이 함께 쓰는 저장소 핸들
///
/// 잠금은 `with` 클로저 안에서만 잡히므로 `.await`를 넘어 유지되지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<DocumentStore>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut DocumentStore) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn list(&self) -> Vec<Document> {
        self.lock().list()
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        self.lock().get(id).cloned()
    }

    // 저장소는 부분 쓰기를 남기지 않으므로 poison 상태여도 내용을 그대로 씁니다.
    fn lock(&self) -> MutexGuard<'_, DocumentStore> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
