pub mod json_file;

pub use json_file::JsonFileBackend;

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub response: String,
    pub timestamp: String,
}

/// Storage backend for the two persisted documents. Load failures surface
/// as errors so the store can decide the empty-state policy; save failures
/// are absorbed by the store and only logged.
pub trait Persistence {
    fn load_history(&self) -> anyhow::Result<Vec<HistoryEntry>>;
    fn load_cache(&self) -> anyhow::Result<Vec<(String, CacheEntry)>>;
    fn save_history(&self, history: &[HistoryEntry]) -> anyhow::Result<()>;
    fn save_cache(&self, cache: &[(String, CacheEntry)]) -> anyhow::Result<()>;
}

/// Owns the question/answer log and the response cache. The cache is keyed
/// by the exact literal question: case- and whitespace-sensitive, no
/// normalization, never expires. History is append-only except `clear`.
pub struct HistoryStore<P> {
    backend: P,
    history: Vec<HistoryEntry>,
    cache: Vec<(String, CacheEntry)>,
    index: HashMap<String, usize>,
}

impl<P: Persistence> HistoryStore<P> {
    /// Reads both documents fully into memory. A missing or unreadable
    /// document loads as empty.
    pub fn load(backend: P) -> Self {
        let history = backend.load_history().unwrap_or_else(|err| {
            warn!(error = %err, "failed to load history, starting empty");
            Vec::new()
        });
        let cache_pairs = backend.load_cache().unwrap_or_else(|err| {
            warn!(error = %err, "failed to load response cache, starting empty");
            Vec::new()
        });

        let mut store = Self {
            backend,
            history,
            cache: Vec::new(),
            index: HashMap::new(),
        };
        for (question, entry) in cache_pairs {
            store.insert_cached(question, entry);
        }
        store
    }

    pub fn cached(&self, question: &str) -> Option<&CacheEntry> {
        self.index.get(question).map(|&i| &self.cache[i].1)
    }

    /// Overwrites any previous entry for the same literal question; last
    /// write wins. The save failure policy is log-and-continue.
    pub fn cache_response(&mut self, question: &str, response: &str) {
        self.insert_cached(
            question.to_string(),
            CacheEntry {
                response: response.to_string(),
                timestamp: Utc::now().to_rfc3339(),
            },
        );
        if let Err(err) = self.backend.save_cache(&self.cache) {
            warn!(error = %err, "failed to save response cache");
        }
    }

    pub fn record(&mut self, question: &str, answer: &str) {
        self.history.push(HistoryEntry {
            timestamp: Utc::now().to_rfc3339(),
            question: question.to_string(),
            answer: answer.to_string(),
        });
        if let Err(err) = self.backend.save_history(&self.history) {
            warn!(error = %err, "failed to save history");
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn recent(&self, limit: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }

    /// Case-insensitive substring match over questions and answers.
    pub fn search(&self, query: &str) -> Vec<&HistoryEntry> {
        let needle = query.to_lowercase();
        self.history
            .iter()
            .filter(|entry| {
                entry.question.to_lowercase().contains(&needle)
                    || entry.answer.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.history.clear();
        if let Err(err) = self.backend.save_history(&self.history) {
            warn!(error = %err, "failed to save history");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn insert_cached(&mut self, question: String, entry: CacheEntry) {
        if let Some(&i) = self.index.get(&question) {
            self.cache[i].1 = entry;
        } else {
            self.index.insert(question.clone(), self.cache.len());
            self.cache.push((question, entry));
        }
    }
}

/// Discards writes and always loads empty; store state lives only in
/// memory. Used by tests.
#[derive(Debug, Default)]
pub struct MemoryBackend;

impl Persistence for MemoryBackend {
    fn load_history(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        Ok(Vec::new())
    }

    fn load_cache(&self) -> anyhow::Result<Vec<(String, CacheEntry)>> {
        Ok(Vec::new())
    }

    fn save_history(&self, _history: &[HistoryEntry]) -> anyhow::Result<()> {
        Ok(())
    }

    fn save_cache(&self, _cache: &[(String, CacheEntry)]) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryStore, MemoryBackend};

    #[test]
    fn cache_lookup_is_literal_and_case_sensitive() {
        let mut store = HistoryStore::load(MemoryBackend);
        store.cache_response("What is AI?", "An answer");

        assert!(store.cached("What is AI?").is_some());
        assert!(store.cached("what is ai?").is_none());
        assert!(store.cached("What is AI? ").is_none());
    }

    #[test]
    fn caching_twice_with_same_arguments_is_idempotent() {
        let mut store = HistoryStore::load(MemoryBackend);
        store.cache_response("q", "answer");
        store.cache_response("q", "answer");

        assert_eq!(store.cache_len(), 1);
        assert_eq!(store.cached("q").map(|e| e.response.as_str()), Some("answer"));
    }

    #[test]
    fn caching_overwrites_with_the_last_value() {
        let mut store = HistoryStore::load(MemoryBackend);
        store.cache_response("q", "first");
        store.cache_response("q", "second");

        assert_eq!(store.cache_len(), 1);
        assert_eq!(store.cached("q").map(|e| e.response.as_str()), Some("second"));
    }

    #[test]
    fn record_appends_in_insertion_order() {
        let mut store = HistoryStore::load(MemoryBackend);
        store.record("q1", "a1");
        store.record("q2", "a2");

        let questions: Vec<_> = store.entries().iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, ["q1", "q2"]);
    }

    #[test]
    fn recent_returns_the_tail_of_the_log() {
        let mut store = HistoryStore::load(MemoryBackend);
        for i in 0..7 {
            store.record(&format!("q{i}"), "a");
        }

        let recent: Vec<_> = store.recent(3).iter().map(|e| e.question.as_str()).collect();
        assert_eq!(recent, ["q4", "q5", "q6"]);
    }

    #[test]
    fn recent_with_a_large_limit_returns_everything() {
        let mut store = HistoryStore::load(MemoryBackend);
        store.record("q", "a");
        assert_eq!(store.recent(50).len(), 1);
    }

    #[test]
    fn search_matches_questions_and_answers_case_insensitively() {
        let mut store = HistoryStore::load(MemoryBackend);
        store.record("What is Rust?", "A systems language");
        store.record("Best pizza?", "Margherita, arguably");

        assert_eq!(store.search("RUST").len(), 1);
        assert_eq!(store.search("margherita").len(), 1);
        assert_eq!(store.search("cobol").len(), 0);
    }

    #[test]
    fn clear_empties_history_but_keeps_the_cache() {
        let mut store = HistoryStore::load(MemoryBackend);
        store.record("q", "a");
        store.cache_response("q", "a");
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.cache_len(), 1);
    }
}
