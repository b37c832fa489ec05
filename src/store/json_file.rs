use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CacheEntry, HistoryEntry, Persistence};

/// File-backed persistence: one JSON document holding the history array and
/// one holding the cache as `[question, entry]` pairs. Each document is
/// rewritten in full on every mutation; there is no locking, so concurrent
/// invocations race (single-user, one-invocation-at-a-time tool).
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    history_path: PathBuf,
    cache_path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(history_path: impl Into<PathBuf>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            history_path: history_path.into(),
            cache_path: cache_path.into(),
        }
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(parsed))
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value).context("failed to serialize state")?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

impl Persistence for JsonFileBackend {
    fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(load_json(&self.history_path)?.unwrap_or_default())
    }

    fn load_cache(&self) -> Result<Vec<(String, CacheEntry)>> {
        Ok(load_json(&self.cache_path)?.unwrap_or_default())
    }

    fn save_history(&self, history: &[HistoryEntry]) -> Result<()> {
        save_json(&self.history_path, &history)
    }

    fn save_cache(&self, cache: &[(String, CacheEntry)]) -> Result<()> {
        save_json(&self.cache_path, &cache)
    }
}
