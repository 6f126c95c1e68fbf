//! Saved-search secondary file (spec §6): a small JSONL sidecar next to the
//! main log, `<base>-saved-searches`, with the same tolerant-reader rules
//! (missing optional fields, dedup by name with latest wins, discard an
//! unparseable trailing line).

use crate::writer;
use kgraph_core::types::Timestamp;
use kgraph_core::{now, Error, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(rename = "createdAt", default = "now")]
    pub created_at: Timestamp,
}

impl SavedSearch {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        SavedSearch { name: name.into(), query: query.into(), method: None, created_at: now() }
    }
}

/// Derives the sidecar path from the main log's path: `<base>-saved-searches`
/// alongside it, preserving the log's extension scheme is not required since
/// this is a distinct file, not an alternate extension of the same stem.
pub fn sidecar_path(log_path: &Path) -> PathBuf {
    let mut name = log_path.file_name().and_then(|n| n.to_str()).unwrap_or("store").to_string();
    if let Some(dot) = name.rfind('.') {
        name.truncate(dot);
    }
    name.push_str("-saved-searches");
    log_path.with_file_name(name)
}

/// Replays the sidecar file, deduplicating by name (latest wins). A missing
/// file yields an empty map; a malformed trailing line is discarded as a
/// torn write, matching the main log's replay contract.
pub fn load(path: &Path) -> Result<FxHashMap<String, SavedSearch>> {
    let content = writer::read_to_string_tolerant(path)?;
    let lines: Vec<&str> = content.lines().collect();
    let mut out = FxHashMap::default();
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<SavedSearch>(trimmed) {
            Ok(search) => {
                out.insert(search.name.clone(), search);
            }
            Err(err) => {
                if i + 1 == lines.len() {
                    tracing::warn!(line = i, error = %err, "discarding unparseable trailing saved-search line");
                    break;
                }
                return Err(Error::StorageCorrupted { message: format!("malformed saved-search at line {}: {err}", i + 1) });
            }
        }
    }
    Ok(out)
}

/// Full rewrite of the sidecar file with exactly `searches`' current state.
pub fn save(path: &Path, searches: &FxHashMap<String, SavedSearch>) -> Result<()> {
    let mut lines = Vec::with_capacity(searches.len());
    for search in searches.values() {
        lines.push(serde_json::to_string(search).map_err(|e| Error::storage_write(e.to_string()))?);
    }
    writer::full_write(path, lines.join("\n").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sidecar_path_is_derived_from_log_path() {
        let path = sidecar_path(Path::new("/tmp/graphs/store.jsonl"));
        assert_eq!(path, PathBuf::from("/tmp/graphs/store-saved-searches"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store-saved-searches");
        let mut searches = FxHashMap::default();
        searches.insert("recent-engineers".to_string(), SavedSearch::new("recent-engineers", "type:person AND tag:new"));
        save(&path, &searches).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["recent-engineers"].query, "type:person AND tag:new");
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent-saved-searches");
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn duplicate_name_keeps_latest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store-saved-searches");
        let first = SavedSearch::new("q", "alice");
        let mut second = SavedSearch::new("q", "alice-updated");
        second.created_at = first.created_at;
        let body = format!("{}\n{}", serde_json::to_string(&first).unwrap(), serde_json::to_string(&second).unwrap());
        std::fs::write(&path, body).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded["q"].query, "alice-updated");
    }
}
