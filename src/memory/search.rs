//! Read-side conveniences over a stream: note/tag search and profile snapshots.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::memory::store::{EventLog, LogError};
use crate::memory::types::{LogEntry, TailItem};

/// Entries returned by an unfiltered search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Entries bundled into a snapshot.
pub const SNAPSHOT_TAIL: usize = 20;

/// Search filters. Both are optional; when both are set an entry must match both.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Case-insensitive substring of the entry's note text.
    pub query: Option<String>,
    /// Exact tag.
    pub tag: Option<String>,
}

impl SearchFilter {
    /// Build a filter, treating blank strings as "not set".
    pub fn new(query: Option<&str>, tag: Option<&str>) -> Self {
        let clean = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            query: clean(query),
            tag: clean(tag),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.tag.is_none()
    }

    fn matches(&self, entry: &LogEntry, query_lower: Option<&str>) -> bool {
        if let Some(q) = query_lower {
            if !entry.note_text().to_lowercase().contains(q) {
                return false;
            }
        }
        if let Some(ref tag) = self.tag {
            if !entry.has_tag(tag) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<LogEntry>,
    /// Parseable entries scanned.
    pub total: usize,
}

/// Scan the whole stream for entries matching `filter`.
///
/// With an empty filter this returns the last [`DEFAULT_SEARCH_LIMIT`] entries.
pub fn search(log: &EventLog, filter: &SearchFilter) -> Result<SearchResponse, LogError> {
    let entries = log.entries()?;
    let total = entries.len();

    let results = if filter.is_empty() {
        let start = total.saturating_sub(DEFAULT_SEARCH_LIMIT);
        entries.into_iter().skip(start).collect()
    } else {
        let query_lower = filter.query.as_deref().map(str::to_lowercase);
        entries
            .into_iter()
            .filter(|e| filter.matches(e, query_lower.as_deref()))
            .collect()
    };

    Ok(SearchResponse { results, total })
}

/// A profile document bundled with the latest stream entries.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub ts_utc: String,
    pub host: Option<String>,
    pub user: Option<String>,
    pub echo_root: String,
    /// Profile JSON as stored, or `null` if missing or malformed.
    pub cipher_profile: Option<Value>,
    pub recent_memories: Vec<TailItem>,
}

/// Assemble a [`Snapshot`] of `log` and the profile at `profile_path`.
pub fn snapshot(log: &EventLog, profile_path: &Path, root: &Path) -> Result<Snapshot, LogError> {
    let recent_memories = log.tail(SNAPSHOT_TAIL)?;
    Ok(Snapshot {
        ts_utc: chrono::Utc::now().to_rfc3339(),
        host: crate::host::hostname(),
        user: crate::host::username(),
        echo_root: root.display().to_string(),
        cipher_profile: load_profile(profile_path),
        recent_memories,
    })
}

/// Read a JSON document verbatim, ignoring a BOM. Any failure yields `None`.
pub fn load_profile(path: &Path) -> Option<Value> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(text.trim_start_matches('\u{feff}')) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed profile");
            None
        }
    }
}
