//! Session history: newest-first, capacity-bounded snapshots of the editor
//! persisted under a single key of the local store.

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{LocalStore, HISTORY_KEY};

pub const DEFAULT_CAPACITY: usize = 50;
const PREVIEW_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Success,
    Error,
    Pasted,
    Corrected,
    Copied,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Success => "success",
            EntryStatus::Error => "error",
            EntryStatus::Pasted => "pasted",
            EntryStatus::Corrected => "corrected",
            EntryStatus::Copied => "copied",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntrySource {
    Run,
    Paste,
    AutoCorrect,
    CopyCorrected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub source: EntrySource,
}

impl HistoryEntry {
    pub fn new(code: impl Into<String>, status: EntryStatus, source: EntrySource) -> Self {
        Self {
            code: code.into(),
            timestamp: Some(Utc::now()),
            status,
            language: None,
            source,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// First 30 characters of the code, with `...` when truncated.
    pub fn preview(&self) -> String {
        let mut chars = self.code.chars();
        let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }

    /// Local wall-clock time, or an empty string for entries without one.
    pub fn time_display(&self) -> String {
        self.timestamp
            .map(|ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    IndexOutOfRange { index: usize, len: usize },
    NothingSelected,
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::IndexOutOfRange { index, len } => {
                write!(f, "invalid history index {index} (history has {len} entries)")
            }
            HistoryError::NothingSelected => f.write_str("no history item selected"),
        }
    }
}

impl std::error::Error for HistoryError {}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    capacity: usize,
    store: Option<LocalStore>,
    pending: Option<usize>,
    visible: bool,
}

impl HistoryStore {
    /// In-memory history, nothing is persisted.
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
            store: None,
            pending: None,
            visible: false,
        }
    }

    /// Load the persisted history. A missing or unreadable key starts empty.
    pub fn load(store: LocalStore, capacity: usize) -> Self {
        let mut entries: Vec<HistoryEntry> = match store.get(HISTORY_KEY) {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable history");
                Vec::new()
            }
        };
        let capacity = capacity.max(1);
        entries.truncate(capacity);
        Self { entries, capacity, store: Some(store), pending: None, visible: false }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Prepend `entry`, dropping the oldest beyond capacity, and persist.
    pub fn record(&mut self, entry: HistoryEntry) {
        tracing::debug!(status = entry.status.as_str(), source = ?entry.source, "history record");
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
        // Indices shifted; any staged selection no longer points at what the user picked.
        self.pending = None;
        self.persist();
    }

    /// Empty the history, remove the persisted key and hide the panel.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending = None;
        self.visible = false;
        if let Some(store) = &self.store {
            store.remove(HISTORY_KEY);
        }
    }

    /// Stage `index` for loading; the caller must `confirm` or `cancel`.
    pub fn select(&mut self, index: usize) -> Result<(), HistoryError> {
        if index >= self.entries.len() {
            let err = HistoryError::IndexOutOfRange { index, len: self.entries.len() };
            tracing::error!("{err}");
            return Err(err);
        }
        self.pending = Some(index);
        Ok(())
    }

    pub fn pending(&self) -> Option<usize> {
        self.pending
    }

    /// Take the staged entry. The panel closes once a snapshot is loaded.
    pub fn confirm(&mut self) -> Result<HistoryEntry, HistoryError> {
        let index = self.pending.take().ok_or(HistoryError::NothingSelected)?;
        let entry = self
            .entries
            .get(index)
            .cloned()
            .ok_or(HistoryError::IndexOutOfRange { index, len: self.entries.len() })?;
        self.visible = false;
        Ok(entry)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Toggle the panel. An empty history never shows.
    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible && !self.entries.is_empty();
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.set(HISTORY_KEY, &self.entries) {
                tracing::error!(error = %e, "failed to persist history");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: &str) -> HistoryEntry {
        HistoryEntry::new(code, EntryStatus::Success, EntrySource::Run)
    }

    #[test]
    fn bounded_newest_first() {
        let mut h = HistoryStore::in_memory(DEFAULT_CAPACITY);
        for i in 0..51 {
            h.record(entry(&format!("code {i}")));
        }
        assert_eq!(h.len(), 50);
        assert_eq!(h.get(0).unwrap().code, "code 50");
        assert!(h.entries().iter().all(|e| e.code != "code 0"));
    }

    #[test]
    fn preview_truncates_by_chars() {
        let short = entry("print(1)");
        assert_eq!(short.preview(), "print(1)");
        let exact = entry(&"x".repeat(30));
        assert_eq!(exact.preview(), "x".repeat(30));
        let long = entry(&"é".repeat(31));
        assert_eq!(long.preview(), format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn select_out_of_range_is_rejected() {
        let mut h = HistoryStore::in_memory(5);
        h.record(entry("a"));
        assert_eq!(h.select(3), Err(HistoryError::IndexOutOfRange { index: 3, len: 1 }));
        assert_eq!(h.pending(), None);
    }

    #[test]
    fn select_confirm_cancel() {
        let mut h = HistoryStore::in_memory(5);
        for c in ["a", "b", "c"] {
            h.record(entry(c));
        }
        h.select(2).unwrap();
        h.cancel();
        assert_eq!(h.confirm(), Err(HistoryError::NothingSelected));
        h.select(2).unwrap();
        assert_eq!(h.confirm().unwrap().code, "a");
    }

    #[test]
    fn record_drops_pending_selection() {
        let mut h = HistoryStore::in_memory(5);
        h.record(entry("a"));
        h.select(0).unwrap();
        h.record(entry("b"));
        assert_eq!(h.pending(), None);
    }

    #[test]
    fn serde_shape() {
        let e = HistoryEntry::new("x", EntryStatus::Copied, EntrySource::CopyCorrected).with_language("python");
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["status"], "copied");
        assert_eq!(v["source"], "copy-corrected");
        assert_eq!(v["language"], "python");
        assert!(v["timestamp"].as_str().unwrap().contains('T'));

        let legacy: HistoryEntry =
            serde_json::from_str(r#"{"code":"y","status":"corrected","source":"auto-correct"}"#).unwrap();
        assert_eq!(legacy.timestamp, None);
        assert_eq!(legacy.time_display(), "");
        assert_eq!(legacy.source, EntrySource::AutoCorrect);
    }

    #[test]
    fn persists_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        let mut h = HistoryStore::load(store.clone(), 50);
        h.record(entry("one"));
        h.record(entry("two"));

        let reloaded = HistoryStore::load(store.clone(), 50);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(0).unwrap().code, "two");

        h.toggle_visible();
        assert!(h.is_visible());
        h.clear();
        assert!(h.is_empty());
        assert!(!h.is_visible());
        assert!(!store.exists(HISTORY_KEY));
    }

    #[test]
    fn empty_history_panel_stays_hidden() {
        let mut h = HistoryStore::in_memory(5);
        h.toggle_visible();
        assert!(!h.is_visible());
    }
}
