//! The persisted session state record.
//!
//! A `SessionState` is the unit of history: one immutable snapshot of the
//! user's working set and selection, written once and never edited in
//! place. "Editing" the session always produces a new state with a fresh
//! id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::hash::FileHash;

/// Whether the artifact covers the whole working set or one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    #[default]
    #[serde(rename = "All Files")]
    AllFiles,
    #[serde(rename = "Single File")]
    SingleFile,
}

/// One captured selection state, as persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Unique snapshot id, assigned at capture time.
    pub id: String,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    /// Full working set, in user order. Superset of the hashed files:
    /// non-text files are listed for display but not hashed.
    pub files: Vec<PathBuf>,
    /// Symbol names the user narrowed output to; empty means whole file.
    pub selected_items: Vec<String>,
    pub selection_mode: SelectionMode,
    /// Meaningful only when `selection_mode` is `SingleFile`.
    pub selected_file: Option<PathBuf>,
    /// Content hashes of the tracked (text) files at capture time.
    pub file_hashes: BTreeMap<PathBuf, FileHash>,
}

impl SessionState {
    /// Create a new state with a generated id and the current time.
    pub fn new(
        files: Vec<PathBuf>,
        selected_items: Vec<String>,
        selection_mode: SelectionMode,
        selected_file: Option<PathBuf>,
        file_hashes: BTreeMap<PathBuf, FileHash>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            files,
            selected_items,
            selection_mode,
            selected_file,
            file_hashes,
        }
    }

    /// Whether two captures are the same logical state.
    ///
    /// Compares every field except `id` and `timestamp`. Used to suppress
    /// history bloat from repeated no-op refreshes.
    pub fn same_capture(&self, other: &SessionState) -> bool {
        self.files == other.files
            && self.selected_items == other.selected_items
            && self.selection_mode == other.selection_mode
            && self.selected_file == other.selected_file
            && self.file_hashes == other.file_hashes
    }
}

/// Lightweight reference to a persisted state (what the in-memory history
/// list holds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRef {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&SessionState> for StateRef {
    fn from(state: &SessionState) -> Self {
        Self {
            id: state.id.clone(),
            timestamp: state.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_files(files: Vec<PathBuf>) -> SessionState {
        SessionState::new(files, Vec::new(), SelectionMode::AllFiles, None, BTreeMap::new())
    }

    #[test]
    fn fresh_states_get_distinct_ids() {
        let a = state_with_files(vec![]);
        let b = state_with_files(vec![]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn same_capture_ignores_id_and_timestamp() {
        let a = state_with_files(vec![PathBuf::from("/x")]);
        let b = state_with_files(vec![PathBuf::from("/x")]);
        assert!(a.same_capture(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn same_capture_sees_selection_changes() {
        let a = state_with_files(vec![PathBuf::from("/x")]);
        let mut b = state_with_files(vec![PathBuf::from("/x")]);
        b.selected_items.push("main".to_string());
        assert!(!a.same_capture(&b));
    }

    #[test]
    fn file_order_is_significant() {
        let a = state_with_files(vec![PathBuf::from("/x"), PathBuf::from("/y")]);
        let b = state_with_files(vec![PathBuf::from("/y"), PathBuf::from("/x")]);
        assert!(!a.same_capture(&b));
    }

    #[test]
    fn selection_mode_wire_names() {
        let json = serde_json::to_string(&SelectionMode::AllFiles).unwrap();
        assert_eq!(json, "\"All Files\"");
        let json = serde_json::to_string(&SelectionMode::SingleFile).unwrap();
        assert_eq!(json, "\"Single File\"");
    }
}
