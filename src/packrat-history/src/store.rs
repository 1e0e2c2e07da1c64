//! On-disk snapshot persistence.
//!
//! One pretty-printed JSON object per snapshot, named `state_<id>.json`
//! under the active history directory. Purge only ever touches files
//! matching that naming convention, so a user-supplied directory with
//! unrelated content is safe.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::state::SessionState;
use crate::{HistoryError, Result};

const STATE_FILE_PREFIX: &str = "state_";
const STATE_FILE_SUFFIX: &str = ".json";

/// Persistent store for session snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir
            .join(format!("{STATE_FILE_PREFIX}{id}{STATE_FILE_SUFFIX}"))
    }

    fn is_record_name(name: &str) -> bool {
        name.starts_with(STATE_FILE_PREFIX) && name.ends_with(STATE_FILE_SUFFIX)
    }

    /// Serialize a state to a new record. A write failure here is a
    /// user-visible condition, not a recoverable one.
    pub async fn save(&self, state: &SessionState) -> Result<()> {
        let path = self.record_path(&state.id);
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&path, json)
            .await
            .map_err(|source| HistoryError::StorageUnavailable {
                path: self.dir.clone(),
                source,
            })?;
        debug!(id = %state.id, path = %path.display(), "Saved history state");
        Ok(())
    }

    /// Load a state by id. A missing file and a corrupt file are distinct
    /// failure kinds so the caller can report them differently.
    pub async fn load(&self, id: &str) -> Result<SessionState> {
        let path = self.record_path(id);
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(HistoryError::SnapshotNotFound(id.to_string()));
            }
            Err(e) => return Err(HistoryError::Io(e)),
        };

        serde_json::from_str(&json).map_err(|source| HistoryError::SnapshotCorrupt {
            id: id.to_string(),
            source,
        })
    }

    /// Delete a record. Best-effort: a capture the user already performed
    /// cannot be rolled back, so failure is logged and not escalated.
    pub async fn delete(&self, id: &str) {
        let path = self.record_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => debug!(id, "Deleted history state"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete history state"),
        }
    }

    /// Delete every record in `dir` recognized by the store's naming
    /// convention, leaving unrelated files untouched. Returns the number
    /// of records removed.
    pub async fn purge(dir: &Path) -> usize {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "History directory not readable, skipping purge");
                return 0;
            }
        };

        let mut removed = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Failed to scan history directory");
                    break;
                }
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !Self::is_record_name(name) {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Failed to remove history file")
                }
            }
        }

        debug!(dir = %dir.display(), removed, "Purged history records");
        removed
    }

    /// Remove `dir` if it is empty. Only called on the store's own managed
    /// subdirectory, never on a directory the user pointed us at.
    pub async fn remove_dir_if_empty(dir: &Path) {
        let is_empty = match fs::read_dir(dir).await {
            Ok(mut entries) => matches!(entries.next_entry().await, Ok(None)),
            Err(_) => false,
        };
        if is_empty {
            if let Err(e) = fs::remove_dir(dir).await {
                debug!(dir = %dir.display(), error = %e, "Could not remove empty history directory");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::FileHash;
    use crate::state::SelectionMode;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn sample_state() -> SessionState {
        let mut hashes = BTreeMap::new();
        hashes.insert(PathBuf::from("/tmp/a.py"), FileHash::Digest("ab12".into()));
        hashes.insert(PathBuf::from("/tmp/b.py"), FileHash::Missing);
        SessionState::new(
            vec![PathBuf::from("/tmp/a.py"), PathBuf::from("/tmp/b.py")],
            vec!["ClassA".to_string()],
            SelectionMode::SingleFile,
            Some(PathBuf::from("/tmp/a.py")),
            hashes,
        )
    }

    #[tokio::test]
    async fn save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let state = sample_state();
        store.save(&state).await.unwrap();

        let loaded = store.load(&state.id).await.unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn load_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let err = store.load("no-such-id").await.unwrap_err();
        assert!(matches!(err, HistoryError::SnapshotNotFound(_)));
    }

    #[tokio::test]
    async fn load_garbage_is_corrupt() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        tokio::fs::write(dir.path().join("state_bad.json"), "{not json")
            .await
            .unwrap();

        let err = store.load("bad").await.unwrap_err();
        assert!(matches!(err, HistoryError::SnapshotCorrupt { .. }));
    }

    #[tokio::test]
    async fn delete_is_quiet_when_already_gone() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        // Should not panic or log an error path.
        store.delete("never-existed").await;
    }

    #[tokio::test]
    async fn purge_leaves_unrelated_files() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let state = sample_state();
        store.save(&state).await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "keep me")
            .await
            .unwrap();

        let removed = SnapshotStore::purge(dir.path()).await;
        assert_eq!(removed, 1);
        assert!(dir.path().join("notes.txt").exists());
        assert!(!dir
            .path()
            .join(format!("state_{}.json", state.id))
            .exists());
    }

    #[tokio::test]
    async fn remove_dir_only_when_empty() {
        let base = tempdir().unwrap();
        let managed = base.path().join("hist");
        tokio::fs::create_dir(&managed).await.unwrap();
        tokio::fs::write(managed.join("keep.txt"), "x").await.unwrap();

        SnapshotStore::remove_dir_if_empty(&managed).await;
        assert!(managed.exists());

        tokio::fs::remove_file(managed.join("keep.txt")).await.unwrap();
        SnapshotStore::remove_dir_if_empty(&managed).await;
        assert!(!managed.exists());
    }
}
