//! Per-file staleness classification.
//!
//! Staleness is not an error: a file that changed, vanished, or became
//! unreadable since capture is surfaced as a status for user awareness,
//! never as a failure of the poll itself.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::hash::{hash_file, FileHash};

/// Why a file no longer matches its captured snapshot.
///
/// Variant order is ascending severity, so `Ord::max` yields the most
/// severe status for a one-line summary: missing > error > modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StaleStatus {
    /// Content differs from the captured digest.
    Modified,
    /// The file can no longer be read.
    Error,
    /// The file is gone.
    Missing,
}

impl fmt::Display for StaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StaleStatus::Modified => "modified",
            StaleStatus::Error => "error",
            StaleStatus::Missing => "missing",
        };
        f.write_str(label)
    }
}

/// Result of a staleness check. Paths still matching their captured hash
/// are omitted; an empty report means everything is current.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaleReport {
    files: BTreeMap<PathBuf, StaleStatus>,
}

impl StaleReport {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn status(&self, path: &Path) -> Option<StaleStatus> {
        self.files.get(path).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, StaleStatus)> {
        self.files.iter().map(|(p, s)| (p, *s))
    }

    /// The single most severe status across all files, for a summary
    /// badge. `None` when everything is current.
    pub fn severity(&self) -> Option<StaleStatus> {
        self.files.values().copied().max()
    }
}

/// Recompute the hash of every path in a snapshot's recorded map and
/// classify each against its stored value.
///
/// Every stored path is checked, including ones that have become
/// unreadable or binary since capture; their state is exactly what the
/// user needs to be warned about.
pub async fn check(stored: &BTreeMap<PathBuf, FileHash>) -> StaleReport {
    let mut files = BTreeMap::new();

    for (path, stored_hash) in stored {
        let status = match hash_file(path).await {
            FileHash::Missing => Some(StaleStatus::Missing),
            FileHash::ReadError => Some(StaleStatus::Error),
            FileHash::Digest(current) => {
                if matches!(stored_hash, FileHash::Digest(s) if *s == current) {
                    None
                } else {
                    Some(StaleStatus::Modified)
                }
            }
        };
        if let Some(status) = status {
            files.insert(path.clone(), status);
        }
    }

    StaleReport { files }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn captured(path: &Path) -> BTreeMap<PathBuf, FileHash> {
        let mut stored = BTreeMap::new();
        stored.insert(path.to_path_buf(), hash_file(path).await);
        stored
    }

    #[test]
    fn severity_order_is_missing_error_modified() {
        assert!(StaleStatus::Missing > StaleStatus::Error);
        assert!(StaleStatus::Error > StaleStatus::Modified);
    }

    #[tokio::test]
    async fn unchanged_file_is_omitted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        tokio::fs::write(&path, "original").await.unwrap();

        let stored = captured(&path).await;
        let report = check(&stored).await;
        assert!(report.is_empty());
        assert_eq!(report.severity(), None);
    }

    #[tokio::test]
    async fn changed_content_is_modified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        tokio::fs::write(&path, "original").await.unwrap();

        let stored = captured(&path).await;
        tokio::fs::write(&path, "edited").await.unwrap();

        let report = check(&stored).await;
        assert_eq!(report.status(&path), Some(StaleStatus::Modified));
    }

    #[tokio::test]
    async fn deleted_file_is_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        tokio::fs::write(&path, "original").await.unwrap();

        let stored = captured(&path).await;
        tokio::fs::remove_file(&path).await.unwrap();

        let report = check(&stored).await;
        assert_eq!(report.status(&path), Some(StaleStatus::Missing));
    }

    #[tokio::test]
    async fn restored_identical_bytes_are_current_again() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        tokio::fs::write(&path, "original").await.unwrap();

        let stored = captured(&path).await;
        tokio::fs::remove_file(&path).await.unwrap();
        tokio::fs::write(&path, "original").await.unwrap();

        let report = check(&stored).await;
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn file_appearing_after_missing_capture_is_modified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("late.txt");

        // Captured while absent.
        let stored = captured(&path).await;
        assert_eq!(stored.get(&path), Some(&FileHash::Missing));

        tokio::fs::write(&path, "now exists").await.unwrap();
        let report = check(&stored).await;
        assert_eq!(report.status(&path), Some(StaleStatus::Modified));
    }

    #[tokio::test]
    async fn severity_reduces_to_most_severe() {
        let dir = tempdir().unwrap();
        let modified = dir.path().join("m.txt");
        let missing = dir.path().join("g.txt");
        tokio::fs::write(&modified, "one").await.unwrap();
        tokio::fs::write(&missing, "two").await.unwrap();

        let mut stored = BTreeMap::new();
        stored.insert(modified.clone(), hash_file(&modified).await);
        stored.insert(missing.clone(), hash_file(&missing).await);

        tokio::fs::write(&modified, "changed").await.unwrap();
        tokio::fs::remove_file(&missing).await.unwrap();

        let report = check(&stored).await;
        assert_eq!(report.len(), 2);
        assert_eq!(report.severity(), Some(StaleStatus::Missing));
    }
}
