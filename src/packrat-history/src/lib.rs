//! Session history and staleness detection for Packrat.
//!
//! Captures each distinct selection state as an immutable, persisted
//! snapshot, maintains a navigable linear history with branch-truncation
//! semantics, and detects when previously captured snapshots have gone
//! stale relative to the files on disk.
//!
//! # Module Structure
//!
//! - [`hash`] - Content hashing with sentinel outcomes for unreadable files
//! - [`state`] - The persisted session state record
//! - [`store`] - On-disk snapshot persistence
//! - [`navigator`] - Cursor-over-list undo/redo state machine
//! - [`stale`] - Per-file staleness classification
//! - [`engine`] - The orchestrator tying the above together

pub mod engine;
pub mod hash;
pub mod navigator;
pub mod stale;
pub mod state;
pub mod store;


pub use engine::{
    ApplyGuard, CaptureOutcome, CaptureRequest, HistoryEngine, HistoryPosition, NavOutcome,
    TextFilter, HISTORY_DIR_NAME, STALE_CHECK_INTERVAL,
};
pub use hash::{hash_file, FileHash};
pub use navigator::HistoryNavigator;
pub use stale::{StaleReport, StaleStatus};
pub use state::{SelectionMode, SessionState, StateRef};
pub use store::SnapshotStore;

use std::path::PathBuf;
use thiserror::Error;

/// History subsystem errors.
///
/// Only `StorageUnavailable` and `SnapshotCorrupt`/`SnapshotNotFound` are
/// user-visible interruptions; per-file staleness is never an error.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history directory cannot be created or written. Disables
    /// history for the session; the application stays usable.
    #[error("history storage unavailable at {path}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot file referenced by the history list no longer exists.
    #[error("history snapshot not found: {0}")]
    SnapshotNotFound(String),

    /// A snapshot file exists but cannot be parsed.
    #[error("history snapshot corrupt: {id}: {source}")]
    SnapshotCorrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO error during snapshot operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error while writing a snapshot.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;
