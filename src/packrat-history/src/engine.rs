//! The session history engine.
//!
//! Composes the store, navigator, hasher and staleness detector behind the
//! five operations the shell needs: capture, back, forward, relocate, and
//! the periodic staleness poll. Owns the storage directory lifecycle.
//!
//! The engine is a single logical owner: every mutation goes through
//! `&mut self`, so there is no cross-thread shared state to lock. The
//! [`ApplyGuard`] exists for reentrancy on the same execution context:
//! a poll or a change-notification firing while a loaded state is being
//! applied back to the shell must not record a new capture mid-apply.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::hash::hash_file;
use crate::navigator::HistoryNavigator;
use crate::stale::{self, StaleReport};
use crate::state::{SelectionMode, SessionState, StateRef};
use crate::store::SnapshotStore;
use crate::Result;

/// Name of the managed subdirectory created under the storage base path.
pub const HISTORY_DIR_NAME: &str = "PackratHistory";

/// How often the shell's timer should poll for staleness.
pub const STALE_CHECK_INTERVAL: Duration = Duration::from_millis(2500);

/// The `is_text_file` collaborator seam: decides which files are hashed
/// and therefore tracked for staleness.
pub type TextFilter = fn(&Path) -> bool;

/// What the shell wants captured.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub files: Vec<PathBuf>,
    pub selected_items: Vec<String>,
    pub selection_mode: SelectionMode,
    pub selected_file: Option<PathBuf>,
}

/// What happened to a capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A new snapshot was persisted and appended.
    Recorded,
    /// Identical to the current state; nothing was written.
    Duplicate,
    /// History is disabled or a state is currently being applied.
    Skipped,
}

/// A successful navigation: the loaded state plus its staleness.
#[derive(Debug, Clone)]
pub struct NavOutcome {
    pub state: SessionState,
    pub stale: StaleReport,
}

/// Position for rendering "N of M" and back/forward enablement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPosition {
    /// Zero-based cursor, `None` when the list is empty.
    pub index: Option<usize>,
    pub len: usize,
}

impl HistoryPosition {
    /// One-based "N of M" label, or "empty".
    pub fn label(&self) -> String {
        match self.index {
            Some(i) => format!("{} of {}", i + 1, self.len),
            None => "empty".to_string(),
        }
    }
}

/// RAII reentrancy guard around navigation/apply sequences.
///
/// Counter-based so nested holds are safe; released on every exit path,
/// including panics, via `Drop`.
#[derive(Debug)]
pub struct ApplyGuard {
    holds: Arc<AtomicUsize>,
}

impl ApplyGuard {
    fn acquire(holds: &Arc<AtomicUsize>) -> Self {
        holds.fetch_add(1, Ordering::SeqCst);
        Self {
            holds: Arc::clone(holds),
        }
    }
}

impl Drop for ApplyGuard {
    fn drop(&mut self) {
        self.holds.fetch_sub(1, Ordering::SeqCst);
    }
}

enum Direction {
    Back,
    Forward,
}

/// Orchestrator for session history and staleness detection.
pub struct HistoryEngine {
    /// `None` while history is disabled (storage unavailable or not yet
    /// initialized).
    store: Option<SnapshotStore>,
    /// The user-configured base path actually in effect, if any.
    base_override: Option<PathBuf>,
    navigator: HistoryNavigator,
    /// Full state at the cursor, kept in memory for dedup and polling.
    current: Option<SessionState>,
    text_filter: TextFilter,
    applying: Arc<AtomicUsize>,
}

impl HistoryEngine {
    /// Create an engine with the given text-file probe. History stays
    /// disabled until [`init_storage`](Self::init_storage) succeeds.
    pub fn new(text_filter: TextFilter) -> Self {
        Self {
            store: None,
            base_override: None,
            navigator: HistoryNavigator::new(),
            current: None,
            text_filter,
            applying: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Resolve and create the history directory.
    ///
    /// Prefers `preferred` when it is an existing directory, otherwise
    /// falls back to the platform temp location. A creation failure
    /// disables history for the session and is reported to the caller;
    /// the surrounding application must stay usable without history.
    pub async fn init_storage(&mut self, preferred: Option<&Path>) -> Result<()> {
        let base = match preferred {
            Some(p) if p.is_dir() => {
                self.base_override = Some(p.to_path_buf());
                p.to_path_buf()
            }
            Some(p) => {
                warn!(path = %p.display(), "Configured history base path is not a directory, using temp location");
                self.base_override = None;
                std::env::temp_dir()
            }
            None => {
                self.base_override = None;
                std::env::temp_dir()
            }
        };

        let dir = base.join(HISTORY_DIR_NAME);
        match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => {
                info!(dir = %dir.display(), "History directory ready");
                self.store = Some(SnapshotStore::new(dir));
                Ok(())
            }
            Err(source) => {
                error!(dir = %dir.display(), error = %source, "Could not create history directory, history disabled");
                self.store = None;
                Err(crate::HistoryError::StorageUnavailable { path: dir, source })
            }
        }
    }

    /// Whether history is active for this session.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// The directory snapshots are written to, when enabled.
    pub fn history_dir(&self) -> Option<&Path> {
        self.store.as_ref().map(SnapshotStore::dir)
    }

    /// The user-configured base path in effect, if any.
    pub fn base_override(&self) -> Option<&Path> {
        self.base_override.as_deref()
    }

    pub fn position(&self) -> HistoryPosition {
        HistoryPosition {
            index: self.navigator.cursor(),
            len: self.navigator.len(),
        }
    }

    pub fn can_back(&self) -> bool {
        self.navigator.can_back()
    }

    pub fn can_forward(&self) -> bool {
        self.navigator.can_forward()
    }

    /// The full state at the cursor, if any.
    pub fn current(&self) -> Option<&SessionState> {
        self.current.as_ref()
    }

    /// Acquire the reentrancy guard. The shell holds one while applying a
    /// loaded state back to its widgets so change notifications do not
    /// record spurious captures.
    pub fn apply_guard(&self) -> ApplyGuard {
        ApplyGuard::acquire(&self.applying)
    }

    fn is_applying(&self) -> bool {
        self.applying.load(Ordering::SeqCst) > 0
    }

    /// Capture the current selection as a new snapshot.
    ///
    /// Hashes tracked (text) files, suppresses exact duplicates of the
    /// current state, persists the record, then discards any forward
    /// branch and advances the cursor to the new tail.
    pub async fn capture(&mut self, request: CaptureRequest) -> Result<CaptureOutcome> {
        if self.is_applying() {
            debug!("Skipping capture while a history state is being applied");
            return Ok(CaptureOutcome::Skipped);
        }
        let Some(store) = self.store.as_ref() else {
            return Ok(CaptureOutcome::Skipped);
        };

        let mut file_hashes = BTreeMap::new();
        for path in &request.files {
            if (self.text_filter)(path) {
                file_hashes.insert(path.clone(), hash_file(path).await);
            }
        }

        let state = SessionState::new(
            request.files,
            request.selected_items,
            request.selection_mode,
            request.selected_file,
            file_hashes,
        );

        if let Some(current) = &self.current {
            if state.same_capture(current) {
                debug!("Skipping capture, state identical to current");
                return Ok(CaptureOutcome::Duplicate);
            }
        }

        // Persist before touching the list so a failed write leaves the
        // history exactly as it was.
        store.save(&state).await?;

        let discarded = self.navigator.push(StateRef::from(&state));
        if !discarded.is_empty() {
            debug!(count = discarded.len(), "Discarding forward history branch");
            for old in &discarded {
                store.delete(&old.id).await;
            }
        }

        info!(id = %state.id, position = %self.position().label(), "Recorded history state");
        self.current = Some(state);
        Ok(CaptureOutcome::Recorded)
    }

    /// Step to the previous snapshot, load it, and check its staleness.
    ///
    /// Returns `Ok(None)` when already at the oldest entry. A load failure
    /// prunes the dead reference, restores the cursor to the entry the
    /// user was on, and surfaces the error (non-fatal).
    pub async fn back(&mut self) -> Result<Option<NavOutcome>> {
        self.navigate(Direction::Back).await
    }

    /// Step to the next snapshot; the mirror of [`back`](Self::back).
    pub async fn forward(&mut self) -> Result<Option<NavOutcome>> {
        self.navigate(Direction::Forward).await
    }

    async fn navigate(&mut self, direction: Direction) -> Result<Option<NavOutcome>> {
        if self.store.is_none() {
            return Ok(None);
        }
        let Some(origin) = self.navigator.cursor() else {
            return Ok(None);
        };

        // Held across the load and the caller's apply; capture() refuses
        // to run while it is out.
        let _guard = self.apply_guard();

        let entry = match direction {
            Direction::Back => self.navigator.back(),
            Direction::Forward => self.navigator.forward(),
        };
        let Some(entry) = entry else {
            return Ok(None);
        };
        let Some(store) = self.store.as_ref() else {
            return Ok(None);
        };

        match store.load(&entry.id).await {
            Ok(state) => {
                debug!(id = %entry.id, position = %self.position().label(), "Loaded history state");
                let stale = stale::check(&state.file_hashes).await;
                self.current = Some(state.clone());
                Ok(Some(NavOutcome { state, stale }))
            }
            Err(err) => {
                warn!(id = %entry.id, error = %err, "Removing unreadable history entry");
                if let Some(bad) = self.navigator.cursor() {
                    self.navigator.remove(bad);
                    // Put the cursor back on the state the user was on,
                    // accounting for the removal shifting indices.
                    let restored = if bad < origin { origin - 1 } else { origin };
                    if !self.navigator.is_empty() {
                        self.navigator.move_to(restored.min(self.navigator.len() - 1));
                    }
                }
                Err(err)
            }
        }
    }

    /// Staleness of the snapshot currently pointed to. Empty when history
    /// is disabled or empty.
    pub async fn poll_staleness(&self) -> StaleReport {
        match (&self.store, &self.current) {
            (Some(_), Some(state)) => stale::check(&state.file_hashes).await,
            _ => StaleReport::default(),
        }
    }

    /// Destructive move of the history location: purge all snapshots at
    /// the old location, clear the in-memory list, and re-initialize
    /// against the new base path. History is not migrated.
    ///
    /// The caller must stop the staleness poll timer before calling this
    /// and restart it only after a successful return, so a poll cannot
    /// race the directory deletion.
    pub async fn relocate(&mut self, new_base: Option<&Path>) -> Result<()> {
        self.discard_all("relocating history").await;
        self.init_storage(new_base).await
    }

    /// Shutdown cleanup: purge the managed directory and disable history.
    pub async fn shutdown(&mut self) {
        self.discard_all("shutting down").await;
    }

    async fn discard_all(&mut self, reason: &str) {
        if let Some(store) = self.store.take() {
            let removed = SnapshotStore::purge(store.dir()).await;
            SnapshotStore::remove_dir_if_empty(store.dir()).await;
            info!(removed, dir = %store.dir().display(), reason, "Cleared history storage");
        }
        self.navigator.clear();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_label_formats() {
        let empty = HistoryPosition { index: None, len: 0 };
        assert_eq!(empty.label(), "empty");

        let at = HistoryPosition {
            index: Some(2),
            len: 5,
        };
        assert_eq!(at.label(), "3 of 5");
    }

    #[test]
    fn apply_guard_nests_and_releases() {
        fn all_text(_: &Path) -> bool {
            true
        }
        let engine = HistoryEngine::new(all_text);
        assert!(!engine.is_applying());
        {
            let _outer = engine.apply_guard();
            let _inner = engine.apply_guard();
            assert!(engine.is_applying());
        }
        assert!(!engine.is_applying());
    }
}
