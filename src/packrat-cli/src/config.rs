//! User configuration.
//!
//! Loaded from `<config_dir>/packrat/config.toml`. Every field is
//! optional; a missing or unreadable file yields the defaults so the tool
//! always starts.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

/// Subtrees skipped by default when rendering a folder tree.
pub const TREE_IGNORE_DEFAULT: &str =
    r"__pycache__|\.git|\.DS_Store|\.idea|\.ruff_cache|\.venv|\.pytest_cache|node_modules|target";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackratConfig {
    /// Base directory for history snapshot storage.
    pub history_dir: Option<PathBuf>,
    /// Whether `render` output includes the folder tree block.
    pub tree_enabled: bool,
    /// Regex of paths to omit from the folder tree.
    pub tree_ignore: Option<String>,
    /// Folder tree depth cap.
    pub tree_max_depth: Option<usize>,
}

impl PackratConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("packrat").join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it is missing
    /// or malformed. A malformed file is reported, not fatal.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(raw) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring malformed config file");
                Self::default()
            }
        }
    }

    pub fn tree_ignore(&self) -> &str {
        self.tree_ignore.as_deref().unwrap_or(TREE_IGNORE_DEFAULT)
    }
}
