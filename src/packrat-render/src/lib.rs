//! Markdown artifact assembly.
//!
//! Turns a working set of files into the single text artifact the user
//! copies out: one fenced section per text file, optionally preceded by a
//! folder tree block.
//!
//! Symbol extraction is an external concern; [`SymbolExtractor`] is the
//! seam a host can plug a language-aware extractor into.

mod markdown;
mod tree;

pub use markdown::{render_markdown, RenderOptions, SymbolExtractor};
pub use tree::render_tree;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("base path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("invalid ignore pattern: {0}")]
    BadPattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
