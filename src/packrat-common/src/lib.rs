//! Common utilities shared across Packrat crates.
//!
//! - [`text`] - Text-file sniffing (decides which files are tracked/hashed)
//! - [`language`] - File extension to Markdown fence language mapping
//! - [`paths`] - Project-root detection and human-friendly path display

pub mod language;
pub mod paths;
pub mod text;

pub use language::detect_language;
pub use paths::{detect_project_root, display_path};
pub use text::is_text_file;
