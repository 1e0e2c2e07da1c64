//! File extension to Markdown fence language mapping.

use std::path::Path;

/// Returns the Markdown code-fence language id for a file, or "" when no
/// mapping is known (plain fence).
pub fn detect_language(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("py") => "python",
        Some("js") => "javascript",
        Some("ts") | Some("tsx") => "typescript",
        Some("java") => "java",
        Some("cpp") | Some("hpp") => "cpp",
        Some("c") | Some("h") => "c",
        Some("cs") => "csharp",
        Some("html") => "html",
        Some("css") => "css",
        Some("json") => "json",
        Some("xml") => "xml",
        Some("md") => "markdown",
        Some("sh") => "bash",
        Some("rb") => "ruby",
        Some("php") => "php",
        Some("go") => "go",
        Some("rs") => "rust",
        Some("swift") => "swift",
        Some("kt") => "kotlin",
        Some("sql") => "sql",
        Some("yaml") | Some("yml") => "yaml",
        Some("toml") => "toml",
        Some("ini") | Some("cfg") => "ini",
        Some("dockerfile") => "dockerfile",
        Some("tf") => "terraform",
        Some("log") => "log",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(detect_language(Path::new("/a/b.rs")), "rust");
        assert_eq!(detect_language(Path::new("/a/b.py")), "python");
        assert_eq!(detect_language(Path::new("/a/b.YAML")), "yaml");
    }

    #[test]
    fn unknown_extension_is_plain() {
        assert_eq!(detect_language(Path::new("/a/b.txt")), "");
        assert_eq!(detect_language(Path::new("/a/noext")), "");
    }
}
