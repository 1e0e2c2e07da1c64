//! Markdown folder-tree block.

use std::fs;
use std::path::Path;

use regex::Regex;

use packrat_common::display_path;

use crate::{RenderError, Result};

const MAX_DEPTH_DEFAULT: usize = 5;

fn entry_sort_key(path: &Path) -> (bool, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    (path.is_file(), name)
}

fn add_nodes(lines: &mut Vec<String>, dir: &Path, prefix: &str, ignore: &Regex, depth: usize, max_depth: usize) {
    if depth >= max_depth {
        return;
    }

    let mut children: Vec<_> = match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        Err(_) => {
            lines.push(format!("{prefix}└── [permission denied]"));
            return;
        }
    };
    children.sort_by_key(|p| entry_sort_key(p));
    children.retain(|p| !ignore.is_match(&p.to_string_lossy()));

    let last = children.len().saturating_sub(1);
    for (i, child) in children.iter().enumerate() {
        let connector = if i == last { "└── " } else { "├── " };
        let is_dir = child.is_dir();
        let name = child
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let label = if is_dir { format!("{name}/") } else { name };
        lines.push(format!("{prefix}{connector}{label}"));

        if is_dir {
            let child_prefix = if i == last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}│   ")
            };
            add_nodes(lines, child, &child_prefix, ignore, depth + 1, max_depth);
        }
    }
}

/// Render a Markdown folder-tree block rooted at `base`.
///
/// `ignore_pattern` is matched against each entry's full path; matching
/// entries (and their subtrees) are omitted. Depth is capped so huge
/// workspaces stay readable.
pub fn render_tree(
    base: &Path,
    ignore_pattern: &str,
    max_depth: Option<usize>,
    project_root: Option<&Path>,
) -> Result<String> {
    if !base.is_dir() {
        return Err(RenderError::NotADirectory(base.to_path_buf()));
    }
    let ignore = Regex::new(ignore_pattern)?;
    let max_depth = max_depth.unwrap_or(MAX_DEPTH_DEFAULT);

    let base_name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| base.display().to_string());

    let mut lines = vec![format!("{base_name}/")];
    add_nodes(&mut lines, base, "", &ignore, 0, max_depth);

    let shown = display_path(base, project_root, true);
    Ok(format!(
        "# Folder Tree of {shown}\n\n```text\n{}\n```\n",
        lines.join("\n")
    ))
}
