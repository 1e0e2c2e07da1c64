//! Project-root detection and human-friendly path display.

use std::path::{Component, Path, PathBuf};

/// Marker files/directories that identify a likely project root.
const PROJECT_MARKERS: &[&str] = &[
    "pyproject.toml",
    "setup.py",
    "requirements.txt",
    "package.json",
    "node_modules",
    "Cargo.toml",
    ".git",
    "pom.xml",
    "build.gradle",
];

/// Deepest directory shared by every path in the slice.
fn common_ancestor(paths: &[PathBuf]) -> Option<PathBuf> {
    let mut iter = paths.iter();
    let first = iter.next()?;
    let mut common: PathBuf = first.parent()?.to_path_buf();

    for path in iter {
        let dir = path.parent()?;
        while !dir.starts_with(&common) {
            if !common.pop() {
                return None;
            }
        }
    }
    Some(common)
}

/// Find a likely project root by walking up from the common ancestor of
/// the given files, looking for marker files. Falls back to the common
/// ancestor itself when no marker is found; stops at the home directory.
pub fn detect_project_root(files: &[PathBuf]) -> Option<PathBuf> {
    let common = common_ancestor(files)?;
    let home = dirs::home_dir();

    let mut candidate = Some(common.as_path());
    while let Some(dir) = candidate {
        if PROJECT_MARKERS.iter().any(|m| dir.join(m).exists()) {
            return Some(dir.to_path_buf());
        }
        if home.as_deref() == Some(dir) || dir.parent().is_none() {
            break;
        }
        candidate = dir.parent();
    }

    Some(common)
}

fn parts(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Format a path for display:
/// - paths under the home directory are shown `~`-relative
/// - when `project_root` is inside home, the segment between `~` and the
///   root can be middle-ellipsized (`abbreviate`)
/// - everything else falls back to the absolute path
pub fn display_path(path: &Path, project_root: Option<&Path>, abbreviate: bool) -> String {
    let Some(home) = dirs::home_dir() else {
        return path.display().to_string();
    };

    let Ok(rel_to_home) = path.strip_prefix(&home) else {
        return path.display().to_string();
    };

    if let Some(root) = project_root
        && path.starts_with(root)
        && root.starts_with(&home)
    {
        let root_parts = parts(root.strip_prefix(&home).unwrap_or(root));
        let file_parts = parts(path.strip_prefix(root).unwrap_or(path));

        let shown_root = if abbreviate && root_parts.len() > 2 {
            format!("{}/…/{}", root_parts[0], root_parts[root_parts.len() - 1])
        } else {
            root_parts.join("/")
        };

        return if file_parts.is_empty() {
            format!("~/{shown_root}")
        } else {
            format!("~/{}/{}", shown_root, file_parts.join("/"))
        };
    }

    let segs = parts(rel_to_home);
    if abbreviate && segs.len() > 5 {
        return format!(
            "~/{}/{}/…/{}/{}",
            segs[0],
            segs[1],
            segs[segs.len() - 2],
            segs[segs.len() - 1]
        );
    }
    format!("~/{}", segs.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_ancestor_of_siblings() {
        let paths = vec![
            PathBuf::from("/srv/proj/src/a.rs"),
            PathBuf::from("/srv/proj/tests/b.rs"),
        ];
        assert_eq!(common_ancestor(&paths), Some(PathBuf::from("/srv/proj")));
    }

    #[test]
    fn common_ancestor_single_file_is_its_dir() {
        let paths = vec![PathBuf::from("/srv/proj/src/a.rs")];
        assert_eq!(common_ancestor(&paths), Some(PathBuf::from("/srv/proj/src")));
    }

    #[test]
    fn detect_root_finds_marker() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("Cargo.toml"), "[package]").unwrap();
        let file = root.join("src/main.rs");
        std::fs::write(&file, "fn main() {}").unwrap();

        let detected = detect_project_root(&[file]).unwrap();
        assert_eq!(detected, root);
    }

    #[test]
    fn display_path_outside_home_is_absolute() {
        let shown = display_path(Path::new("/var/log/syslog"), None, false);
        assert_eq!(shown, "/var/log/syslog");
    }

    #[test]
    fn display_path_under_home_is_tilde_relative() {
        let home = dirs::home_dir().unwrap();
        let path = home.join("work/proj/a.rs");
        assert_eq!(display_path(&path, None, false), "~/work/proj/a.rs");
    }

    #[test]
    fn display_path_abbreviates_deep_roots() {
        let home = dirs::home_dir().unwrap();
        let root = home.join("dev/spaces/deep/proj");
        let path = root.join("src/a.rs");
        let shown = display_path(&path, Some(&root), true);
        assert_eq!(shown, "~/dev/…/proj/src/a.rs");
    }
}
