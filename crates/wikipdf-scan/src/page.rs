//! Discovered wiki pages.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// A markdown page in final document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Absolute path of the `.md` file (may not exist for stale order entries).
    pub absolute_path: PathBuf,
    /// Containing directory relative to the scan root, `/`-separated with a
    /// leading slash (`/` for the root itself).
    pub directory_relative_path: String,
    /// Page path relative to the scan root, `/`-separated with a leading
    /// slash, e.g. `/Section/Page.md`.
    pub wiki_relative_path: String,
    /// Depth below the scan root. Top-level pages are 0.
    pub level: usize,
    /// Page text, empty when the file is missing or unreadable.
    pub content: String,
}

impl Page {
    /// Create a page and load its content from disk.
    #[must_use]
    pub fn load(absolute_path: PathBuf, scan_root: &Path, level: usize) -> Self {
        let content = read_content(&absolute_path);
        Self::with_content(absolute_path, scan_root, level, content)
    }

    /// Create a page with already known content.
    #[must_use]
    pub fn with_content(
        absolute_path: PathBuf,
        scan_root: &Path,
        level: usize,
        content: String,
    ) -> Self {
        let wiki_relative_path = relative_url(&absolute_path, scan_root);
        let directory_relative_path = absolute_path
            .parent()
            .map_or_else(|| "/".to_owned(), |dir| relative_url(dir, scan_root));
        Self {
            absolute_path,
            directory_relative_path,
            wiki_relative_path,
            level,
            content,
        }
    }

    /// File name without the `.md` extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        self.absolute_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

/// Whether `path` has a `.md` extension, ignoring case.
pub(crate) fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

/// `/`-separated path of `path` below `root`, with a leading slash.
///
/// Falls back to the full path when `path` is not below `root`.
pub(crate) fn relative_url(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let segments: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    format!("/{}", segments.join("/"))
}

fn read_content(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Page has no backing file");
            String::new()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read page");
            String::new()
        }
    }
}
