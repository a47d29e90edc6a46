//! Export one page or one subtree.

use std::path::{Path, PathBuf};

use super::{OrderFileScanner, PageScanner};
use crate::page::is_markdown;
use crate::{ExcludeFilter, Page, ScanError};

/// Exports a single target.
///
/// A target ending in `.md` names one file, exported alone at level 0 without
/// looking at any `.order` file. Any other target is searched for in the
/// order-file listing: the first page whose wiki-relative path contains it is
/// exported together with the pages nested below it.
#[derive(Debug, Clone)]
pub struct SingleFileScanner {
    root: PathBuf,
    target: String,
    listed: OrderFileScanner,
}

impl SingleFileScanner {
    /// Create a scanner for `target` below the export directory.
    #[must_use]
    pub fn new(root: &Path, target: impl Into<String>, exclude: ExcludeFilter) -> Self {
        Self {
            root: root.to_path_buf(),
            target: target.into(),
            listed: OrderFileScanner::new(root, exclude),
        }
    }

    fn scan_file(&self) -> Result<Vec<Page>, ScanError> {
        let path = self.resolve_file()?;
        tracing::info!(path = %path.display(), "Exporting single file");
        Ok(vec![Page::load(path, &self.root, 0)])
    }

    /// Resolve a `.md` target against the export directory, then the
    /// working directory.
    fn resolve_file(&self) -> Result<PathBuf, ScanError> {
        let target = Path::new(&self.target);
        let candidates = if target.is_absolute() {
            vec![target.to_path_buf()]
        } else {
            let below_root = self.root.join(self.target.trim_start_matches(['/', '\\']));
            vec![below_root, target.to_path_buf()]
        };
        candidates
            .into_iter()
            .find(|p| p.is_file())
            .and_then(|p| p.canonicalize().ok())
            .ok_or_else(|| ScanError::TargetNotFound(self.target.clone()))
    }

    fn scan_subtree(&self) -> Result<Vec<Page>, ScanError> {
        let mut pages = self.listed.scan()?.into_iter();
        let Some(start) = pages
            .by_ref()
            .find(|p| p.wiki_relative_path.contains(&self.target))
        else {
            tracing::error!(single = %self.target, "Single-file target not found");
            return Err(ScanError::TargetNotFound(self.target.clone()));
        };

        let level = start.level;
        let mut result = vec![start];
        result.extend(pages.take_while(|p| p.level > level));
        tracing::info!(single = %self.target, count = result.len(), "Selected subtree");
        Ok(result)
    }
}

impl PageScanner for SingleFileScanner {
    fn scan(&self) -> Result<Vec<Page>, ScanError> {
        if is_markdown(Path::new(&self.target)) {
            self.scan_file()
        } else {
            self.scan_subtree()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn write(root: &Path, path: &str, content: &str) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        write(root, ".order", "Intro\nGuide\nAppendix\n");
        write(root, "Intro.md", "# Intro");
        write(root, "Guide.md", "# Guide");
        write(root, "Guide/.order", "Setup\nUsage\n");
        write(root, "Guide/Setup.md", "# Setup");
        write(root, "Guide/Usage.md", "# Usage");
        write(root, "Appendix.md", "# Appendix");
        temp_dir
    }

    #[test]
    fn test_markdown_target_skips_order_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        write(&root, "Unlisted.md", "# Unlisted");
        write(&root, ".order", "Other\n");

        let pages = SingleFileScanner::new(&root, "Unlisted.md", ExcludeFilter::default())
            .scan()
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].level, 0);
        assert_eq!(pages[0].wiki_relative_path, "/Unlisted.md");
        assert_eq!(pages[0].content, "# Unlisted");
    }

    #[test]
    fn test_missing_markdown_target() {
        let temp_dir = fixture();

        let result =
            SingleFileScanner::new(temp_dir.path(), "Nope.md", ExcludeFilter::default()).scan();

        assert!(matches!(result, Err(ScanError::TargetNotFound(t)) if t == "Nope.md"));
    }

    #[test]
    fn test_substring_target_takes_subtree() {
        let temp_dir = fixture();

        let pages = SingleFileScanner::new(temp_dir.path(), "Guide", ExcludeFilter::default())
            .scan()
            .unwrap();

        let paths: Vec<_> = pages.iter().map(|p| p.wiki_relative_path.as_str()).collect();
        assert_eq!(paths, vec!["/Guide.md", "/Guide/Setup.md", "/Guide/Usage.md"]);
    }

    #[test]
    fn test_leaf_target_stops_at_sibling() {
        let temp_dir = fixture();

        let pages = SingleFileScanner::new(temp_dir.path(), "Setup", ExcludeFilter::default())
            .scan()
            .unwrap();

        let paths: Vec<_> = pages.iter().map(|p| p.wiki_relative_path.as_str()).collect();
        assert_eq!(paths, vec!["/Guide/Setup.md"]);
    }

    #[test]
    fn test_unknown_target() {
        let temp_dir = fixture();

        let result =
            SingleFileScanner::new(temp_dir.path(), "Missing", ExcludeFilter::default()).scan();

        assert!(matches!(result, Err(ScanError::TargetNotFound(_))));
    }
}
