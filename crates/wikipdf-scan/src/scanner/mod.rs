//! Page ordering strategies.
//!
//! Each strategy walks the export directory and returns pages in the order
//! they appear in the final document:
//!
//! - [`DirectoryScanner`] exports every page, honoring `.order` where present
//! - [`OrderFileScanner`] exports only pages listed in `.order` files
//! - [`SingleFileScanner`] exports one page or one listed subtree

mod directory;
mod order_files;
mod single_file;

use std::fs;
use std::path::{Path, PathBuf};

pub use directory::DirectoryScanner;
pub use order_files::OrderFileScanner;
pub use single_file::SingleFileScanner;

use crate::page::is_markdown;
use crate::{Page, ScanError};

/// Produces the ordered page list of an export.
pub trait PageScanner {
    /// Scan the wiki and return pages in document order.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when the scan cannot produce a meaningful result
    /// (unreadable root, missing single-file target).
    fn scan(&self) -> Result<Vec<Page>, ScanError>;
}

/// Markdown files and subdirectories of one directory, sorted by name.
///
/// Entries whose name starts with `.` are skipped.
#[derive(Debug, Default)]
struct DirListing {
    pages: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl DirListing {
    fn read(dir: &Path) -> Result<Self, ScanError> {
        let entries = fs::read_dir(dir).map_err(|source| ScanError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut listing = Self::default();
        for entry in entries.filter_map(Result::ok) {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                listing.dirs.push(path);
            } else if is_markdown(&path) {
                listing.pages.push(path);
            }
        }
        listing.pages.sort();
        listing.dirs.sort();
        Ok(listing)
    }

    /// Read a nested directory, logging instead of failing.
    fn read_nested(dir: &Path) -> Self {
        Self::read(dir).unwrap_or_else(|e| {
            tracing::warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
            Self::default()
        })
    }
}

/// Index of the directory named `name`, ignoring case.
fn find_dir(dirs: &[PathBuf], name: &str) -> Option<usize> {
    let name = name.to_lowercase();
    dirs.iter()
        .position(|d| file_name_lower(d).is_some_and(|n| n == name))
}

fn file_name_lower(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_lowercase())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
