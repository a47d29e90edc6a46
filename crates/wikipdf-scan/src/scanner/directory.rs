//! Export every page in the tree.

use std::path::{Path, PathBuf};

use super::{DirListing, PageScanner, file_stem, find_dir};
use crate::page::relative_url;
use crate::{ExcludeFilter, OrderFile, Page, ScanError};

/// Walks every directory, listing all markdown pages.
///
/// Pages are sorted by name, except that entries named in a directory's
/// `.order` file come first in listed order. Each page is followed by the
/// contents of its same-named subdirectory; subdirectories without a page
/// are appended after all pages of their parent.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    root: PathBuf,
    exclude: ExcludeFilter,
}

impl DirectoryScanner {
    /// Create a scanner rooted at the export directory.
    #[must_use]
    pub fn new(root: &Path, exclude: ExcludeFilter) -> Self {
        Self {
            root: root.to_path_buf(),
            exclude,
        }
    }

    fn scan_dir(&self, listing: DirListing, dir: &Path, level: usize, pages: &mut Vec<Page>) {
        let DirListing {
            pages: mut files,
            dirs: mut subdirs,
        } = listing;

        if let Some(order) = OrderFile::read(dir) {
            files.sort_by_key(|f| order.position(&file_stem(f)).unwrap_or(usize::MAX));
        }

        for file in files {
            let stem = file_stem(&file);
            let relative = relative_url(&file, &self.root);
            if self.exclude.is_excluded(&relative) {
                tracing::info!(page = %relative, "Excluded page");
            } else {
                pages.push(Page::load(file, &self.root, level));
            }

            // Exclusion only drops the page entry, its subtree is still visited.
            if let Some(i) = find_dir(&subdirs, &stem) {
                let subdir = subdirs.remove(i);
                self.scan_dir(DirListing::read_nested(&subdir), &subdir, level + 1, pages);
            }
        }

        for subdir in subdirs {
            self.scan_dir(DirListing::read_nested(&subdir), &subdir, level + 1, pages);
        }
    }
}

impl PageScanner for DirectoryScanner {
    fn scan(&self) -> Result<Vec<Page>, ScanError> {
        let listing = DirListing::read(&self.root)?;
        let mut pages = Vec::new();
        self.scan_dir(listing, &self.root, 0, &mut pages);
        tracing::info!(count = pages.len(), "Scanned wiki directory");
        Ok(pages)
    }
}
