//! Export only pages listed in `.order` files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::{DirListing, PageScanner, file_name_lower, find_dir};
use crate::page::relative_url;
use crate::{ExcludeFilter, OrderFile, Page, ScanError};

/// Follows `.order` files from the export root downward.
///
/// Every listed entry yields a page, even when `{entry}.md` does not exist
/// (its content is then empty). A directory is only visited when its parent
/// lists a page of the same name, and contributes nothing without its own
/// `.order` file. An entry listed twice (compared case-insensitively) is
/// exported once, at its first position.
#[derive(Debug, Clone)]
pub struct OrderFileScanner {
    root: PathBuf,
    exclude: ExcludeFilter,
}

impl OrderFileScanner {
    /// Create a scanner rooted at the export directory.
    #[must_use]
    pub fn new(root: &Path, exclude: ExcludeFilter) -> Self {
        Self {
            root: root.to_path_buf(),
            exclude,
        }
    }

    fn scan_dir(&self, listing: &DirListing, dir: &Path, level: usize, pages: &mut Vec<Page>) {
        let Some(order) = OrderFile::read(dir) else {
            tracing::debug!(path = %dir.display(), "No order file");
            return;
        };

        let mut seen = HashSet::new();
        for entry in order.entries() {
            if !seen.insert(entry.to_lowercase()) {
                tracing::debug!(entry = %entry, "Skipping duplicate order entry");
                continue;
            }

            let file = page_path(listing, dir, entry);
            let relative = relative_url(&file, &self.root);
            if self.exclude.is_excluded(&relative) {
                tracing::info!(page = %relative, "Excluded page");
            } else {
                pages.push(Page::load(file, &self.root, level));
            }

            if let Some(i) = find_dir(&listing.dirs, entry) {
                let subdir = &listing.dirs[i];
                self.scan_dir(&DirListing::read_nested(subdir), subdir, level + 1, pages);
            }
        }
    }
}

impl PageScanner for OrderFileScanner {
    fn scan(&self) -> Result<Vec<Page>, ScanError> {
        let listing = DirListing::read(&self.root)?;
        let mut pages = Vec::new();
        self.scan_dir(&listing, &self.root, 0, &mut pages);
        tracing::info!(count = pages.len(), "Scanned order files");
        Ok(pages)
    }
}

/// Path of the page an entry refers to, preferring an existing file whose
/// name matches ignoring case.
fn page_path(listing: &DirListing, dir: &Path, entry: &str) -> PathBuf {
    let wanted = format!("{entry}.md").to_lowercase();
    listing
        .pages
        .iter()
        .find(|p| file_name_lower(p).is_some_and(|n| n == wanted))
        .cloned()
        .unwrap_or_else(|| dir.join(format!("{entry}.md")))
}
