//! `.order` file parsing.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Name of the per-directory file listing page names in display order.
pub const ORDER_FILENAME: &str = ".order";

/// Ordered page names (without `.md`) for one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFile {
    entries: Vec<String>,
}

impl OrderFile {
    /// Parse order file content. Lines are trimmed and blank lines skipped.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Self { entries }
    }

    /// Read the order file of `dir`, if it has one.
    ///
    /// An unreadable order file is logged and treated as absent.
    #[must_use]
    pub fn read(dir: &Path) -> Option<Self> {
        let path = dir.join(ORDER_FILENAME);
        match fs::read_to_string(&path) {
            Ok(content) => Some(Self::parse(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read order file");
                None
            }
        }
    }

    /// Entries in file order.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Position of the first entry equal to `name`, ignoring case.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.entries.iter().position(|e| e.to_lowercase() == name)
    }
}
