//! Wiki root discovery.

use std::path::{Path, PathBuf};

use crate::ScanError;

/// Name of the folder Azure DevOps wikis store uploaded files in.
///
/// Its presence marks the wiki root.
pub const ATTACHMENTS_DIR: &str = ".attachments";

/// Export and base directories of one run.
///
/// `base_dir` is always `export_dir` itself or one of its ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLocation {
    export_dir: PathBuf,
    base_dir: PathBuf,
}

impl WikiLocation {
    /// Resolve the wiki location for an export target directory.
    ///
    /// Walks upward from `path` until a directory directly containing
    /// [`ATTACHMENTS_DIR`] is found. When the filesystem root is reached
    /// without a match, the export directory doubles as the base.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::LocationNotFound`] if `path` is not an existing directory.
    pub fn locate(path: &Path) -> Result<Self, ScanError> {
        let export_dir = path
            .canonicalize()
            .map_err(|_| ScanError::LocationNotFound(path.to_path_buf()))?;
        if !export_dir.is_dir() {
            return Err(ScanError::LocationNotFound(path.to_path_buf()));
        }

        let base_dir = match find_attachments_ancestor(&export_dir) {
            Some(base) => base.to_path_buf(),
            None => {
                tracing::debug!(
                    path = %export_dir.display(),
                    "No {ATTACHMENTS_DIR} folder above export directory"
                );
                export_dir.clone()
            }
        };

        tracing::info!(
            export = %export_dir.display(),
            base = %base_dir.display(),
            "Resolved wiki location"
        );

        Ok(Self {
            export_dir,
            base_dir,
        })
    }

    /// Directory being exported (scan root).
    #[must_use]
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Wiki root used for `/`-relative links.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

fn find_attachments_ancestor(start: &Path) -> Option<&Path> {
    start
        .ancestors()
        .find(|dir| dir.join(ATTACHMENTS_DIR).is_dir())
}
