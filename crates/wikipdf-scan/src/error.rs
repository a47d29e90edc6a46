//! Scan error types.

use std::path::PathBuf;

/// Fatal errors that abort a scan.
///
/// Per-page problems (missing backing file, unreadable page) are logged and
/// never reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The export directory does not exist.
    #[error("Export target not found: {}", .0.display())]
    LocationNotFound(PathBuf),
    /// No page matched the single-file target.
    #[error("{0} not found")]
    TargetNotFound(String),
    /// A directory listing failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
