//! Export error types.

use std::path::PathBuf;

use wikipdf_render::RenderError;
use wikipdf_scan::ScanError;

/// Errors that abort an export run.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Wiki discovery failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// Invalid render settings.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Reading an asset or writing an output file failed.
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// No Chrome or Chromium executable is available.
    #[error("No Chrome or Chromium executable found, set pdf.chrome_path")]
    RendererNotFound,
    /// The PDF renderer exited unsuccessfully.
    #[error("PDF renderer failed ({status}): {stderr}")]
    RendererFailed {
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard error output.
        stderr: String,
    },
    /// The PDF renderer did not finish in time.
    #[error("PDF renderer timed out after {0}s")]
    RendererTimeout(u64),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
