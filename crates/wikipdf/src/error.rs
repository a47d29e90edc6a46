//! CLI error types.

use wikipdf_config::ConfigError;
use wikipdf_export::ExportError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Export(#[from] ExportError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
