//! Render error types.

/// Errors raised while setting up page conversion.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A front matter filter entry is not of the form `key:value`.
    #[error("Invalid filter entry '{0}', expected key:value")]
    InvalidFilter(String),
}
