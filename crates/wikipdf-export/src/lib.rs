//! Single document export for wikipdf.
//!
//! Ties the scanner and the page converter together into one run:
//!
//! 1. locate the wiki and scan pages ([`Exporter::scan`])
//! 2. optionally insert the global table of contents page
//! 3. convert pages in order, sharing one anchor registry
//! 4. decorate and concatenate pages, wrap them in a document
//!    ([`build_document`])
//! 5. hand the document to a [`PdfRenderer`] ([`write_pdf`])

mod document;
mod error;
mod exporter;
mod pdf;

pub use document::{DEFAULT_CSS, DocumentOptions, build_document};
pub use error::ExportError;
pub use exporter::{ExportOptions, ExportedDocument, Exporter};
pub use pdf::{
    ChromeRenderer, DEFAULT_TIMEOUT, PdfRenderer, kept_html_path, write_html, write_pdf,
};
