//! Wiki tree discovery for wikipdf.
//!
//! Turns an exported wiki directory into the ordered list of [`Page`]s that
//! make up the final document:
//!
//! - [`WikiLocation`] finds the wiki root (the ancestor holding `.attachments`)
//! - [`ExcludeFilter`] drops pages whose wiki-relative path matches a pattern
//! - [`PageScanner`] implementations decide which pages appear and in what order
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use wikipdf_scan::{DirectoryScanner, ExcludeFilter, PageScanner, WikiLocation};
//!
//! let location = WikiLocation::locate(Path::new("wiki"))?;
//! let scanner = DirectoryScanner::new(location.export_dir(), ExcludeFilter::default());
//! for page in scanner.scan()? {
//!     println!("{} {}", page.level, page.wiki_relative_path);
//! }
//! # Ok::<(), wikipdf_scan::ScanError>(())
//! ```

mod error;
mod exclude;
mod location;
mod order;
mod page;
mod scanner;

pub use error::ScanError;
pub use exclude::ExcludeFilter;
pub use location::{ATTACHMENTS_DIR, WikiLocation};
pub use order::{ORDER_FILENAME, OrderFile};
pub use page::Page;
pub use scanner::{DirectoryScanner, OrderFileScanner, PageScanner, SingleFileScanner};
