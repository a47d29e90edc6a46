//! Markdown to HTML conversion for flattened wiki exports.
//!
//! Each page is converted independently, but all pages share one
//! [`AnchorRegistry`] so that heading ids stay unique across the final
//! document. Conversion is a fixed pipeline:
//!
//! 1. [`preprocess`] normalizes Azure DevOps markdown dialect
//! 2. headings are collected and assigned ids ([`anchor`])
//! 3. events are rewritten: heading depth ([`HeadingOffset`]), links
//!    ([`LinkResolver`]), images, mermaid blocks, `[TOC]` markers
//! 4. `pulldown-cmark` renders the HTML
//!
//! The synthetic global table of contents is built by [`toc`].

pub mod anchor;
mod converter;
mod error;
pub mod frontmatter;
mod html;
mod links;
mod offset;
pub mod preprocess;
mod slug;
pub mod toc;

pub use anchor::{AnchorRegistry, page_anchor};
pub use converter::{ConvertOptions, PageConverter, PageKind, RenderedPage};
pub use error::RenderError;
pub use frontmatter::TagFilter;
pub use html::escape_html;
pub use links::{LinkResolver, ResolvedLink};
pub use offset::HeadingOffset;
pub use slug::slugify;
pub use toc::TocEntry;
