//! Link and image URL rewriting.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use percent_encoding::percent_decode_str;
use wikipdf_scan::{ATTACHMENTS_DIR, WikiLocation};

use crate::anchor::{normalize_path, page_anchor};

/// Outcome of resolving a link or image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLink {
    /// Link to another page of the export, as `#anchor`.
    Internal(String),
    /// Local file inlined as a `data:` URI.
    Embedded(String),
}

impl ResolvedLink {
    /// The URL to write into the rendered document.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Internal(url) | Self::Embedded(url) => url,
        }
    }
}

/// Rewrites relative URLs so they work once all pages share one document.
#[derive(Debug, Clone)]
pub struct LinkResolver<'a> {
    location: &'a WikiLocation,
    attachments_dir: Option<PathBuf>,
}

impl<'a> LinkResolver<'a> {
    /// Create a resolver for the given wiki.
    #[must_use]
    pub fn new(location: &'a WikiLocation) -> Self {
        Self {
            location,
            attachments_dir: None,
        }
    }

    /// Look up `.attachments` URLs in `dir` instead of the wiki tree.
    #[must_use]
    pub fn with_attachments_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.attachments_dir = Some(dir.into());
        self
    }

    /// Resolve `url` found on a page stored in `page_dir`.
    ///
    /// Returns `None` when the URL should be left as written: external and
    /// `data:` URLs, in-page fragments, and anything that does not point at an
    /// existing file.
    #[must_use]
    pub fn resolve(&self, url: &str, page_dir: &Path) -> Option<ResolvedLink> {
        if is_passthrough(url) {
            return None;
        }
        let candidate = self.candidate_path(url, page_dir)?;

        if let Some(page) = markdown_target(&candidate) {
            let anchor = page_anchor(self.location, &page);
            tracing::debug!(url, anchor = %anchor, "Internal page link");
            return Some(ResolvedLink::Internal(format!("#{anchor}")));
        }

        if candidate.is_file() {
            return match fs::read(&candidate) {
                Ok(bytes) => {
                    tracing::debug!(url, path = %candidate.display(), "Embedding local file");
                    Some(ResolvedLink::Embedded(data_uri(&candidate, &bytes)))
                }
                Err(e) => {
                    tracing::warn!(path = %candidate.display(), error = %e, "Failed to read linked file");
                    None
                }
            };
        }

        tracing::debug!(url, path = %candidate.display(), "Unresolved link");
        None
    }

    /// Absolute filesystem path a relative URL refers to.
    fn candidate_path(&self, url: &str, page_dir: &Path) -> Option<PathBuf> {
        if let Some(attachments) = &self.attachments_dir
            && is_attachments_url(url)
        {
            let name = url.rsplit('/').next().unwrap_or(url);
            let name = percent_decode_str(name).decode_utf8_lossy();
            return Some(normalize_path(&attachments.join(name.as_ref())));
        }

        if url.starts_with('/') {
            let fixed = url
                .replace(':', "%3A")
                .replace('#', "-")
                .replace("%20", " ");
            return Some(normalize_path(
                &self.location.base_dir().join(fixed.trim_start_matches('/')),
            ));
        }

        let without_fragment = url.split('#').next().unwrap_or_default();
        if without_fragment.is_empty() {
            return None;
        }
        Some(normalize_path(&page_dir.join(without_fragment)))
    }
}

fn is_passthrough(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    url.is_empty()
        || url.starts_with('#')
        || url.starts_with("//")
        || lower.starts_with("http:")
        || lower.starts_with("https:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
}

fn is_attachments_url(url: &str) -> bool {
    url.strip_prefix('/')
        .unwrap_or(url)
        .starts_with(ATTACHMENTS_DIR)
}

/// The markdown page a candidate path refers to: the path itself when it is
/// an existing `.md` file, otherwise the path with `.md` appended.
fn markdown_target(candidate: &Path) -> Option<PathBuf> {
    let is_md = candidate
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("md"));
    if is_md && candidate.is_file() {
        return Some(candidate.to_path_buf());
    }

    let mut with_ext = candidate.as_os_str().to_owned();
    with_ext.push(".md");
    let with_ext = PathBuf::from(with_ext);
    with_ext.is_file().then_some(with_ext)
}

fn data_uri(path: &Path, bytes: &[u8]) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
}
