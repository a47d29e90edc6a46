//! Page anchors and document-wide heading ids.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use wikipdf_scan::WikiLocation;

use crate::slug::slugify;

/// Compute the anchor of the page stored at `path`.
///
/// The path is made relative to the export directory (or, for pages outside
/// the export, to the wiki root), separators are removed, the `.md`
/// extension is dropped and the result is lowercased. Page markers and
/// internal links both go through this function so they always agree.
///
/// ```
/// # use std::path::Path;
/// # use wikipdf_render::page_anchor;
/// # use wikipdf_scan::WikiLocation;
/// # fn demo(location: &WikiLocation) {
/// let page = location.export_dir().join("Guide/Getting-Started.md");
/// assert_eq!(page_anchor(location, &page), "guidegetting-started");
/// # }
/// ```
#[must_use]
pub fn page_anchor(location: &WikiLocation, path: &Path) -> String {
    let path = normalize_path(path);
    let relative = path
        .strip_prefix(location.export_dir())
        .or_else(|_| path.strip_prefix(location.base_dir()))
        .unwrap_or(&path);

    let mut anchor: String = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();

    if anchor.len() >= 3 && anchor.is_char_boundary(anchor.len() - 3) {
        let (stem, ext) = anchor.split_at(anchor.len() - 3);
        if ext.eq_ignore_ascii_case(".md") {
            anchor.truncate(stem.len());
        }
    }
    anchor.to_lowercase()
}

/// Resolve `.` and `..` components without touching the filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component);
                }
            }
            other => result.push(other),
        }
    }
    result
}

/// Ids handed out during one export run.
///
/// Page anchors and heading ids share one namespace: a generated heading id
/// never equals the anchor of a registered page. Create a fresh registry for
/// each run.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    ids: HashSet<String>,
}

impl AnchorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the anchor of a page that is part of the export.
    ///
    /// Register every page before converting the first one, so headings on
    /// early pages cannot take the anchor of a later page.
    pub fn register_page(&mut self, anchor: impl Into<String>) {
        self.ids.insert(anchor.into());
    }

    /// Reserve an author-supplied id so generated ids avoid it.
    pub fn reserve(&mut self, id: &str) {
        self.ids.insert(id.to_owned());
    }

    /// Whether `id` is already taken.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Claim a unique id, appending `-1`, `-2`, ... on collision.
    pub fn claim(&mut self, base: &str) -> String {
        if self.ids.insert(base.to_owned()) {
            return base.to_owned();
        }
        let mut index = 1;
        loop {
            let candidate = format!("{base}-{index}");
            if self.ids.insert(candidate.clone()) {
                return candidate;
            }
            index += 1;
        }
    }

    /// Assign the id of a heading without an explicit one.
    ///
    /// The id is derived from the page's file stem and the heading's plain
    /// text so equal headings on different pages start out distinct.
    pub fn assign_heading_id(&mut self, page_stem: &str, text: &str, ascii_only: bool) -> String {
        let mut base = slugify(&format!("{page_stem}-{text}"), ascii_only);
        if base.is_empty() {
            "section".clone_into(&mut base);
        }
        self.claim(&base)
    }

    /// Number of ids taken so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no id was taken yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
