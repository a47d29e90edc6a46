//! Heading depth adjustment for nested pages.

use pulldown_cmark::HeadingLevel;

use crate::html::{heading_level_to_num, num_to_heading_level};

/// Shifts heading depth by the page's nesting level plus one.
///
/// A top-level page's `#` becomes `<h2>`, leaving `<h1>` for the optional
/// page title; a page one folder down starts at `<h3>`. Depth is clamped at
/// `<h6>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingOffset(usize);

impl HeadingOffset {
    /// Offset for a page at `nesting_level`.
    #[must_use]
    pub fn for_level(nesting_level: usize) -> Self {
        Self(nesting_level + 1)
    }

    /// Apply the offset to a parsed heading level.
    #[must_use]
    pub fn apply(self, level: HeadingLevel) -> HeadingLevel {
        num_to_heading_level(usize::from(heading_level_to_num(level)) + self.0)
    }
}
