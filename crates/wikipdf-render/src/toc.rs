//! Tables of contents.
//!
//! The global table of contents is an ordinary markdown page made of a
//! `[TOC]` marker followed by every heading line of the export. It is
//! rendered like any other page, then [`remove_duplicated_headings`] strips
//! the headings so only the generated navigation list remains.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::html::escape_html;
use crate::preprocess::{closes_fence, fence_marker};

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6) after offsetting.
    pub level: u8,
    /// Heading plain text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Marker line the author writes to request a table of contents.
pub const TOC_MARKER: &str = "[TOC]";

// `#` runs followed by text; excludes bare `#` lines and `#123` work item refs.
static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*#+(?: +[^#\s]|[^#\s\d])").expect("valid regex"));

/// Build the markdown lines of the global table of contents.
///
/// Returns an empty list when no page has a heading outside fenced code,
/// otherwise [`TOC_MARKER`] followed by the trimmed heading lines in page
/// order.
#[must_use]
pub fn create_global_toc<S: AsRef<str>>(contents: &[S]) -> Vec<String> {
    let headings: Vec<String> = contents
        .iter()
        .flat_map(|content| heading_lines(content.as_ref()))
        .collect();

    if headings.is_empty() {
        return Vec::new();
    }

    let mut toc = Vec::with_capacity(headings.len() + 1);
    toc.push(TOC_MARKER.to_owned());
    toc.extend(headings);
    toc
}

/// Heading lines of one page outside closed code fences.
///
/// Headings after an opening fence are held back until the fence closes; an
/// unterminated fence hides nothing.
fn heading_lines(content: &str) -> Vec<String> {
    let mut headings = Vec::new();
    let mut open_fence: Option<(&str, Vec<String>)> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some((marker, held)) = &mut open_fence {
            if closes_fence(trimmed, marker) {
                open_fence = None;
            } else if HEADING_LINE.is_match(line) {
                held.push(trimmed.to_owned());
            }
            continue;
        }
        // A ``` info string cannot hold backticks: "```x```" is inline code.
        if let Some(marker) = fence_marker(trimmed)
            && !(marker == "```" && trimmed[marker.len()..].contains('`'))
        {
            open_fence = Some((marker, Vec::new()));
            continue;
        }
        if HEADING_LINE.is_match(line) {
            headings.push(trimmed.to_owned());
        }
    }

    if let Some((_, held)) = open_fence {
        headings.extend(held);
    }
    headings
}

/// Strip rendered heading lines outside `<nav>` from the table of contents
/// page, then trim blank lines at both ends.
#[must_use]
pub fn remove_duplicated_headings(html: &str) -> String {
    let mut nav_depth = 0_usize;
    let mut kept = Vec::new();

    for line in html.lines() {
        let in_nav = nav_depth > 0;
        nav_depth += line.matches("<nav").count();
        nav_depth = nav_depth.saturating_sub(line.matches("</nav>").count());

        if !in_nav && is_heading_line(line) {
            continue;
        }
        kept.push(line);
    }

    let start = kept
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(kept.len());
    let end = kept
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(start, |i| i + 1);
    kept[start..end].join("\n")
}

fn is_heading_line(line: &str) -> bool {
    let line = line.trim();
    let bytes = line.as_bytes();
    bytes.len() >= 9
        && line.starts_with("<h")
        && (b'1'..=b'6').contains(&bytes[2])
        && matches!(bytes[3], b'>' | b' ')
        && line.ends_with('>')
        && line[..line.len() - 1].ends_with(|c: char| c.is_ascii_digit())
        && line[..line.len() - 2].ends_with("</h")
}

/// Render entries as a nested `<nav class="toc">` list.
///
/// Returns an empty string for no entries.
#[must_use]
pub fn render_nav(entries: &[TocEntry]) -> String {
    let Some(base) = entries.iter().map(|e| e.level).min() else {
        return String::new();
    };

    let mut out = String::from("<nav class=\"toc\">\n");
    let mut depth = 0_usize;
    for entry in entries {
        let level = usize::from(entry.level - base) + 1;
        if level > depth {
            while depth < level {
                out.push_str("<ul>\n");
                depth += 1;
                if depth < level {
                    out.push_str("<li>\n");
                }
            }
        } else {
            out.push_str("</li>\n");
            while depth > level {
                out.push_str("</ul>\n</li>\n");
                depth -= 1;
            }
        }
        let _ = writeln!(
            out,
            "<li><a href=\"#{}\">{}</a>",
            escape_html(&entry.id),
            escape_html(&entry.title)
        );
    }
    if depth > 0 {
        out.push_str("</li>\n");
        while depth > 1 {
            out.push_str("</ul>\n</li>\n");
            depth -= 1;
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</nav>\n");
    out
}

/// Point global table of contents entries at the real page headings.
///
/// Entries are matched in order by title; each match consumes the page
/// heading so repeated titles map to successive headings. Unmatched entries
/// keep their own id.
#[must_use]
pub fn link_entries(toc: &[TocEntry], headings: &[TocEntry]) -> Vec<TocEntry> {
    let mut cursor = 0;
    toc.iter()
        .map(|entry| {
            let found = headings[cursor..]
                .iter()
                .position(|h| h.title == entry.title);
            match found {
                Some(offset) => {
                    let heading = &headings[cursor + offset];
                    cursor += offset + 1;
                    TocEntry {
                        id: heading.id.clone(),
                        ..entry.clone()
                    }
                }
                None => entry.clone(),
            }
        })
        .collect()
}
