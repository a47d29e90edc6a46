//! Azure DevOps markdown dialect normalization.
//!
//! Runs on the raw page text before parsing. Fenced code and YAML front
//! matter are left untouched by the line-based rewrites.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::toc::TOC_MARKER;

/// HTML comment standing in for a `[TOC]` line until rendering.
pub const TOC_PLACEHOLDER: &str = "<!-- wikipdf:toc -->";

const AZURE_TOC: &str = "[[_TOC_]]";

static IMAGE_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([^()\s]+) =(\d+)?x(\d+)?\)").expect("valid regex")
});

/// Requested rendering size of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: Option<u32>,
    /// Height in pixels.
    pub height: Option<u32>,
}

/// Normalized markdown plus data pulled out of it.
#[derive(Debug, Default)]
pub struct Preprocessed {
    /// Markdown ready for parsing.
    pub markdown: String,
    /// Image sizes keyed by image URL as written.
    pub image_sizes: HashMap<String, ImageSize>,
}

/// Normalize one page.
///
/// With `global_toc` set, `[[_TOC_]]` markers are dropped since the export
/// has a table of contents page of its own.
#[must_use]
pub fn preprocess(markdown: &str, global_toc: bool) -> Preprocessed {
    let markdown = markdown.replace(AZURE_TOC, if global_toc { "" } else { TOC_MARKER });

    let mut image_sizes = HashMap::new();
    let markdown = IMAGE_SIZE.replace_all(&markdown, |caps: &Captures<'_>| {
        let url = &caps[1];
        let size = ImageSize {
            width: caps.get(2).and_then(|m| m.as_str().parse().ok()),
            height: caps.get(3).and_then(|m| m.as_str().parse().ok()),
        };
        if size == ImageSize::default() {
            return caps[0].to_owned();
        }
        image_sizes.insert(url.to_owned(), size);
        format!("({url})")
    });

    Preprocessed {
        markdown: rewrite_lines(&markdown),
        image_sizes,
    }
}

/// Line-based rewrites outside code and front matter.
fn rewrite_lines(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + 32);
    let mut fence: Option<&str> = None;
    let mut in_front_matter = false;
    let mut in_mermaid = false;

    for (index, line) in markdown.lines().enumerate() {
        let trimmed = line.trim();

        if index == 0 && trimmed == "---" {
            in_front_matter = true;
            push_line(&mut out, line);
            continue;
        }
        if in_front_matter {
            if trimmed == "---" || trimmed == "..." {
                in_front_matter = false;
            }
            push_line(&mut out, line);
            continue;
        }

        if let Some(marker) = fence {
            if closes_fence(trimmed, marker) {
                fence = None;
            }
            push_line(&mut out, line);
            continue;
        }
        if let Some(marker) = fence_marker(trimmed) {
            fence = Some(marker);
            push_line(&mut out, line);
            continue;
        }

        if is_mermaid_open(trimmed) {
            in_mermaid = true;
            push_line(&mut out, "```mermaid");
            continue;
        }
        if in_mermaid {
            if trimmed == ":::" {
                in_mermaid = false;
                push_line(&mut out, "```");
            } else {
                push_line(&mut out, line);
            }
            continue;
        }

        if trimmed == TOC_MARKER {
            push_line(&mut out, "");
            push_line(&mut out, TOC_PLACEHOLDER);
            push_line(&mut out, "");
            continue;
        }

        push_line(&mut out, &fix_heading_space(line));
    }

    if in_mermaid {
        push_line(&mut out, "```");
    }
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Fence marker opening a code block on this (trimmed) line.
pub(crate) fn fence_marker(trimmed: &str) -> Option<&'static str> {
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

pub(crate) fn closes_fence(trimmed: &str, marker: &str) -> bool {
    trimmed.starts_with(marker) && trimmed.trim_start_matches(marker).trim().is_empty()
}

fn is_mermaid_open(trimmed: &str) -> bool {
    trimmed
        .strip_prefix(":::")
        .is_some_and(|rest| rest.trim().eq_ignore_ascii_case("mermaid"))
}

/// Insert the missing space in `#Heading`. Work item references such as
/// `#123` and lines of only `#` are left alone.
fn fix_heading_space(line: &str) -> String {
    let hashes = line.len() - line.trim_start_matches('#').len();
    if hashes == 0 {
        return line.to_owned();
    }
    let rest = &line[hashes..];
    match rest.chars().next() {
        Some(c) if !c.is_whitespace() && !c.is_ascii_digit() => {
            format!("{} {rest}", &line[..hashes])
        }
        _ => line.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_azure_toc_marker() {
        let result = preprocess("[[_TOC_]]\n# Title\n", false);

        assert_eq!(
            result.markdown,
            format!("\n{TOC_PLACEHOLDER}\n\n# Title\n")
        );
    }

    #[test]
    fn test_azure_toc_removed_with_global_toc() {
        let result = preprocess("[[_TOC_]]\n# Title\n", true);

        assert_eq!(result.markdown, "\n# Title\n");
    }

    #[test]
    fn test_image_sizes_extracted() {
        let result = preprocess(
            "![a](img/a.png =600x400) ![b](b.jpg =300x) ![c](c.png =x20)",
            false,
        );

        assert_eq!(result.markdown, "![a](img/a.png) ![b](b.jpg) ![c](c.png)\n");
        assert_eq!(
            result.image_sizes["img/a.png"],
            ImageSize {
                width: Some(600),
                height: Some(400)
            }
        );
        assert_eq!(result.image_sizes["b.jpg"].height, None);
        assert_eq!(result.image_sizes["c.png"].height, Some(20));
    }

    #[test]
    fn test_image_without_numbers_untouched() {
        let result = preprocess("![a](a.png =x)", false);

        assert_eq!(result.markdown, "![a](a.png =x)\n");
        assert!(result.image_sizes.is_empty());
    }

    #[test]
    fn test_heading_space_fixed() {
        let result = preprocess("#Title\n##Sub\n#123\n# Fine\n#\n", false);

        assert_eq!(result.markdown, "# Title\n## Sub\n#123\n# Fine\n#\n");
    }

    #[test]
    fn test_code_and_front_matter_untouched() {
        let source = "---\n#comment: x\n---\n```\n#include <x>\n[TOC]\n```\n#Real\n";

        let result = preprocess(source, false);

        assert_eq!(
            result.markdown,
            "---\n#comment: x\n---\n```\n#include <x>\n[TOC]\n```\n# Real\n"
        );
    }

    #[test]
    fn test_mermaid_container() {
        let result = preprocess("::: mermaid\ngraph TD\nA-->B\n:::\nafter\n", false);

        assert_eq!(result.markdown, "```mermaid\ngraph TD\nA-->B\n```\nafter\n");
    }

    #[test]
    fn test_unclosed_mermaid_container() {
        let result = preprocess(":::mermaid\ngraph TD\n", false);

        assert_eq!(result.markdown, "```mermaid\ngraph TD\n```\n");
    }

    #[test]
    fn test_fix_heading_space_multibyte() {
        assert_eq!(fix_heading_space("#Über"), "# Über");
    }
}
