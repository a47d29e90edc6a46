//! Per-page markdown conversion.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use pulldown_cmark::{
    BrokenLink, BrokenLinkCallback, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser,
    Tag, TagEnd, html,
};
use wikipdf_scan::{Page, WikiLocation};

use crate::anchor::{AnchorRegistry, page_anchor};
use crate::html::{escape_html, heading_level_to_num};
use crate::links::LinkResolver;
use crate::offset::HeadingOffset;
use crate::preprocess::{ImageSize, TOC_PLACEHOLDER, preprocess};
use crate::toc::{TocEntry, render_nav};

/// Conversion settings shared by all pages of an export.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct ConvertOptions {
    /// Restrict generated heading ids to ASCII.
    pub ascii_only_ids: bool,
    /// Resolve `[Heading Text]` references to headings of the same page.
    pub auto_link_headings: bool,
    /// Render `mermaid` code blocks as `<div class="mermaid">`.
    pub convert_mermaid: bool,
    /// The export has a global table of contents page; drop `[[_TOC_]]`.
    pub global_toc: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            ascii_only_ids: true,
            auto_link_headings: true,
            convert_mermaid: false,
            global_toc: false,
        }
    }
}

/// Role of a page in the export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageKind {
    /// Regular wiki page.
    #[default]
    Content,
    /// Synthetic global table of contents page. Its `[TOC]` marker is left
    /// as [`TOC_PLACEHOLDER`] until all other pages are converted.
    GlobalToc,
}

/// HTML of one converted page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Anchor id other pages link to.
    pub anchor: String,
    /// Rendered HTML fragment.
    pub html: String,
    /// Headings in document order, with offset levels and final ids.
    pub headings: Vec<TocEntry>,
}

/// Converts wiki pages to HTML fragments that can be concatenated.
pub struct PageConverter<'a> {
    location: &'a WikiLocation,
    links: LinkResolver<'a>,
    options: ConvertOptions,
}

impl<'a> PageConverter<'a> {
    /// Create a converter with default options.
    #[must_use]
    pub fn new(location: &'a WikiLocation) -> Self {
        Self {
            location,
            links: LinkResolver::new(location),
            options: ConvertOptions::default(),
        }
    }

    /// Resolve `.attachments` URLs against `dir`.
    #[must_use]
    pub fn with_attachments_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.links = self.links.with_attachments_dir(dir);
        self
    }

    /// Replace the conversion options.
    #[must_use]
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// Parser options used for every page.
    #[must_use]
    pub fn parser_options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
    }

    /// Convert one page.
    ///
    /// Heading ids are claimed from `registry`, so pages must be converted in
    /// document order.
    pub fn convert(
        &self,
        page: &Page,
        kind: PageKind,
        registry: &mut AnchorRegistry,
    ) -> RenderedPage {
        let anchor = page_anchor(self.location, &page.absolute_path);
        registry.register_page(anchor.as_str());
        let source = preprocess(&page.content, self.options.global_toc);
        let offset = HeadingOffset::for_level(page.level);

        // Ids first: references to any heading of the page must resolve,
        // including headings further down.
        let mut headings = Vec::new();
        let mut references = HashMap::new();
        for heading in collect_headings(&source.markdown) {
            let id = if let Some(id) = heading.explicit_id {
                registry.reserve(&id);
                id
            } else {
                registry.assign_heading_id(page.stem(), &heading.text, self.options.ascii_only_ids)
            };
            if self.options.auto_link_headings {
                for label in [&heading.text, &heading.source] {
                    let key = label_key(label);
                    if !key.is_empty() {
                        references.entry(key).or_insert_with(|| id.clone());
                    }
                }
            }
            headings.push(TocEntry {
                level: heading_level_to_num(offset.apply(heading.level)),
                title: heading.text,
                id,
            });
        }

        let page_dir = page
            .absolute_path
            .parent()
            .unwrap_or_else(|| self.location.export_dir());
        let parser = Parser::new_with_broken_link_callback(
            &source.markdown,
            Self::parser_options(),
            Some(HeadingReferences { ids: &references }),
        );
        let mut rewriter = EventRewriter {
            links: &self.links,
            convert_mermaid: self.options.convert_mermaid,
            page_dir,
            offset,
            kind,
            headings: &headings,
            next_heading: 0,
            image_sizes: &source.image_sizes,
            pending_image: None,
            mermaid: None,
        };
        let events = rewriter.rewrite(parser);

        let mut output = String::with_capacity(source.markdown.len() * 3 / 2);
        html::push_html(&mut output, events.into_iter());

        tracing::debug!(
            page = %page.wiki_relative_path,
            anchor = %anchor,
            headings = headings.len(),
            "Converted page"
        );

        RenderedPage {
            anchor,
            html: output,
            headings,
        }
    }
}

/// A heading found in the first pass.
struct CollectedHeading {
    level: HeadingLevel,
    explicit_id: Option<String>,
    /// Inline content as plain text, links reduced to their text.
    text: String,
    /// Heading text as written in the source.
    source: String,
}

fn collect_headings(markdown: &str) -> Vec<CollectedHeading> {
    let mut headings = Vec::new();
    let mut current: Option<CollectedHeading> = None;

    let parser = Parser::new_ext(markdown, PageConverter::parser_options());
    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some(CollectedHeading {
                    level,
                    explicit_id: id.map(CowStr::into_string),
                    text: String::new(),
                    source: heading_source(&markdown[range]),
                });
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut heading) = current.take() {
                    heading.text = heading.text.trim().to_owned();
                    headings.push(heading);
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push(' ');
                }
            }
            _ => {}
        }
    }
    headings
}

/// Inline source of a heading block: ATX markers and `{#id}` attributes
/// removed, setext underline dropped.
fn heading_source(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with('#') {
        let line = raw.lines().next().unwrap_or_default();
        let mut text = line.trim_start_matches('#').trim();
        if text.ends_with('}')
            && let Some(start) = text.rfind('{')
        {
            text = text[..start].trim_end();
        }
        return text.trim_end_matches('#').trim_end().to_owned();
    }

    let mut lines: Vec<_> = raw.lines().map(str::trim).collect();
    lines.pop();
    lines.join(" ")
}

/// Reference label normalization: case-folded, whitespace collapsed.
fn label_key(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolves otherwise undefined `[Heading Text]` references.
struct HeadingReferences<'r> {
    ids: &'r HashMap<String, String>,
}

impl<'input> BrokenLinkCallback<'input> for HeadingReferences<'_> {
    fn handle_broken_link(
        &mut self,
        link: BrokenLink<'input>,
    ) -> Option<(CowStr<'input>, CowStr<'input>)> {
        let id = self.ids.get(&label_key(&link.reference))?;
        Some((CowStr::from(format!("#{id}")), CowStr::Borrowed("")))
    }
}

/// Image whose `<img>` tag is written by hand to carry size attributes.
struct PendingImage {
    src: String,
    title: String,
    alt: String,
    size: ImageSize,
    depth: usize,
}

impl PendingImage {
    fn to_html(&self) -> String {
        let mut html = format!(
            "<img src=\"{}\" alt=\"{}\"",
            escape_html(&self.src),
            escape_html(&self.alt)
        );
        if !self.title.is_empty() {
            let _ = write!(html, " title=\"{}\"", escape_html(&self.title));
        }
        if let Some(width) = self.size.width {
            let _ = write!(html, " width=\"{width}\"");
        }
        if let Some(height) = self.size.height {
            let _ = write!(html, " height=\"{height}\"");
        }
        html.push_str(" />");
        html
    }
}

/// Second pass: rewrites parser events before HTML rendering.
struct EventRewriter<'c, 'a> {
    links: &'c LinkResolver<'a>,
    convert_mermaid: bool,
    page_dir: &'c Path,
    offset: HeadingOffset,
    kind: PageKind,
    headings: &'c [TocEntry],
    next_heading: usize,
    image_sizes: &'c HashMap<String, ImageSize>,
    pending_image: Option<PendingImage>,
    mermaid: Option<String>,
}

impl EventRewriter<'_, '_> {
    fn rewrite<'e>(&mut self, events: impl Iterator<Item = Event<'e>>) -> Vec<Event<'e>> {
        let mut out = Vec::new();
        for event in events {
            self.process(event, &mut out);
        }
        out
    }

    fn process<'e>(&mut self, event: Event<'e>, out: &mut Vec<Event<'e>>) {
        if let Some(code) = self.mermaid.as_mut() {
            match event {
                Event::Text(text) => code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(code) = self.mermaid.take() {
                        let html = format!("<div class=\"mermaid\">\n{}</div>\n", escape_html(&code));
                        out.push(Event::Html(html.into()));
                    }
                }
                _ => {}
            }
            return;
        }

        if let Some(image) = self.pending_image.as_mut() {
            match event {
                Event::Start(Tag::Image { .. }) => image.depth += 1,
                Event::End(TagEnd::Image) if image.depth > 0 => image.depth -= 1,
                Event::End(TagEnd::Image) => {
                    if let Some(image) = self.pending_image.take() {
                        out.push(Event::InlineHtml(image.to_html().into()));
                    }
                }
                Event::Text(text) | Event::Code(text) => image.alt.push_str(&text),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(Tag::Heading {
                level,
                classes,
                attrs,
                ..
            }) => {
                let id = self
                    .headings
                    .get(self.next_heading)
                    .map(|h| CowStr::from(h.id.clone()));
                self.next_heading += 1;
                out.push(Event::Start(Tag::Heading {
                    level: self.offset.apply(level),
                    id,
                    classes,
                    attrs,
                }));
            }
            Event::End(TagEnd::Heading(level)) => {
                out.push(Event::End(TagEnd::Heading(self.offset.apply(level))));
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dest_url = self.resolve(dest_url);
                out.push(Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }));
            }
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let size = self.image_sizes.get(dest_url.as_ref()).copied();
                let dest_url = self.resolve(dest_url);
                if let Some(size) = size {
                    self.pending_image = Some(PendingImage {
                        src: dest_url.into_string(),
                        title: title.into_string(),
                        alt: String::new(),
                        size,
                        depth: 0,
                    });
                } else {
                    out.push(Event::Start(Tag::Image {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                }
            }
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))
                if self.convert_mermaid && is_mermaid(&info) =>
            {
                self.mermaid = Some(String::new());
            }
            Event::Html(html) if html.trim() == TOC_PLACEHOLDER => {
                out.push(Event::Html(self.toc_html().into()));
            }
            other => out.push(other),
        }
    }

    fn resolve<'e>(&self, url: CowStr<'e>) -> CowStr<'e> {
        match self.links.resolve(&url, self.page_dir) {
            Some(resolved) => CowStr::from(resolved.url().to_owned()),
            None => url,
        }
    }

    fn toc_html(&self) -> String {
        match self.kind {
            PageKind::GlobalToc => format!("{TOC_PLACEHOLDER}\n"),
            PageKind::Content => render_nav(self.headings),
        }
    }
}

fn is_mermaid(info: &str) -> bool {
    info.split_whitespace()
        .next()
        .is_some_and(|lang| lang.eq_ignore_ascii_case("mermaid"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    struct Wiki {
        _dir: tempfile::TempDir,
        location: WikiLocation,
    }

    impl Wiki {
        fn new(files: &[(&str, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir(dir.path().join(".attachments")).unwrap();
            for (path, content) in files {
                let path = dir.path().join(path);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, content).unwrap();
            }
            let location = WikiLocation::locate(dir.path()).unwrap();
            Self { _dir: dir, location }
        }

        fn page(&self, path: &str, level: usize) -> Page {
            Page::load(
                self.location.export_dir().join(path),
                self.location.export_dir(),
                level,
            )
        }
    }

    fn convert(wiki: &Wiki, page: &Page, registry: &mut AnchorRegistry) -> RenderedPage {
        PageConverter::new(&wiki.location).convert(page, PageKind::Content, registry)
    }

    #[test]
    fn test_heading_offset_and_id() {
        let wiki = Wiki::new(&[("Setup.md", "# Getting Started\n\ntext\n")]);
        let mut registry = AnchorRegistry::new();

        let rendered = convert(&wiki, &wiki.page("Setup.md", 0), &mut registry);

        assert_eq!(
            rendered.html,
            "<h2 id=\"setup-getting-started\">Getting Started</h2>\n<p>text</p>\n"
        );
        assert_eq!(rendered.anchor, "setup");
        assert_eq!(
            rendered.headings,
            vec![TocEntry {
                level: 2,
                title: "Getting Started".to_owned(),
                id: "setup-getting-started".to_owned(),
            }]
        );
    }

    #[test]
    fn test_nested_page_heading_depth() {
        let wiki = Wiki::new(&[("A/B/Deep.md", "# Title\n## Sub\n")]);
        let mut registry = AnchorRegistry::new();

        let rendered = convert(&wiki, &wiki.page("A/B/Deep.md", 2), &mut registry);

        assert!(rendered.html.contains("<h4 id=\"deep-title\">"));
        assert!(rendered.html.contains("<h5 id=\"deep-sub\">"));
    }

    #[test]
    fn test_same_heading_on_two_pages() {
        let wiki = Wiki::new(&[("a/Notes.md", "# Intro\n"), ("b/Notes.md", "# Intro\n")]);
        let mut registry = AnchorRegistry::new();

        let first = convert(&wiki, &wiki.page("a/Notes.md", 1), &mut registry);
        let second = convert(&wiki, &wiki.page("b/Notes.md", 1), &mut registry);

        assert_eq!(first.headings[0].id, "notes-intro");
        assert_eq!(second.headings[0].id, "notes-intro-1");
        assert_ne!(first.anchor, second.anchor);
    }

    #[test]
    fn test_explicit_id_untouched() {
        let wiki = Wiki::new(&[("Page.md", "# Title {#custom}\n# Other\n")]);
        let mut registry = AnchorRegistry::new();

        let rendered = convert(&wiki, &wiki.page("Page.md", 0), &mut registry);

        assert!(rendered.html.contains("<h2 id=\"custom\">Title</h2>"));
        assert!(rendered.html.contains("<h2 id=\"page-other\">Other</h2>"));
    }

    #[test]
    fn test_heading_text_strips_links() {
        let wiki = Wiki::new(&[("Page.md", "# See [the docs](https://x.y) `now`\n")]);
        let mut registry = AnchorRegistry::new();

        let rendered = convert(&wiki, &wiki.page("Page.md", 0), &mut registry);

        assert_eq!(rendered.headings[0].id, "page-see-the-docs-now");
        assert_eq!(rendered.headings[0].title, "See the docs now");
    }

    #[test]
    fn test_internal_link_rewritten() {
        let wiki = Wiki::new(&[
            ("Home.md", "See [setup](Guide/Setup.md#install).\n"),
            ("Guide/Setup.md", "# Setup\n"),
        ]);
        let mut registry = AnchorRegistry::new();

        let home = convert(&wiki, &wiki.page("Home.md", 0), &mut registry);
        let setup = convert(&wiki, &wiki.page("Guide/Setup.md", 1), &mut registry);

        assert_eq!(
            home.html,
            format!("<p>See <a href=\"#{}\">setup</a>.</p>\n", setup.anchor)
        );
    }

    #[test]
    fn test_heading_reference_resolved_within_page() {
        let wiki = Wiki::new(&[("Page.md", "See [Deep Dive].\n\n# Deep Dive\n")]);
        let mut registry = AnchorRegistry::new();

        let rendered = convert(&wiki, &wiki.page("Page.md", 0), &mut registry);

        assert!(rendered.html.contains("<a href=\"#page-deep-dive\">Deep Dive</a>"));
    }

    #[test]
    fn test_explicit_reference_wins_over_heading() {
        let wiki = Wiki::new(&[(
            "Page.md",
            "See [Deep Dive].\n\n# Deep Dive\n\n[Deep Dive]: https://example.com\n",
        )]);
        let mut registry = AnchorRegistry::new();

        let rendered = convert(&wiki, &wiki.page("Page.md", 0), &mut registry);

        assert!(rendered.html.contains("<a href=\"https://example.com\">Deep Dive</a>"));
    }

    #[test]
    fn test_heading_reference_disabled() {
        let wiki = Wiki::new(&[("Page.md", "See [Deep Dive].\n\n# Deep Dive\n")]);
        let mut registry = AnchorRegistry::new();
        let converter = PageConverter::new(&wiki.location).with_options(ConvertOptions {
            auto_link_headings: false,
            ..ConvertOptions::default()
        });

        let rendered = converter.convert(&wiki.page("Page.md", 0), PageKind::Content, &mut registry);

        assert!(rendered.html.contains("<p>See [Deep Dive].</p>"));
    }

    #[test]
    fn test_image_embedded_with_size() {
        let wiki = Wiki::new(&[
            ("Page.md", "![Logo](/.attachments/logo.png =40x20)\n"),
            (".attachments/logo.png", "abc"),
        ]);
        let mut registry = AnchorRegistry::new();

        let rendered = convert(&wiki, &wiki.page("Page.md", 0), &mut registry);

        assert_eq!(
            rendered.html,
            "<p><img src=\"data:image/png;base64,YWJj\" alt=\"Logo\" width=\"40\" height=\"20\" /></p>\n"
        );
    }

    #[test]
    fn test_missing_image_left_alone() {
        let wiki = Wiki::new(&[("Page.md", "![x](missing.png)\n")]);
        let mut registry = AnchorRegistry::new();

        let rendered = convert(&wiki, &wiki.page("Page.md", 0), &mut registry);

        assert_eq!(rendered.html, "<p><img src=\"missing.png\" alt=\"x\" /></p>\n");
    }

    #[test]
    fn test_page_toc() {
        let wiki = Wiki::new(&[("Page.md", "[[_TOC_]]\n# A\n## B\n")]);
        let mut registry = AnchorRegistry::new();

        let rendered = convert(&wiki, &wiki.page("Page.md", 0), &mut registry);

        assert!(rendered.html.starts_with("<nav class=\"toc\">\n<ul>\n<li><a href=\"#page-a\">A</a>"));
    }

    #[test]
    fn test_global_toc_page_keeps_placeholder() {
        let wiki = Wiki::new(&[]);
        let page = Page::with_content(
            wiki.location.export_dir().join("Contents.md"),
            wiki.location.export_dir(),
            0,
            "[TOC]\n# A".to_owned(),
        );
        let mut registry = AnchorRegistry::new();

        let rendered = PageConverter::new(&wiki.location).convert(
            &page,
            PageKind::GlobalToc,
            &mut registry,
        );

        assert_eq!(
            rendered.html,
            format!("{TOC_PLACEHOLDER}\n<h2 id=\"contents-a\">A</h2>\n")
        );
    }

    #[test]
    fn test_mermaid_block() {
        let wiki = Wiki::new(&[("Page.md", "::: mermaid\ngraph TD\nA-->B\n:::\n")]);
        let mut registry = AnchorRegistry::new();
        let converter = PageConverter::new(&wiki.location).with_options(ConvertOptions {
            convert_mermaid: true,
            ..ConvertOptions::default()
        });

        let rendered = converter.convert(&wiki.page("Page.md", 0), PageKind::Content, &mut registry);

        assert_eq!(
            rendered.html,
            "<div class=\"mermaid\">\ngraph TD\nA--&gt;B\n</div>\n"
        );
    }

    #[test]
    fn test_front_matter_not_rendered() {
        let wiki = Wiki::new(&[("Page.md", "---\ntags: [a]\n---\n# Title\n")]);
        let mut registry = AnchorRegistry::new();

        let rendered = convert(&wiki, &wiki.page("Page.md", 0), &mut registry);

        assert_eq!(rendered.html, "<h2 id=\"page-title\">Title</h2>\n");
    }

    #[test]
    fn test_heading_source() {
        assert_eq!(heading_source("## Deep **Dive** ##\n"), "Deep **Dive**");
        assert_eq!(heading_source("# Title {#custom}"), "Title");
        assert_eq!(heading_source("Setext\n======\n"), "Setext");
    }
}
