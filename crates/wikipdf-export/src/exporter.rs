//! Export run orchestration.

use std::path::PathBuf;
use std::time::Instant;

use percent_encoding::percent_decode_str;
use wikipdf_render::preprocess::TOC_PLACEHOLDER;
use wikipdf_render::toc::{create_global_toc, link_entries, remove_duplicated_headings, render_nav};
use wikipdf_render::{
    AnchorRegistry, ConvertOptions, PageConverter, PageKind, TagFilter, TocEntry, escape_html,
    page_anchor,
};
use wikipdf_scan::{
    DirectoryScanner, ExcludeFilter, OrderFileScanner, Page, PageScanner, SingleFileScanner,
    WikiLocation,
};

use crate::ExportError;
use crate::document::{DocumentOptions, build_document};

/// What to export and how pages are decorated.
#[derive(Clone, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExportOptions {
    /// Directory to export.
    pub path: PathBuf,
    /// Directory `.attachments` URLs resolve against instead of the wiki.
    pub attachments_path: Option<PathBuf>,
    /// Case-insensitive patterns matched against wiki-relative page paths.
    pub exclude_paths: Vec<String>,
    /// Export one page (path substring) or one `.md` file with its subpages.
    pub single: Option<String>,
    /// Export pages missing from `.order` files too.
    pub include_unlisted_pages: bool,
    /// Title of the generated table of contents page.
    pub global_toc: Option<String>,
    /// Index of the table of contents page among the exported pages.
    pub global_toc_position: usize,
    /// Prepend a title derived from the file name to each page.
    pub heading: bool,
    /// Prepend the page's relative path to each page.
    pub path_to_heading: bool,
    /// Start each page on a new sheet.
    pub break_page: bool,
    /// Front matter `key:value` filter.
    pub filter: Option<String>,
    /// Restrict generated heading ids to ASCII.
    pub ascii_only_ids: bool,
    /// Resolve `[Heading Text]` references within a page.
    pub auto_link_headings: bool,
    /// Render `mermaid` code blocks as diagrams.
    pub convert_mermaid: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            attachments_path: None,
            exclude_paths: Vec::new(),
            single: None,
            include_unlisted_pages: false,
            global_toc: None,
            global_toc_position: 0,
            heading: false,
            path_to_heading: false,
            break_page: false,
            filter: None,
            ascii_only_ids: true,
            auto_link_headings: true,
            convert_mermaid: false,
        }
    }
}

/// Result of an export run.
#[derive(Clone, Debug)]
pub struct ExportedDocument {
    /// Complete HTML document.
    pub html: String,
    /// Number of pages in the document, table of contents included.
    pub pages: usize,
    /// Number of pages skipped as empty or filtered out.
    pub skipped: usize,
}

/// A converted page waiting for decoration.
struct Converted<'p> {
    page: &'p Page,
    kind: PageKind,
    anchor: String,
    html: String,
    headings: Vec<TocEntry>,
}

/// Assembles the pages of a wiki into one HTML document.
///
/// # Example
///
/// ```no_run
/// use wikipdf_export::{ExportOptions, Exporter};
///
/// let exporter = Exporter::new(ExportOptions {
///     path: "wiki".into(),
///     global_toc: Some("Contents".to_owned()),
///     ..ExportOptions::default()
/// });
/// let document = exporter.export()?;
/// println!("{} pages", document.pages);
/// # Ok::<(), wikipdf_export::ExportError>(())
/// ```
pub struct Exporter {
    options: ExportOptions,
    document: DocumentOptions,
}

impl Exporter {
    /// Create an exporter with default document options.
    #[must_use]
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            document: DocumentOptions::default(),
        }
    }

    /// Set stylesheet and script options of the final document.
    #[must_use]
    pub fn with_document_options(mut self, document: DocumentOptions) -> Self {
        self.document = document;
        self
    }

    /// Export options in use.
    #[must_use]
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Find the wiki root for the export path.
    pub fn locate(&self) -> Result<WikiLocation, ExportError> {
        let location = WikiLocation::locate(&self.options.path)?;
        tracing::debug!(
            export_dir = %location.export_dir().display(),
            base_dir = %location.base_dir().display(),
            "Located wiki"
        );
        Ok(location)
    }

    /// List the pages to export, in document order.
    pub fn scan(&self, location: &WikiLocation) -> Result<Vec<Page>, ExportError> {
        let pages = self.scanner(location).scan()?;
        tracing::info!(count = pages.len(), "Found pages to process");
        Ok(pages)
    }

    fn scanner(&self, location: &WikiLocation) -> Box<dyn PageScanner> {
        let exclude = ExcludeFilter::new(&self.options.exclude_paths);
        let root = location.export_dir();
        if let Some(single) = &self.options.single {
            Box::new(SingleFileScanner::new(root, single.clone(), exclude))
        } else if self.options.include_unlisted_pages {
            Box::new(DirectoryScanner::new(root, exclude))
        } else {
            Box::new(OrderFileScanner::new(root, exclude))
        }
    }

    /// Run the export and build the HTML document.
    pub fn export(&self) -> Result<ExportedDocument, ExportError> {
        let started = Instant::now();
        let filter = self
            .options
            .filter
            .as_deref()
            .map(TagFilter::parse)
            .transpose()?;
        let location = self.locate()?;
        let mut pages = self.scan(&location)?;
        let toc_index = self.insert_global_toc(&location, &mut pages);

        let mut registry = AnchorRegistry::new();
        for page in &pages {
            registry.register_page(page_anchor(&location, &page.absolute_path));
        }

        let converter = self.converter(&location);
        let mut converted = Vec::with_capacity(pages.len());
        let mut skipped = 0;
        for (index, page) in pages.iter().enumerate() {
            let kind = if toc_index == Some(index) {
                PageKind::GlobalToc
            } else {
                PageKind::Content
            };

            if page.content.trim().is_empty() {
                tracing::warn!(
                    page = %page.absolute_path.display(),
                    "Page is empty and will be skipped"
                );
                skipped += 1;
                continue;
            }
            if kind == PageKind::Content
                && let Some(filter) = &filter
                && !filter.matches(&page.content)
            {
                tracing::info!(page = %page.wiki_relative_path, "Page does not match filter, skipped");
                skipped += 1;
                continue;
            }

            let rendered = converter.convert(page, kind, &mut registry);
            converted.push(Converted {
                page,
                kind,
                anchor: rendered.anchor,
                html: rendered.html,
                headings: rendered.headings,
            });
        }

        let content_headings: Vec<TocEntry> = converted
            .iter()
            .filter(|c| c.kind == PageKind::Content)
            .flat_map(|c| c.headings.iter().cloned())
            .collect();

        let count = converted.len();
        let mut body = String::new();
        for (position, mut page) in converted.into_iter().enumerate() {
            if page.kind == PageKind::GlobalToc {
                let nav = render_nav(&link_entries(&page.headings, &content_headings));
                page.html = remove_duplicated_headings(&page.html.replace(TOC_PLACEHOLDER, &nav));
                tracing::debug!("Removed duplicated headings from table of contents");
            }
            body.push_str(&self.decorate(&location, &page, position + 1 == count));
        }

        let html = build_document(&body, &self.document)?;
        tracing::info!(
            pages = count,
            skipped,
            elapsed_ms = started.elapsed().as_millis(),
            "Export done"
        );
        Ok(ExportedDocument {
            html,
            pages: count,
            skipped,
        })
    }

    fn converter<'a>(&self, location: &'a WikiLocation) -> PageConverter<'a> {
        let converter = PageConverter::new(location).with_options(ConvertOptions {
            ascii_only_ids: self.options.ascii_only_ids,
            auto_link_headings: self.options.auto_link_headings,
            convert_mermaid: self.options.convert_mermaid,
            global_toc: self.options.global_toc.is_some(),
        });
        match &self.options.attachments_path {
            Some(dir) => converter.with_attachments_dir(dir),
            None => converter,
        }
    }

    /// Insert the table of contents page, returning its index.
    ///
    /// Nothing is inserted when no page has a heading.
    fn insert_global_toc(&self, location: &WikiLocation, pages: &mut Vec<Page>) -> Option<usize> {
        let name = self.options.global_toc.as_deref()?;
        let contents: Vec<&str> = pages.iter().map(|p| p.content.as_str()).collect();
        let toc = create_global_toc(&contents);
        if toc.is_empty() {
            tracing::info!("No headings found, table of contents skipped");
            return None;
        }

        let position = self.options.global_toc_position.min(pages.len());
        let dir = pages
            .get(position)
            .or_else(|| pages.last())
            .and_then(|p| p.absolute_path.parent())
            .unwrap_or_else(|| location.export_dir())
            .to_path_buf();
        let page = Page::with_content(
            dir.join(format!("{name}.md")),
            location.export_dir(),
            0,
            toc.join("\n"),
        );
        tracing::info!(position, entries = toc.len() - 1, "Inserted table of contents");
        pages.insert(position, page);
        Some(position)
    }

    /// Prefix page markers and wrap the page as configured.
    fn decorate(&self, location: &WikiLocation, converted: &Converted<'_>, last: bool) -> String {
        let page = converted.page;
        let mut html = format!(
            "<a id=\"{}\">&nbsp;</a>{}",
            escape_html(&converted.anchor),
            converted.html
        );

        if self.options.path_to_heading {
            let relative = page
                .absolute_path
                .strip_prefix(location.export_dir())
                .map_or_else(
                    |_| page.wiki_relative_path.clone(),
                    |p| p.to_string_lossy().into_owned(),
                );
            let decoded = percent_decode_str(&relative).decode_utf8_lossy();
            html = format!("<b>{}</b>{html}", escape_html(&decoded));
        }

        if converted.kind == PageKind::GlobalToc
            && !self.options.heading
            && let Some(name) = &self.options.global_toc
        {
            html = format!("<h1>{}</h1>{html}", escape_html(name));
        }

        if self.options.heading {
            let level = (page.level + 1).min(6);
            let title = escape_html(&page_title(page.stem()));
            html = format!("<h{level}>{title}</h{level}>{html}");
        }

        if self.options.break_page && !last {
            html = format!("<div style='page-break-after: always;'>{html}</div>");
        }
        html
    }
}

/// Title of a page from its file stem: dashes become spaces, then
/// percent-escapes are decoded so `%2D` stays a literal dash.
fn page_title(stem: &str) -> String {
    percent_decode_str(&stem.replace('-', " "))
        .decode_utf8_lossy()
        .into_owned()
}
