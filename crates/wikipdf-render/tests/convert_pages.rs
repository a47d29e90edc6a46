//! Converting several pages of one wiki into a single document.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use wikipdf_render::preprocess::TOC_PLACEHOLDER;
use wikipdf_render::toc::{create_global_toc, link_entries, remove_duplicated_headings, render_nav};
use wikipdf_render::{AnchorRegistry, PageConverter, PageKind};
use wikipdf_scan::{DirectoryScanner, ExcludeFilter, Page, PageScanner, WikiLocation};

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn wiki() -> (tempfile::TempDir, WikiLocation) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join(".attachments")).unwrap();
    write(root, ".order", "Home\nGuide\n");
    write(root, "Home.md", "# Overview\n\nRead the [guide](Guide.md).\n");
    write(root, "Guide.md", "# Overview\n\nBack [home](/Home).\n");
    write(root, "Guide/Install.md", "# Steps\n\n## Overview\n");
    let location = WikiLocation::locate(root).unwrap();
    (dir, location)
}

fn scan(location: &WikiLocation) -> Vec<Page> {
    DirectoryScanner::new(location.export_dir(), ExcludeFilter::default())
        .scan()
        .unwrap()
}

#[test]
fn test_heading_ids_unique_across_document() {
    let (_dir, location) = wiki();
    let converter = PageConverter::new(&location);
    let mut registry = AnchorRegistry::new();

    let ids: Vec<String> = scan(&location)
        .iter()
        .flat_map(|page| converter.convert(page, PageKind::Content, &mut registry).headings)
        .map(|h| h.id)
        .collect();

    assert_eq!(
        ids,
        vec![
            "home-overview",
            "guide-overview",
            "install-steps",
            "install-overview"
        ]
    );
}

#[test]
fn test_links_target_page_anchors() {
    let (_dir, location) = wiki();
    let converter = PageConverter::new(&location);
    let mut registry = AnchorRegistry::new();
    let pages = scan(&location);

    let rendered: Vec<_> = pages
        .iter()
        .map(|page| converter.convert(page, PageKind::Content, &mut registry))
        .collect();

    assert_eq!(rendered[0].anchor, "home");
    assert_eq!(rendered[1].anchor, "guide");
    assert!(rendered[0].html.contains("<a href=\"#guide\">guide</a>"));
    assert!(rendered[1].html.contains("<a href=\"#home\">home</a>"));
}

#[test]
fn test_nested_page_headings_are_deeper() {
    let (_dir, location) = wiki();
    let converter = PageConverter::new(&location);
    let mut registry = AnchorRegistry::new();
    let pages = scan(&location);

    let install = converter.convert(&pages[2], PageKind::Content, &mut registry);

    assert_eq!(pages[2].level, 1);
    assert!(install.html.starts_with("<h3 id=\"install-steps\">Steps</h3>"));
    assert!(install.html.contains("<h4 id=\"install-overview\">Overview</h4>"));
}

#[test]
fn test_global_toc_links_real_headings() {
    let (_dir, location) = wiki();
    let converter = PageConverter::new(&location);
    let mut registry = AnchorRegistry::new();
    let pages = scan(&location);

    let contents: Vec<&str> = pages.iter().map(|p| p.content.as_str()).collect();
    let toc_page = Page::with_content(
        location.export_dir().join("Contents.md"),
        location.export_dir(),
        0,
        create_global_toc(&contents).join("\n"),
    );

    let toc = converter.convert(&toc_page, PageKind::GlobalToc, &mut registry);
    let headings: Vec<_> = pages
        .iter()
        .flat_map(|page| converter.convert(page, PageKind::Content, &mut registry).headings)
        .collect();

    let nav = render_nav(&link_entries(&toc.headings, &headings));
    let html = remove_duplicated_headings(&toc.html.replace(TOC_PLACEHOLDER, &nav));

    assert!(html.starts_with("<nav class=\"toc\">"));
    assert!(html.contains("<a href=\"#home-overview\">Overview</a>"));
    assert!(html.contains("<a href=\"#guide-overview\">Overview</a>"));
    assert!(html.contains("<a href=\"#install-steps\">Steps</a>"));
    assert!(!html.contains("<h2"));
}
