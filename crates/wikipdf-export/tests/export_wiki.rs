//! End-to-end export of a small wiki without a browser.

use std::cell::Cell;
use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use wikipdf_export::{
    DocumentOptions, ExportError, ExportOptions, Exporter, PdfRenderer, write_pdf,
};

struct RecordingRenderer {
    calls: Cell<usize>,
}

impl PdfRenderer for RecordingRenderer {
    fn render(&self, html: &Path, pdf: &Path) -> Result<(), ExportError> {
        self.calls.set(self.calls.get() + 1);
        let html = fs::read_to_string(html).unwrap();
        fs::write(pdf, format!("%PDF {}", html.len())).unwrap();
        Ok(())
    }
}

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn wiki(root: &Path) {
    fs::create_dir(root.join(".attachments")).unwrap();
    fs::write(root.join(".attachments/pixel.png"), [137_u8, 80, 78, 71]).unwrap();
    write(root, ".order", "Home\nProduct\n");
    write(
        root,
        "Home.md",
        "[[_TOC_]]\n# Overview\n\nSee [the product](Product.md) and ![pixel](/.attachments/pixel.png =10x).\n",
    );
    write(root, "Product.md", "#Overview\n\nBack to [home](/Home).\n");
    write(root, "Product/.order", "Specs\n");
    write(root, "Product/Specs.md", "# Limits\n\n```\n# not a heading\n```\n");
    write(root, "Unlisted.md", "# Hidden\n");
}

#[test]
fn test_export_order_files() {
    let dir = tempfile::tempdir().unwrap();
    wiki(dir.path());

    let document = Exporter::new(ExportOptions {
        path: dir.path().to_path_buf(),
        ..ExportOptions::default()
    })
    .export()
    .unwrap();

    assert_eq!(document.pages, 3);
    assert!(document.html.starts_with("<!DOCTYPE html><html><head>"));
    assert!(!document.html.contains("Hidden"));
    // Page anchors and the links pointing at them agree.
    assert!(document.html.contains("<a id=\"product\">&nbsp;</a>"));
    assert!(document.html.contains("<a href=\"#product\">the product</a>"));
    assert!(document.html.contains("<a href=\"#home\">home</a>"));
    // Same heading text on two pages.
    assert!(document.html.contains("<h2 id=\"home-overview\">Overview</h2>"));
    assert!(document.html.contains("<h2 id=\"product-overview\">Overview</h2>"));
    // Nested page headings are one level deeper.
    assert!(document.html.contains("<h3 id=\"specs-limits\">Limits</h3>"));
    // Per-page table of contents and embedded image.
    assert!(document.html.contains("<nav class=\"toc\">"));
    assert!(document.html.contains("src=\"data:image/png;base64,iVBORw==\" alt=\"pixel\" width=\"10\""));
}

#[test]
fn test_export_unlisted_with_global_toc() {
    let dir = tempfile::tempdir().unwrap();
    wiki(dir.path());

    let document = Exporter::new(ExportOptions {
        path: dir.path().to_path_buf(),
        include_unlisted_pages: true,
        global_toc: Some("Contents".to_owned()),
        exclude_paths: vec!["product/specs".to_owned()],
        ..ExportOptions::default()
    })
    .export()
    .unwrap();

    assert_eq!(document.pages, 4);
    assert!(document.html.contains("<a id=\"unlisted\">&nbsp;</a>"));
    assert!(!document.html.contains("specs-limits"));

    let toc_start = document.html.find("<h1>Contents</h1>").unwrap();
    let toc_end = toc_start + document.html[toc_start..].find("</nav>").unwrap();
    let toc = &document.html[toc_start..toc_end];
    assert!(toc.contains("<a href=\"#home-overview\">Overview</a>"));
    assert!(toc.contains("<a href=\"#product-overview\">Overview</a>"));
    assert!(toc.contains("<a href=\"#unlisted-hidden\">Hidden</a>"));
    assert!(!toc.contains("not a heading"));
    // The global table of contents replaces per-page ones.
    assert_eq!(document.html.matches("<nav class=\"toc\">").count(), 1);
}

#[test]
fn test_export_to_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let wiki_dir = dir.path().join("wiki");
    fs::create_dir(&wiki_dir).unwrap();
    wiki(&wiki_dir);
    let output = dir.path().join("out/export.pdf");
    fs::create_dir(dir.path().join("out")).unwrap();

    let document = Exporter::new(ExportOptions {
        path: wiki_dir,
        ..ExportOptions::default()
    })
    .with_document_options(DocumentOptions {
        math: true,
        ..DocumentOptions::default()
    })
    .export()
    .unwrap();
    let renderer = RecordingRenderer { calls: Cell::new(0) };
    write_pdf(&document.html, &renderer, &output, true).unwrap();

    assert_eq!(renderer.calls.get(), 1);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        format!("%PDF {}", document.html.len())
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("out/export.pdf.html")).unwrap(),
        document.html
    );
}

#[test]
fn test_export_single_markdown_file() {
    let dir = tempfile::tempdir().unwrap();
    wiki(dir.path());
    let target = dir.path().join("Product/Specs.md");

    let document = Exporter::new(ExportOptions {
        path: dir.path().to_path_buf(),
        single: Some(target.to_string_lossy().into_owned()),
        ..ExportOptions::default()
    })
    .export()
    .unwrap();

    assert_eq!(document.pages, 1);
    // A single page is exported at the top level.
    assert!(document.html.contains("<h2 id=\"specs-limits\">Limits</h2>"));
}
