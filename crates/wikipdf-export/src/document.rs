//! Standalone HTML document around the rendered pages.

use std::fs;
use std::path::PathBuf;

use crate::ExportError;

/// Stylesheet used when no custom CSS is configured.
pub const DEFAULT_CSS: &str = include_str!("default.css");

const META_CHARSET: &str = r#"<meta http-equiv="Content-Type" content="text/html; charset=utf-8">"#;

const MERMAID_CDN: &str = r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/mermaid/8.6.4/mermaid.min.js"></script>"#;
const MERMAID_INIT: &str = "<script>mermaid.initialize({ startOnLoad:true });</script>";

const KATEX_CSS: &str = r#"<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/katex@0.13.11/dist/katex.min.css">"#;
const KATEX_JS: &str = r#"<script src="https://cdn.jsdelivr.net/npm/katex@0.13.11/dist/katex.min.js"></script><script src="https://cdn.jsdelivr.net/npm/katex@0.13.11/dist/contrib/auto-render.min.js" onload="renderMathInElement(document.body, {delimiters: [{left: '$$', right: '$$', display: true},{left: '$', right: '$', display: true}]});"></script>"#;

const HIGHLIGHT_BASE: &str = "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.1.0";
const HIGHLIGHT_DEFAULT_STYLE: &str = "vs";
const HIGHLIGHT_INIT: &str = "<script>hljs.highlightAll();</script>";
// Grey code background for the stock theme.
const HIGHLIGHT_DEFAULT_OVERRIDE: &str =
    "<style>.hljs { background: #f0f0f0; } pre { border-radius: 0px; }</style>";

const PRINT_BACKGROUND: &str =
    "<style>* { -webkit-print-color-adjust: exact; print-color-adjust: exact; }</style>";

/// Assets and scripts included in the final document.
#[derive(Clone, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct DocumentOptions {
    /// Custom stylesheet. Falls back to [`DEFAULT_CSS`].
    pub css: Option<PathBuf>,
    /// Load mermaid.js to draw `<div class="mermaid">` blocks.
    pub convert_mermaid: bool,
    /// Local mermaid.js inlined instead of the CDN build.
    pub mermaid_js_path: Option<PathBuf>,
    /// Render `$...$` and `$$...$$` with KaTeX.
    pub math: bool,
    /// Highlight code blocks with highlight.js.
    pub highlight_code: bool,
    /// highlight.js theme name.
    pub highlight_style: Option<String>,
    /// Keep background colors when printing.
    pub print_background: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            css: None,
            convert_mermaid: false,
            mermaid_js_path: None,
            math: false,
            highlight_code: false,
            highlight_style: None,
            print_background: true,
        }
    }
}

/// Wrap the concatenated page HTML into a complete document.
///
/// Script and style extras go into `<head>`; the stylesheet is placed in
/// the footer so it overrides the styles of mermaid, KaTeX and highlight.js.
pub fn build_document(body: &str, options: &DocumentOptions) -> Result<String, ExportError> {
    let mut head = vec![META_CHARSET.to_owned()];
    let mut footer = Vec::new();

    if options.print_background {
        head.push(PRINT_BACKGROUND.to_owned());
    }

    if options.convert_mermaid {
        let mermaid = match &options.mermaid_js_path {
            Some(path) => {
                let script = fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
                format!("<script>{script}</script>")
            }
            None => MERMAID_CDN.to_owned(),
        };
        head.push(mermaid);
        head.push(MERMAID_INIT.to_owned());
    }

    if options.math {
        head.push(KATEX_CSS.to_owned());
        footer.push(KATEX_JS.to_owned());
    }

    if options.highlight_code {
        let style = options
            .highlight_style
            .as_deref()
            .unwrap_or(HIGHLIGHT_DEFAULT_STYLE);
        let mut highlight = format!(
            r#"<link rel="stylesheet" href="{HIGHLIGHT_BASE}/styles/{style}.min.css"><script src="{HIGHLIGHT_BASE}/highlight.min.js"></script>{HIGHLIGHT_INIT}"#
        );
        if options.highlight_style.is_none() {
            highlight.push_str(HIGHLIGHT_DEFAULT_OVERRIDE);
        }
        head.push(highlight);
    }

    let css = match &options.css {
        Some(path) => fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?,
        None => {
            tracing::info!("No CSS specified, using built-in stylesheet");
            DEFAULT_CSS.to_owned()
        }
    };
    footer.push(format!("<style>{css}</style>"));

    Ok(format!(
        "<!DOCTYPE html><html><head>{}</head><body>{body}<footer>{}</footer></body></html>",
        head.concat(),
        footer.concat()
    ))
}
