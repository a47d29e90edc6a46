//! `wikipdf export` command implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use wikipdf_config::{CliSettings, Config};
use wikipdf_export::{
    ChromeRenderer, DocumentOptions, Exporter, kept_html_path, write_html, write_pdf,
};

use super::{WikiArgs, export_options};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the export command.
#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    wiki: WikiArgs,

    /// PDF output path (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory `.attachments` links resolve against.
    #[arg(long)]
    attachments_path: Option<PathBuf>,

    /// Insert a table of contents page with this title.
    #[arg(long)]
    global_toc: Option<String>,

    /// Position of the table of contents page among the exported pages.
    #[arg(long)]
    global_toc_position: Option<usize>,

    /// Prepend a title derived from the file name to each page.
    #[arg(long)]
    heading: bool,

    /// Prepend the relative path of each page.
    #[arg(long)]
    path_to_heading: bool,

    /// Start each page on a new sheet.
    #[arg(long)]
    break_page: bool,

    /// Export only pages whose front matter matches `key:value`.
    #[arg(long)]
    filter: Option<String>,

    /// Custom stylesheet replacing the built-in one.
    #[arg(long)]
    css: Option<PathBuf>,

    /// Draw `mermaid` code blocks as diagrams.
    #[arg(long)]
    mermaid: bool,

    /// Render `$...$` and `$$...$$` math with KaTeX.
    #[arg(long)]
    math: bool,

    /// Highlight code blocks with highlight.js.
    #[arg(long)]
    highlight_code: bool,

    /// Chrome or Chromium executable (default: search PATH).
    #[arg(long, env = "WIKIPDF_CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// Write the HTML document next to the output instead of a PDF.
    #[arg(long)]
    html_only: bool,
}

impl ExportArgs {
    pub(crate) fn wiki(&self) -> &WikiArgs {
        &self.wiki
    }

    /// Execute the export command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the wiki cannot be read or
    /// the PDF cannot be rendered.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let mut cli_settings = self.cli_settings();
        self.wiki.apply(&mut cli_settings);
        let config = Config::load(self.wiki.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::debug!(path = %path.display(), "Loaded configuration");
        }

        output.field("Exporting", config.export_resolved.path.display());

        let exporter =
            Exporter::new(export_options(&config)).with_document_options(document_options(&config));
        let document = exporter.export()?;

        output.field("Pages", document.pages);
        if document.skipped > 0 {
            output.warning(&format!(
                "Skipped {} empty or filtered pages",
                document.skipped
            ));
        }

        let pdf = &config.pdf_resolved;
        if self.html_only {
            let path = pdf.output.with_extension("html");
            write_html(&document.html, &path)?;
            output.written("HTML", &path);
            return Ok(());
        }

        let renderer = ChromeRenderer::discover(pdf.chrome_path.as_deref())?
            .with_timeout(Duration::from_secs(pdf.timeout_secs));
        output.field("Browser", renderer.executable().display());
        write_pdf(&document.html, &renderer, &pdf.output, pdf.keep_html)?;

        output.written("PDF", &pdf.output);
        if pdf.keep_html {
            output.written("HTML", &kept_html_path(&pdf.output));
        }
        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            output: self.output.clone(),
            attachments_path: self.attachments_path.clone(),
            global_toc: self.global_toc.clone(),
            global_toc_position: self.global_toc_position,
            heading: self.heading.then_some(true),
            path_to_heading: self.path_to_heading.then_some(true),
            break_page: self.break_page.then_some(true),
            filter: self.filter.clone(),
            css: self.css.clone(),
            convert_mermaid: self.mermaid.then_some(true),
            math: self.math.then_some(true),
            highlight_code: self.highlight_code.then_some(true),
            chrome_path: self.chrome_path.clone(),
            ..CliSettings::default()
        }
    }
}

/// Build document options from the resolved configuration.
fn document_options(config: &Config) -> DocumentOptions {
    let html = &config.html_resolved;
    DocumentOptions {
        css: html.css.clone(),
        convert_mermaid: html.convert_mermaid,
        mermaid_js_path: html.mermaid_js_path.clone(),
        math: html.math,
        highlight_code: html.highlight_code,
        highlight_style: html.highlight_style.clone(),
        print_background: config.pdf_resolved.print_background,
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ExportArgs,
    }

    #[test]
    fn test_absent_flags_do_not_override_config() {
        let cli = TestCli::parse_from(["wikipdf", "--global-toc", "Contents"]);

        let settings = cli.args.cli_settings();

        assert_eq!(settings.global_toc.as_deref(), Some("Contents"));
        assert_eq!(settings.heading, None);
        assert_eq!(settings.convert_mermaid, None);
    }

    #[test]
    fn test_flags_map_to_settings() {
        let cli = TestCli::parse_from([
            "wikipdf",
            "--heading",
            "--mermaid",
            "--break-page",
            "--global-toc-position",
            "2",
            "-o",
            "out/wiki.pdf",
        ]);

        let settings = cli.args.cli_settings();

        assert_eq!(settings.heading, Some(true));
        assert_eq!(settings.convert_mermaid, Some(true));
        assert_eq!(settings.break_page, Some(true));
        assert_eq!(settings.global_toc_position, Some(2));
        assert_eq!(settings.output, Some(PathBuf::from("out/wiki.pdf")));
    }

    #[test]
    fn test_document_options_from_config() {
        let mut config = Config::default();
        config.html_resolved.math = true;
        config.html_resolved.highlight_style = Some("github".to_owned());
        config.pdf_resolved.print_background = false;

        let options = document_options(&config);

        assert!(options.math);
        assert_eq!(options.highlight_style.as_deref(), Some("github"));
        assert!(!options.print_background);
    }
}
