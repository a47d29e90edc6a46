//! CLI command implementations.

pub(crate) mod export;
pub(crate) mod scan;

pub(crate) use export::ExportArgs;
pub(crate) use scan::ScanArgs;

use std::path::PathBuf;

use clap::Args;
use wikipdf_config::{CliSettings, Config};
use wikipdf_export::ExportOptions;

/// Arguments shared by every command that reads a wiki.
#[derive(Args)]
pub(crate) struct WikiArgs {
    /// Path to configuration file (default: auto-discover wikipdf.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to export (overrides config).
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Export one page, matched as a path substring or a `.md` file with its subpages.
    #[arg(long)]
    single: Option<String>,

    /// Include pages missing from `.order` files.
    #[arg(long)]
    include_unlisted_pages: bool,

    /// Skip pages whose wiki path matches a pattern (case-insensitive regex).
    #[arg(long, num_args = 1..)]
    exclude_paths: Vec<String>,

    /// Log progress at INFO level.
    #[arg(short, long)]
    pub(crate) verbose: bool,

    /// Log everything at DEBUG level.
    #[arg(long, conflicts_with = "verbose")]
    pub(crate) debug: bool,
}

impl WikiArgs {
    /// Copy the wiki selection into CLI settings.
    fn apply(&self, settings: &mut CliSettings) {
        settings.path.clone_from(&self.path);
        settings.single.clone_from(&self.single);
        settings.include_unlisted_pages = self.include_unlisted_pages.then_some(true);
        if !self.exclude_paths.is_empty() {
            settings.exclude_paths = Some(self.exclude_paths.clone());
        }
    }
}

/// Build exporter options from the resolved configuration.
pub(crate) fn export_options(config: &Config) -> ExportOptions {
    let export = &config.export_resolved;
    ExportOptions {
        path: export.path.clone(),
        attachments_path: export.attachments_path.clone(),
        exclude_paths: export.exclude_paths.clone(),
        single: export.single.clone(),
        include_unlisted_pages: export.include_unlisted_pages,
        global_toc: export.global_toc.clone(),
        global_toc_position: export.global_toc_position,
        heading: export.heading,
        path_to_heading: export.path_to_heading,
        break_page: export.break_page,
        filter: export.filter.clone(),
        ascii_only_ids: export.ascii_only_ids,
        auto_link_headings: export.auto_link_headings,
        convert_mermaid: config.html_resolved.convert_mermaid,
    }
}
