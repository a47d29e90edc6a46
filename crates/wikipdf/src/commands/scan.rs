//! `wikipdf scan` command implementation.

use clap::Args;
use wikipdf_config::{CliSettings, Config};
use wikipdf_export::Exporter;

use super::{WikiArgs, export_options};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the scan command.
#[derive(Args)]
pub(crate) struct ScanArgs {
    #[command(flatten)]
    wiki: WikiArgs,
}

impl ScanArgs {
    pub(crate) fn wiki(&self) -> &WikiArgs {
        &self.wiki
    }

    /// Execute the scan command.
    ///
    /// Prints one `level<TAB>path` line per page to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the wiki cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let mut cli_settings = CliSettings::default();
        self.wiki.apply(&mut cli_settings);
        let config = Config::load(self.wiki.config.as_deref(), Some(&cli_settings))?;

        let exporter = Exporter::new(export_options(&config));
        let location = exporter.locate()?;
        let pages = exporter.scan(&location)?;

        for page in &pages {
            output.page(page.level, &page.wiki_relative_path)?;
        }

        output.field("Pages", pages.len());
        Ok(())
    }
}
