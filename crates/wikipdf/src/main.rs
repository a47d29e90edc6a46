//! wikipdf CLI - export a markdown wiki as one PDF.
//!
//! Provides commands for:
//! - `export`: Render the wiki into a PDF (or a standalone HTML file)
//! - `scan`: Print the pages an export would contain, in order

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ExportArgs, ScanArgs};
use output::Output;

/// wikipdf - flatten a wiki into a single document.
#[derive(Parser)]
#[command(name = "wikipdf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the wiki as a PDF.
    Export(ExportArgs),
    /// List the pages of the wiki in export order.
    Scan(ScanArgs),
}

impl Commands {
    fn verbosity(&self) -> (bool, bool) {
        let wiki = match self {
            Self::Export(args) => args.wiki(),
            Self::Scan(args) => args.wiki(),
        };
        (wiki.verbose, wiki.debug)
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --debug and --verbose override RUST_LOG, which defaults to WARN
    let filter = match cli.command.verbosity() {
        (_, true) => EnvFilter::new("debug"),
        (true, false) => EnvFilter::new("info"),
        (false, false) => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Export(args) => args.execute(),
        Commands::Scan(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
