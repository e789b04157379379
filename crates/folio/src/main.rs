//! Folio CLI - structured document editor.
//!
//! Provides commands for:
//! - `toc`: Print the table of contents of a document
//! - `search`: Find (and optionally replace) text in a document
//! - `insert-box` / `move-box`: Edit positionable text boxes
//! - `export`: Export a document as HTML or Word

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ExportArgs, InsertBoxArgs, MoveBoxArgs, SearchArgs, TocArgs};
use output::Output;

/// Folio - structured document editor.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the table of contents.
    Toc(TocArgs),
    /// Search a document, optionally replacing matches.
    Search(SearchArgs),
    /// Insert a text box after the first block.
    InsertBox(InsertBoxArgs),
    /// Move a text box to a new position.
    MoveBox(MoveBoxArgs),
    /// Export a document.
    Export(ExportArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Toc(args) => args.execute(),
        Commands::Search(args) => args.execute(),
        Commands::InsertBox(args) => args.execute(),
        Commands::MoveBox(args) => args.execute(),
        Commands::Export(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
