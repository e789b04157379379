//! `folio toc` command implementation.

use std::path::PathBuf;

use clap::Args;
use folio_config::Config;
use folio_doc::TocEntry;

use super::open_editor;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the toc command.
#[derive(Args)]
pub(crate) struct TocArgs {
    /// Document markup file.
    file: PathBuf,

    /// Print the rendered `<nav>` markup instead of a listing.
    #[arg(long, conflicts_with = "json")]
    html: bool,

    /// Print the entries as JSON.
    #[arg(long)]
    json: bool,

    /// Store synthesized heading anchors back into the file.
    #[arg(long)]
    write_anchors: bool,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl TocArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let editor = open_editor(&self.file, &config)?;
        let outline = editor.outline();

        if self.html {
            output.info(&outline.render_html());
        } else if self.json {
            output.info(&serde_json::to_string_pretty(outline)?);
        } else {
            for entry in outline.entries() {
                if entry.placeholder {
                    output.warning(&entry.text);
                } else {
                    output.info(&format_entry(entry));
                }
            }
        }

        if self.write_anchors {
            super::save(&editor, &self.file)?;
            output.success(&format!("Anchors written to {}", self.file.display()));
        }
        Ok(())
    }
}

fn format_entry(entry: &TocEntry) -> String {
    format!(
        "{}{} (#{})",
        "  ".repeat(usize::from(entry.indent)),
        entry.text,
        entry.anchor_id
    )
}
