//! `folio search` command implementation.

use std::path::PathBuf;

use clap::Args;
use folio_config::{CliSettings, Config};
use folio_search::{Match, SearchOutcome, SearchQuery};

use super::{open_editor, save};
use crate::error::CliError;
use crate::output::Output;

/// Characters of context shown on each side of a match.
const CONTEXT_CHARS: usize = 24;

/// Arguments for the search command.
#[derive(Args)]
pub(crate) struct SearchArgs {
    /// Document markup file.
    file: PathBuf,

    /// Text (or pattern with --regex) to search for.
    term: String,

    /// Replace the first match with this text and save the file.
    #[arg(short, long)]
    replace: Option<String>,

    /// Replace every match instead of the first.
    #[arg(long, requires = "replace")]
    all: bool,

    /// Match case exactly.
    #[arg(short = 's', long)]
    case_sensitive: bool,

    /// Treat the term as a regular expression.
    #[arg(short = 'e', long)]
    regex: bool,

    /// Maximum number of matches to collect (overrides config).
    #[arg(long)]
    max_matches: Option<usize>,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl SearchArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            max_matches: self.max_matches,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let mut editor = open_editor(&self.file, &config)?;

        let mut query = SearchQuery::new(self.term)
            .case_sensitive(self.case_sensitive)
            .regex(self.regex);
        if let Some(replacement) = &self.replace {
            query = query.with_replacement(replacement.as_str());
        }

        let count = match editor.find(query)? {
            SearchOutcome::Found { count, .. } => count,
            SearchOutcome::NoMatches | SearchOutcome::NotSearched => {
                output.warning("No matches");
                return Ok(());
            }
        };

        output.match_count(count);
        let text = editor.document().text();
        if let Some(session) = editor.search() {
            for m in session.matches() {
                let line = excerpt(&text, *m);
                output.match_excerpt(&line.before, line.matched, &line.after);
            }
        }
        if count >= config.search.max_matches {
            output.warning(&format!(
                "Match list truncated at {}",
                config.search.max_matches
            ));
        }

        if self.replace.is_none() {
            return Ok(());
        }
        let replaced = if self.all {
            editor.replace_all()?
        } else {
            editor.replace_current()?;
            1
        };
        save(&editor, &self.file)?;
        output.success(&format!(
            "Replaced {replaced} match(es) in {}",
            self.file.display()
        ));
        Ok(())
    }
}

/// A match and the text around it on the same line.
#[derive(Debug, PartialEq, Eq)]
struct Excerpt<'a> {
    before: String,
    matched: &'a str,
    after: String,
}

/// The line around `m`, clipped to [`CONTEXT_CHARS`] on each side.
fn excerpt(text: &str, m: Match) -> Excerpt<'_> {
    let line_start = text[..m.from].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[m.to..].find('\n').map_or(text.len(), |i| m.to + i);

    let before = &text[line_start..m.from];
    let skip = before.chars().count().saturating_sub(CONTEXT_CHARS);
    let before: String = before.chars().skip(skip).collect();
    let after: String = text[m.to..line_end].chars().take(CONTEXT_CHARS).collect();

    Excerpt {
        before,
        matched: &text[m.from..m.to],
        after,
    }
}
