//! Terminal reporting for search matches, export artifacts and status lines.

use std::fmt::Display;

use console::{Style, Term};

/// Writes styled report lines to stderr.
pub(crate) struct Output {
    term: Term,
    ok: Style,
    warn: Style,
    fail: Style,
    matched: Style,
    context: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red(),
            matched: Style::new().cyan().bold(),
            context: Style::new().dim(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.styled(&self.ok, msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.styled(&self.warn, msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.styled(&self.fail, msg);
    }

    /// Header line for a search result list.
    pub(crate) fn match_count(&self, count: usize) {
        let noun = if count == 1 { "match" } else { "matches" };
        self.styled(&self.matched, &format!("{count} {noun}"));
    }

    /// One match with its surrounding line context.
    pub(crate) fn match_excerpt(&self, before: &str, matched: &str, after: &str) {
        let _ = self
            .term
            .write_line(&self.format_excerpt(before, matched, after));
    }

    /// One written artifact: format, where it went and its size.
    pub(crate) fn artifact(&self, format: impl Display, location: &str, size: usize) {
        let _ = self.term.write_line(&self.format_artifact(format, location, size));
    }

    /// A QR placeholder that was left unresolved.
    pub(crate) fn unresolved(&self, index: usize, payload: &str, message: &str) {
        let _ = self.term.write_line(&format!(
            "  #{index} {}: {message}",
            self.warn.apply_to(format!("{payload:?}"))
        ));
    }

    fn styled(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }

    fn format_excerpt(&self, before: &str, matched: &str, after: &str) -> String {
        format!(
            "  {}{}{}",
            self.context.apply_to(before),
            self.matched.apply_to(format!("[{matched}]")),
            self.context.apply_to(after)
        )
    }

    fn format_artifact(&self, format: impl Display, location: &str, size: usize) -> String {
        format!(
            "{} {location} ({size} bytes)",
            self.ok.apply_to(format!("{format}:"))
        )
    }
}
