//! Search dialog session.
//!
//! A session lives from the moment the search dialog opens until it closes.
//! It holds the query and the most recent match list, and moves through
//! these states:
//!
//! ```text
//! Idle --search--> Searched --next/previous--> Navigating
//!                     ^  \                        |
//!                     |   replace-one/all         | replace-one/all
//!                     |        v                  v
//!                     +---- Replacing <-----------+
//! ```
//!
//! Changing the query marks the match list stale; the next replace searches
//! again before touching the document.

use folio_doc::Document;

use crate::engine::{DEFAULT_MAX_MATCHES, Match, Matcher, SearchQuery};
use crate::error::SearchError;

/// Lifecycle state of a [`SearchSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No search has run for the current query.
    #[default]
    Idle,
    Searched,
    Navigating,
    /// A replacement is being applied.
    Replacing,
}

/// What the dialog should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    NotSearched,
    NoMatches,
    /// `current` is zero-based.
    Found { count: usize, current: usize },
}

/// Search and replace state for one open dialog.
#[derive(Debug, Default)]
pub struct SearchSession {
    query: SearchQuery,
    state: SessionState,
    matcher: Option<Matcher>,
    matches: Vec<Match>,
    current: Option<usize>,
    /// Document version the match list was computed against.
    version: u64,
    /// The query changed since the last search.
    stale: bool,
    max_matches: Option<usize>,
}

impl SearchSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of collected matches.
    #[must_use]
    pub fn with_max_matches(mut self, max: usize) -> Self {
        self.max_matches = Some(max);
        self
    }

    #[must_use]
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    #[must_use]
    pub fn current_match(&self) -> Option<Match> {
        self.current.and_then(|i| self.matches.get(i).copied())
    }

    /// Replace the query. The previous match list is kept until the next
    /// successful search.
    pub fn set_query(&mut self, query: SearchQuery) {
        if query.term != self.query.term
            || query.case_sensitive != self.query.case_sensitive
            || query.regex != self.query.regex
        {
            self.stale = true;
        }
        self.query = query;
    }

    /// Update only the replacement text.
    pub fn set_replacement(&mut self, replacement: impl Into<String>) {
        self.query.replacement = replacement.into();
    }

    #[must_use]
    pub fn outcome(&self) -> SearchOutcome {
        if self.state == SessionState::Idle {
            return SearchOutcome::NotSearched;
        }
        match self.current {
            Some(current) if !self.matches.is_empty() => SearchOutcome::Found {
                count: self.matches.len(),
                current,
            },
            _ => SearchOutcome::NoMatches,
        }
    }

    /// Run the query against `doc`.
    ///
    /// On error (empty term, bad pattern) the previous match list and state
    /// are left as they were.
    pub fn search(&mut self, doc: &Document) -> Result<SearchOutcome, SearchError> {
        let matcher = Matcher::compile(&self.query)?;
        self.matches = self.scan(&matcher, doc);
        self.current = (!self.matches.is_empty()).then_some(0);
        self.matcher = Some(matcher);
        self.version = doc.version();
        self.stale = false;
        self.state = SessionState::Searched;
        tracing::debug!(
            term = %self.query.term,
            count = self.matches.len(),
            "Search completed"
        );
        Ok(self.outcome())
    }

    /// Select the next match, wrapping to the first.
    pub fn next(&mut self) -> Result<Match, SearchError> {
        self.step(|i, n| (i + 1) % n)
    }

    /// Select the previous match, wrapping to the last.
    pub fn previous(&mut self) -> Result<Match, SearchError> {
        self.step(|i, n| (i + n - 1) % n)
    }

    fn step(&mut self, advance: impl Fn(usize, usize) -> usize) -> Result<Match, SearchError> {
        let n = self.matches.len();
        let Some(current) = self.current.filter(|_| n > 0) else {
            return Err(SearchError::NoActiveMatch);
        };
        let next = advance(current, n);
        self.current = Some(next);
        self.state = SessionState::Navigating;
        Ok(self.matches[next])
    }

    /// Replace the current match (or the first one) and search again.
    ///
    /// The selection stays at the same index, clamped to the new match count.
    pub fn replace_one(&mut self, doc: &mut Document) -> Result<SearchOutcome, SearchError> {
        self.ensure_fresh(doc)?;
        let (Some(index), Some(matcher)) = (self.current, self.matcher.clone()) else {
            return Err(SearchError::NoActiveMatch);
        };
        let Some(&target) = self.matches.get(index) else {
            return Err(SearchError::NoActiveMatch);
        };

        let previous = self.state;
        self.state = SessionState::Replacing;
        let replacement = matcher.replacement_for(&doc.text(), target, &self.query.replacement);
        if let Err(e) = doc.replace_text(target.from, target.to, &replacement) {
            self.state = previous;
            return Err(e.into());
        }

        self.matches = self.scan(&matcher, doc);
        self.version = doc.version();
        self.current = self.matches.len().checked_sub(1).map(|last| index.min(last));
        self.state = SessionState::Searched;
        Ok(self.outcome())
    }

    /// Replace every match. Returns the number of replacements made.
    ///
    /// Matches are computed once and applied from the end of the document
    /// backwards, each as its own edit, so earlier offsets stay valid.
    /// Overlapping literal matches are replaced left to right, skipping any
    /// match that overlaps one already taken.
    pub fn replace_all(&mut self, doc: &mut Document) -> Result<usize, SearchError> {
        let matcher = Matcher::compile(&self.query)?;
        let matches = self.scan(&matcher, doc);
        let text = doc.text();
        let mut taken_to = 0;
        let edits: Vec<(Match, String)> = matches
            .into_iter()
            .filter(|m| {
                let free = m.from >= taken_to;
                if free {
                    taken_to = m.to;
                }
                free
            })
            .map(|m| (m, matcher.replacement_for(&text, m, &self.query.replacement)))
            .collect();

        self.state = SessionState::Replacing;
        let mut replaced = 0;
        let mut failure = None;
        for (m, replacement) in edits.iter().rev() {
            if let Err(e) = doc.replace_text(m.from, m.to, replacement) {
                failure = Some(e);
                break;
            }
            replaced += 1;
        }

        self.matches = self.scan(&matcher, doc);
        self.current = (!self.matches.is_empty()).then_some(0);
        self.matcher = Some(matcher);
        self.version = doc.version();
        self.stale = false;
        self.state = SessionState::Searched;
        tracing::info!(term = %self.query.term, replaced, "Replaced all matches");

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(replaced),
        }
    }

    /// Returns `true` if the match list was computed for the current query
    /// against this version of `doc`.
    #[must_use]
    pub fn is_current(&self, doc: &Document) -> bool {
        !self.stale && self.matcher.is_some() && self.version == doc.version()
    }

    /// Re-run the search when the document changed since the last scan.
    fn ensure_fresh(&mut self, doc: &Document) -> Result<(), SearchError> {
        if !self.is_current(doc) {
            self.search(doc)?;
        }
        Ok(())
    }

    fn scan(&self, matcher: &Matcher, doc: &Document) -> Vec<Match> {
        let limit = self.max_matches.unwrap_or(DEFAULT_MAX_MATCHES);
        matcher.find_in(&doc.projection(), limit).matches
    }
}

#[cfg(test)]
mod tests {
    use folio_doc::EditError;
    use pretty_assertions::assert_eq;

    use super::*;

    fn session(term: &str) -> SearchSession {
        let mut s = SearchSession::new();
        s.set_query(SearchQuery::new(term).case_sensitive(true));
        s
    }

    #[test]
    fn test_not_searched_vs_no_matches() {
        let doc = Document::parse("<p>abc</p>").unwrap();
        let mut s = session("zzz");
        assert_eq!(s.outcome(), SearchOutcome::NotSearched);
        assert_eq!(s.search(&doc).unwrap(), SearchOutcome::NoMatches);
    }

    #[test]
    fn test_is_current_tracks_query_and_version() {
        let mut doc = Document::parse("<p>abc</p>").unwrap();
        let mut s = session("b");
        assert!(!s.is_current(&doc));
        s.search(&doc).unwrap();
        assert!(s.is_current(&doc));
        doc.replace_text(0, 1, "x").unwrap();
        assert!(!s.is_current(&doc));
        s.search(&doc).unwrap();
        s.set_query(SearchQuery::new("c"));
        assert!(!s.is_current(&doc));
    }

    #[test]
    fn test_empty_query_rejected() {
        let doc = Document::parse("<p>abc</p>").unwrap();
        let mut s = session("");
        assert!(matches!(s.search(&doc), Err(SearchError::EmptyQuery)));
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_next_wraps() {
        let doc = Document::parse("<p>a a a</p>").unwrap();
        let mut s = session("a");
        s.search(&doc).unwrap();
        s.next().unwrap();
        s.next().unwrap();
        assert_eq!(s.outcome(), SearchOutcome::Found { count: 3, current: 2 });
        s.next().unwrap();
        assert_eq!(s.outcome(), SearchOutcome::Found { count: 3, current: 0 });
        assert_eq!(s.state(), SessionState::Navigating);
    }

    #[test]
    fn test_previous_wraps() {
        let doc = Document::parse("<p>a a a</p>").unwrap();
        let mut s = session("a");
        s.search(&doc).unwrap();
        let m = s.previous().unwrap();
        assert_eq!(m, Match { from: 4, to: 5 });
    }

    #[test]
    fn test_next_without_matches() {
        let mut s = session("a");
        assert!(matches!(s.next(), Err(SearchError::NoActiveMatch)));
    }

    #[test]
    fn test_bad_pattern_keeps_previous_matches() {
        let doc = Document::parse("<p>x(y x</p>").unwrap();
        let mut s = session("x");
        s.search(&doc).unwrap();
        s.next().unwrap();
        s.set_query(SearchQuery::new("(").regex(true));
        assert!(matches!(s.search(&doc), Err(SearchError::Pattern(_))));
        assert_eq!(s.state(), SessionState::Navigating);
        assert_eq!(s.matches().len(), 2);
        assert_eq!(s.current_match(), Some(Match { from: 4, to: 5 }));
    }

    #[test]
    fn test_replace_all() {
        let mut doc = Document::parse("<p>aXaXaXa</p>").unwrap();
        let mut s = session("a");
        s.set_replacement("bb");
        assert_eq!(s.replace_all(&mut doc).unwrap(), 4);
        assert_eq!(doc.text(), "bbXbbXbbXbb");
        assert_eq!(doc.version(), 4);
    }

    #[test]
    fn test_replace_all_skips_overlaps() {
        let mut doc = Document::parse("<p>aaaaa</p>").unwrap();
        let mut s = session("aa");
        s.set_replacement("b");
        assert_eq!(s.replace_all(&mut doc).unwrap(), 2);
        assert_eq!(doc.text(), "bba");
    }

    #[test]
    fn test_replace_all_empty_replacement_deletes() {
        let mut doc = Document::parse("<p>a-b-c</p>").unwrap();
        let mut s = session("-");
        assert_eq!(s.replace_all(&mut doc).unwrap(), 2);
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn test_replace_all_across_blocks_and_marks() {
        let mut doc =
            Document::parse("<h1>cat</h1><p>a <strong>cat</strong> and c<em>at</em></p>").unwrap();
        let mut s = session("cat");
        s.set_replacement("dog");
        assert_eq!(s.replace_all(&mut doc).unwrap(), 3);
        assert_eq!(doc.text(), "dog\na dog and dog");
        assert!(doc.to_markup().contains("<strong>dog</strong>"));
    }

    #[test]
    fn test_match_across_blocks_ignored() {
        let doc = Document::parse("<p>ab</p><p>cd</p>").unwrap();
        let mut s = SearchSession::new();
        s.set_query(SearchQuery::new(r"b\nc").regex(true));
        assert_eq!(s.search(&doc).unwrap(), SearchOutcome::NoMatches);
    }

    #[test]
    fn test_replace_one_reselects_clamped_index() {
        let mut doc = Document::parse("<p>a a a</p>").unwrap();
        let mut s = session("a");
        s.set_replacement("b");
        s.search(&doc).unwrap();
        s.previous().unwrap();
        let outcome = s.replace_one(&mut doc).unwrap();
        assert_eq!(doc.text(), "a a b");
        assert_eq!(outcome, SearchOutcome::Found { count: 2, current: 1 });
    }

    #[test]
    fn test_replace_one_keeps_index() {
        let mut doc = Document::parse("<p>a a a</p>").unwrap();
        let mut s = session("a");
        s.set_replacement("b");
        s.search(&doc).unwrap();
        s.next().unwrap();
        let outcome = s.replace_one(&mut doc).unwrap();
        assert_eq!(doc.text(), "a b a");
        assert_eq!(outcome, SearchOutcome::Found { count: 2, current: 1 });
        assert_eq!(s.state(), SessionState::Searched);
    }

    #[test]
    fn test_replace_one_searches_first() {
        let mut doc = Document::parse("<p>xa</p>").unwrap();
        let mut s = session("a");
        s.set_replacement("b");
        assert_eq!(s.replace_one(&mut doc).unwrap(), SearchOutcome::NoMatches);
        assert_eq!(doc.text(), "xb");
    }

    #[test]
    fn test_regex_replace_with_captures() {
        let mut doc = Document::parse("<p>2024-01-31</p>").unwrap();
        let mut s = SearchSession::new();
        s.set_query(
            SearchQuery::new(r"(\d+)-(\d+)-(\d+)")
                .regex(true)
                .with_replacement("$3/$2/$1"),
        );
        assert_eq!(s.replace_all(&mut doc).unwrap(), 1);
        assert_eq!(doc.text(), "31/01/2024");
    }

    #[test]
    fn test_replace_read_only_reports_edit_error() {
        let mut doc = Document::parse("<p>a</p>").unwrap().with_read_only(true);
        let mut s = session("a");
        assert!(matches!(
            s.replace_all(&mut doc),
            Err(SearchError::Edit(EditError::ReadOnly))
        ));
        assert_eq!(doc.text(), "a");
    }
}
