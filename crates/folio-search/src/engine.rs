//! Match finding over the text projection.

use folio_doc::TextProjection;
use regex::{Regex, RegexBuilder};

use crate::error::SearchError;

/// Default cap on collected matches.
pub const DEFAULT_MAX_MATCHES: usize = 10_000;

/// Search dialog inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub replacement: String,
    pub case_sensitive: bool,
    /// Treat `term` as a regular expression.
    pub regex: bool,
}

impl SearchQuery {
    #[must_use]
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }

    #[must_use]
    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    #[must_use]
    pub fn regex(mut self, yes: bool) -> Self {
        self.regex = yes;
        self
    }
}

/// Byte range of a match in the text projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Match {
    pub from: usize,
    pub to: usize,
}

impl Match {
    #[must_use]
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// Found matches plus whether the cap cut the list short.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    pub matches: Vec<Match>,
    pub truncated: bool,
}

/// A query compiled for repeated use.
#[derive(Debug, Clone)]
pub struct Matcher {
    kind: MatcherKind,
}

#[derive(Debug, Clone)]
enum MatcherKind {
    /// Case-sensitive literal, scanned with overlaps.
    Literal(String),
    /// Case-folded literal, scanned with overlaps.
    FoldedLiteral(Regex),
    /// User pattern, non-overlapping.
    Pattern(Regex),
}

impl Matcher {
    /// Compile `query`.
    ///
    /// Fails with [`SearchError::EmptyQuery`] for an empty term and with
    /// [`SearchError::Pattern`] when the regular expression does not compile.
    pub fn compile(query: &SearchQuery) -> Result<Self, SearchError> {
        if query.term.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let kind = match (query.regex, query.case_sensitive) {
            (true, case_sensitive) => MatcherKind::Pattern(
                RegexBuilder::new(&query.term)
                    .case_insensitive(!case_sensitive)
                    .build()?,
            ),
            (false, true) => MatcherKind::Literal(query.term.clone()),
            (false, false) => MatcherKind::FoldedLiteral(
                RegexBuilder::new(&regex::escape(&query.term))
                    .case_insensitive(true)
                    .build()?,
            ),
        };
        Ok(Self { kind })
    }

    /// All matches in `text`, up to `limit`.
    #[must_use]
    pub fn find_all(&self, text: &str, limit: usize) -> Matches {
        let mut found = Vec::new();
        let mut truncated = false;
        let mut push = |m: Match| {
            if found.len() >= limit {
                truncated = true;
                return false;
            }
            found.push(m);
            true
        };

        match &self.kind {
            MatcherKind::Literal(needle) => {
                let mut pos = 0;
                while let Some(offset) = text[pos..].find(needle.as_str()) {
                    let from = pos + offset;
                    if !push(Match {
                        from,
                        to: from + needle.len(),
                    }) {
                        break;
                    }
                    pos = from + char_len_at(text, from);
                }
            }
            MatcherKind::FoldedLiteral(re) => {
                let mut pos = 0;
                while pos <= text.len() {
                    let Some(m) = re.find_at(text, pos) else {
                        break;
                    };
                    if !push(Match {
                        from: m.start(),
                        to: m.end(),
                    }) {
                        break;
                    }
                    pos = m.start() + char_len_at(text, m.start());
                }
            }
            MatcherKind::Pattern(re) => {
                for m in re.find_iter(text).filter(|m| !m.is_empty()) {
                    if !push(Match {
                        from: m.start(),
                        to: m.end(),
                    }) {
                        break;
                    }
                }
            }
        }

        Matches {
            matches: found,
            truncated,
        }
    }

    /// Matches that fall inside a single textblock of `projection`.
    #[must_use]
    pub fn find_in(&self, projection: &TextProjection, limit: usize) -> Matches {
        let mut result = self.find_all(projection.text(), limit);
        let before = result.matches.len();
        result
            .matches
            .retain(|m| projection.block_for(m.from, m.to).is_some());
        let dropped = before - result.matches.len();
        if dropped > 0 {
            tracing::debug!(dropped, "Discarded matches crossing block boundaries");
        }
        if result.truncated {
            tracing::warn!(limit, "Match list truncated");
        }
        result
    }

    /// Replacement text for match `m` found in `text`.
    ///
    /// Regex queries expand `$1` and `${name}` references; literal queries
    /// insert the replacement as written.
    #[must_use]
    pub fn replacement_for(&self, text: &str, m: Match, replacement: &str) -> String {
        let MatcherKind::Pattern(re) = &self.kind else {
            return replacement.to_owned();
        };
        match re.captures_at(text, m.from) {
            Some(caps) if caps.get(0).is_some_and(|g| g.start() == m.from && g.end() == m.to) => {
                let mut out = String::new();
                caps.expand(replacement, &mut out);
                out
            }
            _ => replacement.to_owned(),
        }
    }
}

fn char_len_at(text: &str, at: usize) -> usize {
    text[at..].chars().next().map_or(1, char::len_utf8)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ranges(query: &SearchQuery, text: &str) -> Vec<(usize, usize)> {
        Matcher::compile(query)
            .unwrap()
            .find_all(text, DEFAULT_MAX_MATCHES)
            .matches
            .iter()
            .map(|m| (m.from, m.to))
            .collect()
    }

    #[test]
    fn test_empty_term_rejected() {
        assert!(matches!(
            Matcher::compile(&SearchQuery::new("")),
            Err(SearchError::EmptyQuery)
        ));
    }

    #[test]
    fn test_bad_pattern_rejected() {
        assert!(matches!(
            Matcher::compile(&SearchQuery::new("(").regex(true)),
            Err(SearchError::Pattern(_))
        ));
    }

    #[test]
    fn test_plain_overlapping() {
        let query = SearchQuery::new("aa").case_sensitive(true);
        assert_eq!(ranges(&query, "aaa"), vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn test_plain_case_insensitive() {
        let query = SearchQuery::new("ab");
        assert_eq!(ranges(&query, "AB ab aB"), vec![(0, 2), (3, 5), (6, 8)]);
        let sensitive = SearchQuery::new("ab").case_sensitive(true);
        assert_eq!(ranges(&sensitive, "AB ab aB"), vec![(3, 5)]);
    }

    #[test]
    fn test_plain_treats_metacharacters_literally() {
        let query = SearchQuery::new("a.b");
        assert_eq!(ranges(&query, "a.b axb"), vec![(0, 3)]);
    }

    #[test]
    fn test_plain_multibyte_advance() {
        let query = SearchQuery::new("éé").case_sensitive(true);
        assert_eq!(ranges(&query, "ééé"), vec![(0, 4), (2, 6)]);
    }

    #[test]
    fn test_regex_non_overlapping_and_case() {
        let query = SearchQuery::new("a+").regex(true).case_sensitive(true);
        assert_eq!(ranges(&query, "aaA a"), vec![(0, 2), (4, 5)]);
        let folded = SearchQuery::new("a+").regex(true);
        assert_eq!(ranges(&folded, "aaA a"), vec![(0, 3), (4, 5)]);
    }

    #[test]
    fn test_regex_skips_empty_matches() {
        let query = SearchQuery::new("x*").regex(true);
        assert_eq!(ranges(&query, "axxb"), vec![(1, 3)]);
    }

    #[test]
    fn test_limit_truncates() {
        let matcher = Matcher::compile(&SearchQuery::new("a")).unwrap();
        let result = matcher.find_all("aaaaa", 3);
        assert_eq!(result.matches.len(), 3);
        assert!(result.truncated);
    }

    #[test]
    fn test_capture_expansion() {
        let query = SearchQuery::new(r"(\w+)@(\w+)").regex(true);
        let matcher = Matcher::compile(&query).unwrap();
        let text = "mail bob@example now";
        let found = matcher.find_all(text, 10).matches;
        assert_eq!(
            matcher.replacement_for(text, found[0], "$2 at $1"),
            "example at bob"
        );
    }

    #[test]
    fn test_literal_replacement_not_expanded() {
        let matcher = Matcher::compile(&SearchQuery::new("x")).unwrap();
        assert_eq!(
            matcher.replacement_for("x", Match { from: 0, to: 1 }, "$1"),
            "$1"
        );
    }
}
