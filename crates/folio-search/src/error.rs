//! Error types for search and replace.

use folio_doc::EditError;

/// Error from a search or replace operation.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The search term is empty; nothing was scanned.
    #[error("search term is empty")]
    EmptyQuery,

    /// The regular expression failed to compile.
    #[error("invalid search pattern")]
    Pattern(#[from] regex::Error),

    /// Navigation or replace-one without any match.
    #[error("no active match")]
    NoActiveMatch,

    /// The document rejected a replacement.
    #[error("replacement failed")]
    Edit(#[from] EditError),
}
