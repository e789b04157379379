//! Search and replace over Folio documents.
//!
//! Searching runs over the document's plain-text projection
//! ([`folio_doc::TextProjection`]); matches are byte ranges into it and
//! replacements are applied back through [`folio_doc::Document::replace_text`],
//! so every replacement is an ordinary document command.
//!
//! # Example
//!
//! ```
//! use folio_doc::Document;
//! use folio_search::{SearchQuery, SearchSession};
//!
//! let mut doc = Document::parse("<p>aXaXaXa</p>").unwrap();
//! let mut session = SearchSession::new();
//! session.set_query(SearchQuery::new("a").with_replacement("bb"));
//! assert_eq!(session.replace_all(&mut doc).unwrap(), 4);
//! assert_eq!(doc.text(), "bbXbbXbbXbb");
//! ```

mod engine;
mod error;
mod session;

pub use engine::{DEFAULT_MAX_MATCHES, Match, Matcher, Matches, SearchQuery};
pub use error::SearchError;
pub use session::{SearchOutcome, SearchSession, SessionState};
