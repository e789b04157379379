use folio_doc::{EditError, MarkupError};
use folio_search::SearchError;

/// Error returned by [`Editor`](crate::Editor) operations.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("invalid content: {0}")]
    Markup(#[from] MarkupError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("search dialog is not open")]
    SearchClosed,
}
