//! Error types for the document model.

use crate::block::GeometryError;
use crate::node::NodeId;

/// Error while parsing document markup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MarkupError {
    /// XML parsing error.
    #[error("XML parse error")]
    Xml(#[from] quick_xml::Error),

    /// Encoding error during XML parsing.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// Closing tag without a matching opening tag.
    #[error("unexpected closing tag </{0}>")]
    UnexpectedClose(String),

    /// Element left open at end of input.
    #[error("unclosed element <{0}>")]
    Unclosed(String),
}

/// Error from a document command.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    /// The document is in read-only mode.
    #[error("document is read-only")]
    ReadOnly,

    /// No node with this id exists in the document.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The node exists but is not a text box.
    #[error("node {id} is a {kind}, not a text box")]
    NotATextBox { id: NodeId, kind: &'static str },

    /// The node exists but is not a heading.
    #[error("node {id} is a {kind}, not a heading")]
    NotAHeading { id: NodeId, kind: &'static str },

    /// Attribute patch would produce invalid geometry.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),

    /// Text range is out of bounds, not on a char boundary, or spans blocks.
    #[error("invalid text range {from}..{to}: {reason}")]
    InvalidRange {
        from: usize,
        to: usize,
        reason: &'static str,
    },
}
