//! Error types for the export pipeline.

use std::io;

use crate::format::ExportFormat;
use crate::resolver::PlaceholderFailure;

/// Error returned by a [`QrEncoder`](crate::QrEncoder).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QrError {
    #[error("empty payload")]
    EmptyPayload,
    #[error("QR encoding failed: {0}")]
    Encode(String),
}

/// Error returned by a [`FormatRenderer`](crate::FormatRenderer).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    /// The assembled page is missing a part the renderer rewrites.
    #[error("malformed document shell: missing {0}")]
    MalformedShell(&'static str),
    #[error("{format} renderer failed: {message}")]
    Backend {
        format: ExportFormat,
        message: String,
    },
}

/// Error returned by an [`ArtifactSink`](crate::ArtifactSink).
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Error returned by an [`ArtifactUploader`](crate::ArtifactUploader).
///
/// Upload errors never fail an export; they are reported as warnings.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("S3 error: {0}")]
    S3(String),
    #[error("upload rejected: {0}")]
    Rejected(String),
}

/// Error returned by [`Exporter::export`](crate::Exporter::export).
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("{} QR placeholder(s) could not be resolved", .0.len())]
    Unresolved(Vec<PlaceholderFailure>),
    #[error("no renderer registered for {0}")]
    NoRenderer(ExportFormat),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("delivery failed: {0}")]
    Sink(#[from] SinkError),
}
