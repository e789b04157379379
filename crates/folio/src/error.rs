//! CLI error types.

use folio_config::ConfigError;
use folio_doc::MarkupError;
use folio_editor::EditorError;
use folio_export::ExportError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{}: {source}", .path.display())]
    Markup {
        path: std::path::PathBuf,
        source: MarkupError,
    },

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Editor(#[from] EditorError),

    #[error("{0}")]
    Export(#[from] ExportError),

    #[cfg(feature = "s3")]
    #[error("{0}")]
    Upload(#[from] folio_export::UploadError),

    #[error("{0}")]
    Validation(String),
}
