use crate::artifact::ExportArtifact;
use crate::error::UploadError;

/// Pushes artifacts to remote storage.
pub trait ArtifactUploader: Send + Sync {
    /// Upload `artifact`, returning the URL it can be fetched from.
    fn upload(&self, artifact: &ExportArtifact) -> Result<String, UploadError>;
}

/// Outcome of the optional upload step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// No uploader configured.
    Skipped,
    Uploaded(String),
    /// Upload failed; the local delivery stands.
    Failed(String),
}
