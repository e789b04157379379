//! In-memory collaborators for testing exports.

use std::sync::{PoisonError, RwLock};

use crate::artifact::ExportArtifact;
use crate::error::{SinkError, UploadError};
use crate::sink::ArtifactSink;
use crate::upload::ArtifactUploader;

/// Sink that keeps delivered artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: RwLock<Vec<ExportArtifact>>,
    failure: Option<String>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery fail with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Artifacts delivered so far, in order.
    #[must_use]
    pub fn delivered(&self) -> Vec<ExportArtifact> {
        self.delivered.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ArtifactSink for MemorySink {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<String, SinkError> {
        if let Some(message) = &self.failure {
            return Err(SinkError::Unavailable(message.clone()));
        }
        self.delivered
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(artifact.clone());
        Ok(format!("memory://{}", artifact.filename))
    }
}

/// Uploader that records artifacts and hands out fake URLs.
#[derive(Debug, Default)]
pub struct MemoryUploader {
    uploaded: RwLock<Vec<String>>,
    failure: Option<String>,
}

impl MemoryUploader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload fail with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// File names uploaded so far, in order.
    #[must_use]
    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ArtifactUploader for MemoryUploader {
    fn upload(&self, artifact: &ExportArtifact) -> Result<String, UploadError> {
        if let Some(message) = &self.failure {
            return Err(UploadError::Rejected(message.clone()));
        }
        self.uploaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(artifact.filename.clone());
        Ok(format!("https://uploads.test/{}", artifact.filename))
    }
}
