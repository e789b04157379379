//! The export pipeline: resolve, assemble, render, deliver, upload.

use crate::artifact::{DEFAULT_FILE_STEM, ExportArtifact};
use crate::error::ExportError;
use crate::format::{ExportFormat, FormatRenderer, default_renderers};
use crate::resolver::{PlaceholderFailure, PlaceholderResolver};
use crate::shell::DocumentShell;
use crate::sink::ArtifactSink;
use crate::upload::{ArtifactUploader, UploadStatus};

/// Per-exporter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// File name without extension.
    pub file_stem: String,
    /// Export even when some placeholders failed to resolve.
    pub allow_incomplete: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_stem: DEFAULT_FILE_STEM.to_owned(),
            allow_incomplete: false,
        }
    }
}

/// What a successful export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub format: ExportFormat,
    pub filename: String,
    /// Where the sink put the artifact.
    pub location: String,
    /// Artifact size in bytes.
    pub size: usize,
    pub upload: UploadStatus,
    /// Problems worth telling the user about; none of them failed the export.
    pub warnings: Vec<String>,
    /// Set when placeholders were left unresolved.
    pub incomplete: bool,
    pub failures: Vec<PlaceholderFailure>,
}

/// Turns document markup into delivered artifacts.
///
/// Each call runs its own resolve, assemble and render sequence, so one
/// exporter can serve concurrent exports.
pub struct Exporter {
    resolver: PlaceholderResolver,
    shell: DocumentShell,
    renderers: Vec<Box<dyn FormatRenderer>>,
    sink: Box<dyn ArtifactSink>,
    uploader: Option<Box<dyn ArtifactUploader>>,
    options: ExportOptions,
}

impl Exporter {
    /// Create an exporter with the built-in renderers and no uploader.
    #[must_use]
    pub fn new(sink: impl ArtifactSink + 'static) -> Self {
        Self {
            resolver: PlaceholderResolver::default(),
            shell: DocumentShell::default(),
            renderers: default_renderers(),
            sink: Box::new(sink),
            uploader: None,
            options: ExportOptions::default(),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: PlaceholderResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_shell(mut self, shell: DocumentShell) -> Self {
        self.shell = shell;
        self
    }

    /// Use `renderer` for its format, replacing any renderer registered for it.
    #[must_use]
    pub fn with_renderer(mut self, renderer: impl FormatRenderer + 'static) -> Self {
        let format = renderer.format();
        self.renderers.retain(|r| r.format() != format);
        self.renderers.push(Box::new(renderer));
        self
    }

    #[must_use]
    pub fn with_uploader(mut self, uploader: impl ArtifactUploader + 'static) -> Self {
        self.uploader = Some(Box::new(uploader));
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export `body` markup as `format`.
    ///
    /// Fails before anything is delivered when placeholders are unresolved
    /// (unless allowed by the options) or rendering fails. Upload problems
    /// only add a warning to the report.
    pub fn export(&self, body: &str, format: ExportFormat) -> Result<ExportReport, ExportError> {
        let renderer = self
            .renderers
            .iter()
            .find(|r| r.format() == format)
            .ok_or(ExportError::NoRenderer(format))?;

        let resolution = self.resolver.resolve(body);
        let mut warnings = Vec::new();
        let incomplete = !resolution.is_complete();
        if incomplete {
            if !self.options.allow_incomplete {
                tracing::warn!(
                    %format,
                    failures = resolution.failures.len(),
                    "Export aborted, unresolved QR placeholders"
                );
                return Err(ExportError::Unresolved(resolution.failures));
            }
            warnings.push(format!(
                "{} QR placeholder(s) could not be resolved",
                resolution.failures.len()
            ));
        }

        let page = self.shell.assemble(&resolution.html);
        let bytes = renderer.render(&page)?;
        let artifact = ExportArtifact::new(bytes, &self.options.file_stem, format);
        let location = self.sink.deliver(&artifact)?;

        let upload = match &self.uploader {
            None => UploadStatus::Skipped,
            Some(uploader) => match uploader.upload(&artifact) {
                Ok(url) => UploadStatus::Uploaded(url),
                Err(e) => {
                    tracing::warn!(filename = %artifact.filename, error = %e, "Upload failed");
                    warnings.push(format!("upload failed: {e}"));
                    UploadStatus::Failed(e.to_string())
                }
            },
        };

        tracing::info!(
            %format,
            filename = %artifact.filename,
            size = artifact.len(),
            location = %location,
            "Exported document"
        );

        Ok(ExportReport {
            format,
            filename: artifact.filename,
            location,
            size: artifact.bytes.len(),
            upload,
            warnings,
            incomplete,
            failures: resolution.failures,
        })
    }

    /// Export `body` in every supported format, one result per format.
    pub fn export_all(&self, body: &str) -> Vec<(ExportFormat, Result<ExportReport, ExportError>)> {
        ExportFormat::ALL
            .into_iter()
            .map(|format| (format, self.export(body, format)))
            .collect()
    }
}
