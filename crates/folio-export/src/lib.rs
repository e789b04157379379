//! Export pipeline for Folio documents.
//!
//! [`Exporter::export`] takes the document markup and:
//!
//! 1. replaces `{{qrcode:...}}` placeholders with inline SVG images
//!    ([`PlaceholderResolver`]);
//! 2. wraps the result in a standalone page with header and footer
//!    ([`DocumentShell`]);
//! 3. renders the page for the target [`ExportFormat`] ([`FormatRenderer`]);
//! 4. hands the [`ExportArtifact`] to an [`ArtifactSink`];
//! 5. optionally uploads it through an [`ArtifactUploader`].
//!
//! # Features
//!
//! - `s3`: `S3Uploader` for S3-compatible object storage.
//! - `mock`: in-memory `MemorySink` and `MemoryUploader` for tests.
//!
//! # Example
//!
//! ```no_run
//! use folio_export::{DirectorySink, ExportFormat, Exporter};
//!
//! let exporter = Exporter::new(DirectorySink::new("downloads"));
//! let report = exporter
//!     .export("<p>{{qrcode:https://example.com}}</p>", ExportFormat::Word)
//!     .unwrap();
//! assert!(report.size > 0);
//! ```

mod artifact;
mod error;
mod exporter;
mod format;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod qr;
mod resolver;
#[cfg(feature = "s3")]
mod s3;
mod shell;
mod sink;
mod upload;

pub use artifact::{DEFAULT_FILE_STEM, ExportArtifact};
pub use error::{ExportError, QrError, RenderError, SinkError, UploadError};
pub use exporter::{ExportOptions, ExportReport, Exporter};
pub use format::{ExportFormat, FormatRenderer, HtmlRenderer, WordRenderer, default_renderers};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MemorySink, MemoryUploader};
pub use qr::{DEFAULT_MARGIN, DEFAULT_MODULE_SIZE, QrCodeEncoder, QrEncoder, svg_data_uri};
pub use resolver::{PlaceholderFailure, PlaceholderResolver, Resolution};
#[cfg(feature = "s3")]
pub use s3::{S3Config, S3Uploader};
pub use shell::{DEFAULT_TITLE, DocumentShell};
pub use sink::{ArtifactSink, DirectorySink};
pub use upload::{ArtifactUploader, UploadStatus};
