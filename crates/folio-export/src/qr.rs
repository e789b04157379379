//! QR code encoding to inline SVG.

use std::fmt::Write;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use qrcode::{Color, QrCode};

use crate::error::QrError;

/// Default edge length of one QR module, in SVG user units.
pub const DEFAULT_MODULE_SIZE: usize = 4;

/// Default quiet-zone width, in modules.
pub const DEFAULT_MARGIN: usize = 4;

/// Turns a placeholder payload into an SVG image.
pub trait QrEncoder: Send + Sync {
    /// Encode `payload` as a standalone SVG document.
    fn encode_svg(&self, payload: &str) -> Result<String, QrError>;
}

/// [`QrEncoder`] backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrCodeEncoder {
    module_size: usize,
    margin: usize,
}

impl Default for QrCodeEncoder {
    fn default() -> Self {
        Self {
            module_size: DEFAULT_MODULE_SIZE,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl QrCodeEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the module edge length; zero is treated as one.
    #[must_use]
    pub fn with_module_size(mut self, module_size: usize) -> Self {
        self.module_size = module_size.max(1);
        self
    }

    #[must_use]
    pub fn with_margin(mut self, margin: usize) -> Self {
        self.margin = margin;
        self
    }
}

impl QrEncoder for QrCodeEncoder {
    fn encode_svg(&self, payload: &str) -> Result<String, QrError> {
        if payload.is_empty() {
            return Err(QrError::EmptyPayload);
        }
        let code = QrCode::new(payload.as_bytes()).map_err(|e| QrError::Encode(e.to_string()))?;
        let width = code.width();
        let scale = self.module_size;
        let size = (width + 2 * self.margin) * scale;

        let mut path = String::new();
        for (i, color) in code.to_colors().into_iter().enumerate() {
            if color != Color::Dark {
                continue;
            }
            let x = (i % width + self.margin) * scale;
            let y = (i / width + self.margin) * scale;
            write!(path, "M{x} {y}h{scale}v{scale}h-{scale}z").unwrap();
        }

        let mut svg = String::with_capacity(path.len() + 256);
        write!(
            svg,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}" shape-rendering="crispEdges"><rect width="{size}" height="{size}" fill="#ffffff"/><path fill="#000000" d="{path}"/></svg>"##
        )
        .unwrap();
        Ok(svg)
    }
}

/// Wrap an SVG document in a base64 `data:` URI.
#[must_use]
pub fn svg_data_uri(svg: &str) -> String {
    let base64 = BASE64_STANDARD.encode(svg.as_bytes());
    format!("data:image/svg+xml;base64,{base64}")
}
