//! Export formats and their renderers.

use std::fmt;

use crate::error::RenderError;

/// Target format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Standalone HTML page.
    Html,
    /// Word-compatible HTML document.
    Word,
}

impl ExportFormat {
    /// Every supported format, in export order.
    pub const ALL: [Self; 2] = [Self::Html, Self::Word];

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Word => "doc",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Word => "application/msword",
        }
    }

    /// Parse a format name as accepted on the command line.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(Self::Html),
            "word" | "doc" => Some(Self::Word),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Html => "html",
            Self::Word => "word",
        })
    }
}

/// Turns an assembled HTML page into the bytes of one format.
pub trait FormatRenderer: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn render(&self, page: &str) -> Result<Vec<u8>, RenderError>;
}

/// Emits the page unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl FormatRenderer for HtmlRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn render(&self, page: &str) -> Result<Vec<u8>, RenderError> {
        Ok(page.as_bytes().to_vec())
    }
}

const OFFICE_NAMESPACES: &str = concat!(
    r#" xmlns:o="urn:schemas-microsoft-com:office:office""#,
    r#" xmlns:w="urn:schemas-microsoft-com:office:word""#,
    r#" xmlns="http://www.w3.org/TR/REC-html40""#,
);

const WORD_HEAD: &str = "\
<!--[if gte mso 9]><xml><w:WordDocument><w:View>Print</w:View><w:Zoom>100</w:Zoom><w:DoNotOptimizeForBrowser/></w:WordDocument></xml><![endif]-->
<style>
@page WordSection1 { size: 595.3pt 841.9pt; margin: 56.7pt 56.7pt 56.7pt 56.7pt; mso-header-margin: 35.4pt; mso-footer-margin: 35.4pt; }
div.WordSection1 { page: WordSection1; }
</style>
";

/// Rewrites the page into an HTML document Word opens as a `.doc`.
///
/// The output is still HTML text labelled `application/msword`, not a native
/// binary `.doc` or an OOXML `.docx` package. Word honors the Office markup
/// it carries; other word processors may fall back to plain HTML import.
///
/// Adds the Office namespaces to `<html>`, Word view settings and A4 page
/// setup to `<head>`, and wraps the body in a `WordSection1` section.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordRenderer;

impl FormatRenderer for WordRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Word
    }

    fn render(&self, page: &str) -> Result<Vec<u8>, RenderError> {
        let html_at = page
            .find("<html")
            .ok_or(RenderError::MalformedShell("<html>"))?
            + "<html".len();
        let head_end = page
            .find("</head>")
            .ok_or(RenderError::MalformedShell("</head>"))?;
        let body_open = page[head_end..]
            .find("<body")
            .and_then(|at| page[head_end + at..].find('>').map(|end| head_end + at + end + 1))
            .ok_or(RenderError::MalformedShell("<body>"))?;
        let body_close = page
            .rfind("</body>")
            .filter(|&at| at >= body_open)
            .ok_or(RenderError::MalformedShell("</body>"))?;

        let mut out = String::with_capacity(page.len() + WORD_HEAD.len() + 256);
        out.push_str(&page[..html_at]);
        out.push_str(OFFICE_NAMESPACES);
        out.push_str(&page[html_at..head_end]);
        out.push_str(WORD_HEAD);
        out.push_str(&page[head_end..body_open]);
        out.push_str("\n<div class=\"WordSection1\">");
        out.push_str(&page[body_open..body_close]);
        out.push_str("</div>\n");
        out.push_str(&page[body_close..]);
        Ok(out.into_bytes())
    }
}

/// The built-in renderers, one per format.
#[must_use]
pub fn default_renderers() -> Vec<Box<dyn FormatRenderer>> {
    vec![Box::new(HtmlRenderer), Box::new(WordRenderer)]
}
