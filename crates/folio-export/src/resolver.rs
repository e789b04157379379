//! Export-time resolution of `{{qrcode:...}}` placeholders.
//!
//! Only text content is scanned. Tags, attribute values and comments are
//! copied through untouched, so a token inside `data-title="..."` stays
//! literal while the rendered title text next to it is resolved. A token whose
//! text is split by inline tags is matched on the tag-free text; the image
//! takes the token's place and the crossed tags are kept, so the markup stays
//! balanced. Tokens that fail to encode are replaced with a visible error
//! marker and reported.

use std::sync::LazyLock;

use folio_doc::{escape_html, unescape_html};
use regex::Regex;

use crate::qr::{QrCodeEncoder, QrEncoder, svg_data_uri};

static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\{\{qrcode:(.*?)\}\}").expect("invalid placeholder regex")
});

/// A placeholder that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderFailure {
    /// Zero-based position of the token among all tokens in the body.
    pub index: usize,
    /// Decoded payload.
    pub payload: String,
    pub message: String,
}

/// Markup with placeholders replaced, plus what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub html: String,
    /// Number of tokens replaced with an image.
    pub resolved: usize,
    pub failures: Vec<PlaceholderFailure>,
}

impl Resolution {
    /// Returns `true` if every token was replaced with an image.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Replaces QR placeholders with inline SVG images.
pub struct PlaceholderResolver {
    encoder: Box<dyn QrEncoder>,
}

impl Default for PlaceholderResolver {
    fn default() -> Self {
        Self::new(QrCodeEncoder::default())
    }
}

impl PlaceholderResolver {
    #[must_use]
    pub fn new(encoder: impl QrEncoder + 'static) -> Self {
        Self {
            encoder: Box::new(encoder),
        }
    }

    /// Resolve every placeholder in the text content of `html`.
    #[must_use]
    pub fn resolve(&self, html: &str) -> Resolution {
        let segments = split_markup(html);
        let text: String = segments
            .iter()
            .filter(|seg| !seg.is_tag)
            .map(|seg| &html[seg.start..seg.end])
            .collect();

        let mut resolved = 0;
        let mut failures = Vec::new();
        let replacements: Vec<Replacement> = PLACEHOLDER_PATTERN
            .captures_iter(&text)
            .enumerate()
            .map(|(index, caps)| {
                let span = caps.get(0).map_or(0..0, |m| m.range());
                let payload = unescape_html(caps[1].trim());
                let html = match self.encoder.encode_svg(&payload) {
                    Ok(svg) => {
                        resolved += 1;
                        format!(
                            r#"<img class="qrcode" src="{}" alt="{}" />"#,
                            svg_data_uri(&svg),
                            escape_html(&payload)
                        )
                    }
                    Err(e) => {
                        let message = e.to_string();
                        tracing::warn!(
                            index,
                            payload = %payload,
                            error = %message,
                            "QR placeholder not resolved"
                        );
                        let marker = error_marker(&message);
                        failures.push(PlaceholderFailure {
                            index,
                            payload,
                            message,
                        });
                        marker
                    }
                };
                Replacement {
                    start: span.start,
                    end: span.end,
                    html,
                }
            })
            .collect();

        if replacements.is_empty() {
            return Resolution {
                html: html.to_owned(),
                resolved,
                failures,
            };
        }
        tracing::debug!(
            tokens = replacements.len(),
            resolved,
            "Resolved QR placeholders"
        );

        Resolution {
            html: splice(html, &segments, &text, &replacements),
            resolved,
            failures,
        }
    }
}

/// A token's span in the tag-free text and the markup that replaces it.
struct Replacement {
    start: usize,
    end: usize,
    html: String,
}

/// A byte range of the markup that is either one tag or a run of text.
struct Segment {
    start: usize,
    end: usize,
    is_tag: bool,
}

/// Split markup into tags (including comments) and the text between them.
/// A `<` that does not open a tag is text.
fn split_markup(html: &str) -> Vec<Segment> {
    let bytes = html.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = html[pos..].find('<') {
        let open = pos + offset;
        let Some(close) = tag_end(html, open) else {
            pos = open + 1;
            continue;
        };
        if open > text_start {
            segments.push(Segment {
                start: text_start,
                end: open,
                is_tag: false,
            });
        }
        segments.push(Segment {
            start: open,
            end: close,
            is_tag: true,
        });
        text_start = close;
        pos = close;
    }
    if text_start < bytes.len() {
        segments.push(Segment {
            start: text_start,
            end: bytes.len(),
            is_tag: false,
        });
    }
    segments
}

/// End offset (exclusive) of the tag opening at `open`, honoring quoted
/// attribute values. `None` if `open` does not start a complete tag.
fn tag_end(html: &str, open: usize) -> Option<usize> {
    let rest = &html[open..];
    if rest.starts_with("<!--") {
        return rest.find("-->").map(|i| open + i + 3);
    }
    let first = rest.as_bytes().get(1).copied()?;
    if !(first.is_ascii_alphabetic() || matches!(first, b'/' | b'!' | b'?')) {
        return None;
    }

    let mut quote = None;
    for (i, b) in rest.bytes().enumerate().skip(1) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(open + i + 1),
            _ => {}
        }
    }
    None
}

/// Rebuild the markup, replacing token text and keeping every tag.
fn splice(html: &str, segments: &[Segment], text: &str, replacements: &[Replacement]) -> String {
    let mut out = String::with_capacity(html.len());
    let mut next = 0;
    let mut text_pos = 0;

    for seg in segments {
        if seg.is_tag {
            out.push_str(&html[seg.start..seg.end]);
            continue;
        }
        let seg_end = text_pos + (seg.end - seg.start);
        while text_pos < seg_end {
            while replacements.get(next).is_some_and(|r| r.end <= text_pos) {
                next += 1;
            }
            match replacements.get(next) {
                Some(rep) if rep.start < seg_end => {
                    if rep.start > text_pos {
                        out.push_str(&text[text_pos..rep.start]);
                        text_pos = rep.start;
                    }
                    if text_pos == rep.start {
                        out.push_str(&rep.html);
                    }
                    text_pos = rep.end.min(seg_end);
                }
                _ => {
                    out.push_str(&text[text_pos..seg_end]);
                    text_pos = seg_end;
                }
            }
        }
    }
    out
}

fn error_marker(message: &str) -> String {
    format!(
        r#"<span class="qrcode-error">QR code unavailable: {}</span>"#,
        escape_html(message)
    )
}
