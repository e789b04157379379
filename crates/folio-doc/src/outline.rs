//! Table of contents derived from document headings.

use std::collections::HashSet;
use std::fmt::Write;

use crate::document::{Command, Document};
use crate::error::EditError;
use crate::node::{NodeId, NodeKind};
use crate::util::{escape_html, slugify};

/// Deepest heading level included in the outline.
pub const MAX_OUTLINE_LEVEL: u8 = 4;

/// Text of the entry shown when a document has no headings.
pub const NO_HEADINGS_TEXT: &str = "No headings";

/// One line of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TocEntry {
    /// Heading level (1-4).
    pub level: u8,
    /// Display text.
    pub text: String,
    /// Anchor id of the heading (empty for the placeholder).
    pub anchor_id: String,
    /// Nesting depth, `level - 1`.
    pub indent: u8,
    /// Set on the single entry shown for a document without headings.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "std::ops::Not::not"))]
    pub placeholder: bool,
}

impl TocEntry {
    fn placeholder() -> Self {
        Self {
            level: 1,
            text: NO_HEADINGS_TEXT.to_owned(),
            anchor_id: String::new(),
            indent: 0,
            placeholder: true,
        }
    }
}

/// Table of contents of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Outline {
    entries: Vec<TocEntry>,
}

impl Outline {
    #[must_use]
    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    /// Returns `true` if the outline only holds the "no headings" placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.entries.iter().all(|e| e.placeholder)
    }

    /// Render as a nested `<nav class="toc">` list of anchor links.
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut out = String::from(r#"<nav class="toc">"#);
        if self.is_placeholder() {
            out.push_str(r#"<p class="toc-empty">"#);
            out.push_str(NO_HEADINGS_TEXT);
            out.push_str("</p></nav>");
            return out;
        }

        // One flag per open <ul>: whether it currently has an open <li>.
        let mut levels: Vec<bool> = Vec::new();
        for entry in &self.entries {
            let target = usize::from(entry.indent) + 1;
            while levels.len() > target {
                close_level(&mut levels, &mut out);
            }
            if levels.len() == target
                && let Some(open) = levels.last_mut()
                && *open
            {
                out.push_str("</li>");
                *open = false;
            }
            while levels.len() < target {
                out.push_str("<ul>");
                levels.push(false);
            }
            write!(
                out,
                r##"<li class="toc-level-{}"><a href="#{}">{}</a>"##,
                entry.level,
                escape_html(&entry.anchor_id),
                escape_html(&entry.text)
            )
            .unwrap();
            if let Some(open) = levels.last_mut() {
                *open = true;
            }
        }
        while !levels.is_empty() {
            close_level(&mut levels, &mut out);
        }
        out.push_str("</nav>");
        out
    }
}

fn close_level(levels: &mut Vec<bool>, out: &mut String) {
    if levels.pop() == Some(true) {
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

/// Build the outline of `doc`, persisting synthesized anchors onto headings.
///
/// Headings that already carry an anchor keep it, so a second call on an
/// unchanged document yields the same outline and issues no commands. On a
/// read-only document the anchors are still synthesized but not stored.
pub fn build_outline(doc: &mut Document) -> Outline {
    let headings: Vec<(NodeId, u8, String, Option<String>)> = doc
        .root()
        .descendants()
        .filter_map(|node| match &node.kind {
            NodeKind::Heading { level, anchor } if (1..=MAX_OUTLINE_LEVEL).contains(level) => {
                Some((node.id(), *level, node.text_content(), anchor.clone()))
            }
            _ => None,
        })
        .collect();

    if headings.is_empty() {
        return Outline {
            entries: vec![TocEntry::placeholder()],
        };
    }

    let mut taken = doc.heading_anchors();
    let mut entries = Vec::with_capacity(headings.len());

    for (ordinal, (id, level, raw_text, anchor)) in (1..).zip(headings) {
        let trimmed = raw_text.trim();
        let text = if trimmed.is_empty() {
            format!("Section {ordinal}")
        } else {
            trimmed.to_owned()
        };

        let anchor_id = match anchor.filter(|a| !a.is_empty()) {
            Some(existing) => existing,
            None => {
                let anchor = unique_anchor(trimmed, ordinal, &mut taken);
                persist_anchor(doc, id, &anchor);
                anchor
            }
        };

        entries.push(TocEntry {
            level,
            text,
            anchor_id,
            indent: level - 1,
            placeholder: false,
        });
    }

    Outline { entries }
}

fn unique_anchor(text: &str, ordinal: usize, taken: &mut HashSet<String>) -> String {
    let mut base = slugify(text);
    if base.is_empty() {
        base = format!("section-{ordinal}");
    }
    let mut candidate = base.clone();
    let mut suffix = 1;
    while taken.contains(&candidate) {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

fn persist_anchor(doc: &mut Document, node: NodeId, anchor: &str) {
    let command = Command::SetHeadingAnchor {
        node,
        anchor: anchor.to_owned(),
    };
    match doc.apply(command) {
        Ok(_) => {}
        Err(EditError::ReadOnly) => {
            tracing::debug!(%node, anchor, "Document is read-only, anchor not persisted");
        }
        Err(e) => {
            tracing::warn!(%node, anchor, error = %e, "Failed to persist heading anchor");
        }
    }
}
