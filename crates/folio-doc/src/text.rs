//! Plain-text projection of a document.
//!
//! Text leaves are concatenated in document order. Adjacent textblocks are
//! separated by a single `\n` and hard breaks contribute `\n`, so offsets in
//! the projection map back to exactly one textblock (or to a separator).
//! All offsets are byte offsets into [`TextProjection::text`].

use crate::node::{Node, NodeId, NodeKind};

/// Byte range of one textblock inside the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub id: NodeId,
    pub start: usize,
    pub end: usize,
}

/// Plain text of a document plus the textblock layout behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextProjection {
    text: String,
    blocks: Vec<BlockSpan>,
}

impl TextProjection {
    /// Project `root` and all its descendants.
    #[must_use]
    pub fn of(root: &Node) -> Self {
        let mut projection = Self::default();
        projection.visit(root);
        projection
    }

    fn visit(&mut self, node: &Node) {
        if node.kind.is_textblock() {
            if !self.blocks.is_empty() {
                self.text.push('\n');
            }
            let start = self.text.len();
            self.text.push_str(&node.text_content());
            self.blocks.push(BlockSpan {
                id: node.id(),
                start,
                end: self.text.len(),
            });
            return;
        }
        for child in &node.children {
            self.visit(child);
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    #[must_use]
    pub fn blocks(&self) -> &[BlockSpan] {
        &self.blocks
    }

    /// Textblock fully containing `from..to`, if any.
    #[must_use]
    pub fn block_for(&self, from: usize, to: usize) -> Option<&BlockSpan> {
        // Block starts are strictly increasing, so the candidate is the last
        // block starting at or before `from`.
        let idx = self.blocks.partition_point(|b| b.start <= from);
        let block = self.blocks.get(idx.checked_sub(1)?)?;
        (to <= block.end && from <= to).then_some(block)
    }
}

/// Length an inline node contributes to the projection.
pub(crate) fn inline_len(node: &Node) -> usize {
    match &node.kind {
        NodeKind::Text { text, .. } => text.len(),
        NodeKind::HardBreak => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Document;

    #[test]
    fn test_projection_separates_blocks() {
        let doc = Document::parse("<h1>Title</h1><p>one<br />two</p><ul><li>item</li></ul>").unwrap();
        let projection = doc.projection();
        assert_eq!(projection.text(), "Title\none\ntwo\nitem");
        let spans: Vec<_> = projection.blocks().iter().map(|b| (b.start, b.end)).collect();
        assert_eq!(spans, vec![(0, 5), (6, 13), (14, 18)]);
    }

    #[test]
    fn test_projection_includes_text_boxes() {
        let doc = Document::parse(
            r#"<p>before</p><div data-type="text-box"><div class="text-box-content"><p>boxed</p></div></div>"#,
        )
        .unwrap();
        assert_eq!(doc.text(), "before\nboxed");
    }

    #[test]
    fn test_block_for() {
        let doc = Document::parse("<p>abc</p><p>def</p>").unwrap();
        let projection = doc.projection();
        assert_eq!(projection.block_for(0, 3).map(|b| b.start), Some(0));
        assert_eq!(projection.block_for(4, 6).map(|b| b.start), Some(4));
        assert_eq!(projection.block_for(2, 5), None);
        assert_eq!(projection.block_for(3, 4), None);
    }

    #[test]
    fn test_empty_paragraph_still_separates() {
        let doc = Document::parse("<p>a</p><p></p><p>b</p>").unwrap();
        assert_eq!(doc.text(), "a\n\nb");
    }
}
