//! The document and its command interface.
//!
//! Every mutation goes through [`Document::apply`]. A command either commits
//! completely and bumps the version, or fails and leaves the tree untouched.

use std::collections::HashSet;

use crate::block::{AttrPatch, CanvasPolicy, TextBoxAttrs};
use crate::error::{EditError, MarkupError};
use crate::markup::{finish_inlines, parse_blocks, serialize_blocks};
use crate::node::{IdGen, Node, NodeId, NodeKind};
use crate::text::{TextProjection, inline_len};

/// A mutation of the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert a text box after the block holding the cursor.
    InsertTextBox { attrs: AttrPatch },
    /// Merge a patch into a text box's attributes.
    UpdateAttrs { node: NodeId, patch: AttrPatch },
    RemoveTextBox { node: NodeId },
    /// Replace a byte range of the text projection.
    ReplaceText { from: usize, to: usize, text: String },
    SetHeadingAnchor { node: NodeId, anchor: String },
    /// Replace the whole content.
    SetContent { nodes: Vec<Node> },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::InsertTextBox { .. } => "insert_text_box",
            Self::UpdateAttrs { .. } => "update_attrs",
            Self::RemoveTextBox { .. } => "remove_text_box",
            Self::ReplaceText { .. } => "replace_text",
            Self::SetHeadingAnchor { .. } => "set_heading_anchor",
            Self::SetContent { .. } => "set_content",
        }
    }
}

/// Result of a committed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    /// Document version after the command.
    pub version: u64,
    /// Node created or affected by the command, if there is a single one.
    pub node: Option<NodeId>,
}

/// A structured document.
#[derive(Debug)]
pub struct Document {
    root: Node,
    ids: IdGen,
    version: u64,
    cursor: Option<NodeId>,
    read_only: bool,
    canvas: CanvasPolicy,
}

impl Default for Document {
    fn default() -> Self {
        Self::from_nodes(Vec::new())
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from markup.
    pub fn parse(markup: &str) -> Result<Self, MarkupError> {
        Ok(Self::from_nodes(parse_blocks(markup)?))
    }

    /// Build a document from top-level blocks, assigning fresh ids.
    #[must_use]
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut ids = IdGen::new();
        let mut root = Node::new(NodeKind::Document).with_children(nodes);
        ids.assign(&mut root);
        Self {
            root,
            ids,
            version: 0,
            cursor: None,
            read_only: false,
            canvas: CanvasPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn with_canvas(mut self, canvas: CanvasPolicy) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[must_use]
    pub fn canvas(&self) -> CanvasPolicy {
        self.canvas
    }

    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of committed commands.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.root.find(id)
    }

    /// Serialize the document to markup.
    #[must_use]
    pub fn to_markup(&self) -> String {
        serialize_blocks(&self.root.children)
    }

    #[must_use]
    pub fn projection(&self) -> TextProjection {
        TextProjection::of(&self.root)
    }

    /// Plain-text projection.
    #[must_use]
    pub fn text(&self) -> String {
        self.projection().into_text()
    }

    /// All text boxes in document order.
    #[must_use]
    pub fn text_boxes(&self) -> Vec<(NodeId, &TextBoxAttrs)> {
        self.root
            .descendants()
            .filter_map(|n| match &n.kind {
                NodeKind::TextBox(attrs) => Some((n.id(), attrs)),
                _ => None,
            })
            .collect()
    }

    /// Anchors already carried by headings.
    #[must_use]
    pub fn heading_anchors(&self) -> HashSet<String> {
        self.root
            .descendants()
            .filter_map(|n| match &n.kind {
                NodeKind::Heading {
                    anchor: Some(anchor),
                    ..
                } => Some(anchor.clone()),
                _ => None,
            })
            .collect()
    }

    /// Place the cursor inside the node with `id`. `None` means end of document.
    pub fn set_cursor(&mut self, id: Option<NodeId>) {
        self.cursor = id.filter(|id| self.root.find(*id).is_some());
    }

    /// Place the cursor at a byte offset of the text projection.
    ///
    /// Offsets past the last textblock put the cursor at the end.
    pub fn set_cursor_offset(&mut self, offset: usize) {
        let projection = self.projection();
        self.cursor = projection
            .blocks()
            .iter()
            .find(|b| offset <= b.end)
            .map(|b| b.id);
    }

    #[must_use]
    pub fn cursor(&self) -> Option<NodeId> {
        self.cursor
    }

    /// Insert a text box at the cursor. Returns the new node's id.
    pub fn insert_text_box(&mut self, attrs: AttrPatch) -> Result<NodeId, EditError> {
        let change = self.apply(Command::InsertTextBox { attrs })?;
        Ok(change.node.unwrap_or(NodeId::UNASSIGNED))
    }

    pub fn update_attrs(&mut self, node: NodeId, patch: AttrPatch) -> Result<(), EditError> {
        self.apply(Command::UpdateAttrs { node, patch }).map(|_| ())
    }

    pub fn remove_text_box(&mut self, node: NodeId) -> Result<(), EditError> {
        self.apply(Command::RemoveTextBox { node }).map(|_| ())
    }

    pub fn replace_text(&mut self, from: usize, to: usize, text: &str) -> Result<(), EditError> {
        self.apply(Command::ReplaceText {
            from,
            to,
            text: text.to_owned(),
        })
        .map(|_| ())
    }

    /// Apply a command.
    pub fn apply(&mut self, command: Command) -> Result<Change, EditError> {
        if self.read_only {
            return Err(EditError::ReadOnly);
        }
        let name = command.name();
        let node = match command {
            Command::InsertTextBox { attrs } => Some(self.do_insert_text_box(&attrs)?),
            Command::UpdateAttrs { node, patch } => {
                self.do_update_attrs(node, &patch)?;
                Some(node)
            }
            Command::RemoveTextBox { node } => {
                self.do_remove_text_box(node)?;
                None
            }
            Command::ReplaceText { from, to, text } => Some(self.do_replace_text(from, to, &text)?),
            Command::SetHeadingAnchor { node, anchor } => {
                self.do_set_anchor(node, anchor)?;
                Some(node)
            }
            Command::SetContent { nodes } => {
                let mut root = Node::new(NodeKind::Document).with_children(nodes);
                self.ids.assign(&mut root);
                self.root = root;
                self.cursor = None;
                None
            }
        };
        self.version += 1;
        tracing::debug!(command = name, version = self.version, "Applied document command");
        Ok(Change {
            version: self.version,
            node,
        })
    }

    fn do_insert_text_box(&mut self, patch: &AttrPatch) -> Result<NodeId, EditError> {
        let attrs = self.canvas.apply(TextBoxAttrs::from_patch(patch)?);
        let mut node =
            Node::new(NodeKind::TextBox(attrs)).with_children(vec![Node::new(NodeKind::Paragraph)]);
        self.ids.assign(&mut node);
        let id = node.id();

        let index = self
            .cursor
            .and_then(|cursor| self.root.path_to(cursor))
            .and_then(|path| path.first().map(|top| top + 1))
            .unwrap_or(self.root.children.len());
        self.root.children.insert(index, node);
        Ok(id)
    }

    fn do_update_attrs(&mut self, id: NodeId, patch: &AttrPatch) -> Result<(), EditError> {
        let canvas = self.canvas;
        let node = self.root.find_mut(id).ok_or(EditError::NodeNotFound(id))?;
        let NodeKind::TextBox(attrs) = &mut node.kind else {
            return Err(EditError::NotATextBox {
                id,
                kind: node.kind.type_name(),
            });
        };
        *attrs = canvas.apply(attrs.merged(patch)?);
        Ok(())
    }

    fn do_remove_text_box(&mut self, id: NodeId) -> Result<(), EditError> {
        let node = self.root.find(id).ok_or(EditError::NodeNotFound(id))?;
        if !matches!(node.kind, NodeKind::TextBox(_)) {
            return Err(EditError::NotATextBox {
                id,
                kind: node.kind.type_name(),
            });
        }
        let removed = self.root.remove_descendant(id);
        if let (Some(removed), Some(cursor)) = (&removed, self.cursor)
            && removed.find(cursor).is_some()
        {
            self.cursor = None;
        }
        Ok(())
    }

    fn do_set_anchor(&mut self, id: NodeId, anchor: String) -> Result<(), EditError> {
        let node = self.root.find_mut(id).ok_or(EditError::NodeNotFound(id))?;
        let NodeKind::Heading { anchor: slot, .. } = &mut node.kind else {
            return Err(EditError::NotAHeading {
                id,
                kind: node.kind.type_name(),
            });
        };
        *slot = Some(anchor);
        Ok(())
    }

    fn do_replace_text(&mut self, from: usize, to: usize, text: &str) -> Result<NodeId, EditError> {
        let invalid = |reason| EditError::InvalidRange { from, to, reason };
        let projection = self.projection();
        let full = projection.text();
        if from > to || to > full.len() {
            return Err(invalid("out of bounds"));
        }
        if !full.is_char_boundary(from) || !full.is_char_boundary(to) {
            return Err(invalid("not on a character boundary"));
        }
        let span = *projection
            .block_for(from, to)
            .ok_or_else(|| invalid("range is not inside a single text block"))?;

        let block = self
            .root
            .find_mut(span.id)
            .ok_or(EditError::NodeNotFound(span.id))?;
        let children = std::mem::take(&mut block.children);
        let mut spliced = splice_inline(children, from - span.start, to - span.start, text);
        for node in &mut spliced {
            if node.id().is_unassigned() {
                self.ids.assign(node);
            }
        }
        block.children = spliced;
        Ok(span.id)
    }
}

/// Replace `from..to` (local to one textblock) with `replacement`.
///
/// The replacement lands in the first text run touching `from` and takes its
/// marks. Runs emptied by the edit are dropped, and breaks or images inside
/// the range are removed.
fn splice_inline(children: Vec<Node>, from: usize, to: usize, replacement: &str) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len() + 1);
    let mut pos = 0;
    let mut inserted = replacement.is_empty();
    let mut insert_at = None;

    for mut child in children {
        let start = pos;
        let end = pos + inline_len(&child);
        pos = end;

        if !inserted && insert_at.is_none() && start >= from {
            insert_at = Some(out.len());
        }

        match &mut child.kind {
            NodeKind::Text { text, .. } => {
                if !inserted && start <= from && from <= end {
                    let keep_from = to.min(end) - start;
                    let mut next = String::with_capacity(text.len() + replacement.len());
                    next.push_str(&text[..from - start]);
                    next.push_str(replacement);
                    next.push_str(&text[keep_from..]);
                    *text = next;
                    inserted = true;
                } else if start < to && end > from {
                    let cut_from = from.max(start) - start;
                    let cut_to = to.min(end) - start;
                    text.replace_range(cut_from..cut_to, "");
                }
                if text.is_empty() {
                    continue;
                }
            }
            _ => {
                if from < to && start >= from && end <= to && start < to {
                    continue;
                }
            }
        }
        out.push(child);
    }

    if !inserted {
        let at = insert_at.unwrap_or(out.len()).min(out.len());
        out.insert(at, Node::text(replacement));
    }
    finish_inlines(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::block::GeometryError;
    use crate::node::Mark;

    fn box_attrs(doc: &Document, id: NodeId) -> TextBoxAttrs {
        match &doc.node(id).unwrap().kind {
            NodeKind::TextBox(attrs) => attrs.clone(),
            other => panic!("expected text box, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_serialize_roundtrip() {
        let markup = r#"<h1 id="a">A</h1><p>x <em>y</em></p><div data-type="text-box" data-x="1" data-y="2" data-w="3" data-h="4"><div class="text-box-content"><p>z</p></div></div>"#;
        let doc = Document::parse(markup).unwrap();
        let again = Document::parse(&doc.to_markup()).unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn test_insert_text_box_at_end_with_defaults() {
        let mut doc = Document::parse("<p>one</p>").unwrap();
        let id = doc.insert_text_box(AttrPatch::default()).unwrap();
        assert_eq!(doc.root().children[1].id(), id);
        let attrs = box_attrs(&doc, id);
        assert_eq!((attrs.x, attrs.y, attrs.w, attrs.h), (40.0, 40.0, 260.0, 140.0));
        assert_eq!(doc.node(id).unwrap().children, vec![Node::new(NodeKind::Paragraph)]);
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn test_insert_text_box_after_cursor_block() {
        let mut doc = Document::parse("<p>one</p><p>two</p><p>three</p>").unwrap();
        doc.set_cursor_offset(5);
        let id = doc.insert_text_box(AttrPatch::position(0.0, 0.0)).unwrap();
        assert_eq!(doc.root().children[2].id(), id);
    }

    #[test]
    fn test_insert_into_empty_document() {
        let mut doc = Document::new();
        let id = doc.insert_text_box(AttrPatch::default()).unwrap();
        assert_eq!(doc.text_boxes().len(), 1);
        assert_eq!(doc.text_boxes()[0].0, id);
    }

    #[test]
    fn test_insert_read_only_fails() {
        let mut doc = Document::parse("<p>x</p>").unwrap().with_read_only(true);
        let before = doc.to_markup();
        assert_eq!(
            doc.insert_text_box(AttrPatch::default()),
            Err(EditError::ReadOnly)
        );
        assert_eq!(doc.to_markup(), before);
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_update_attrs_atomic() {
        let mut doc = Document::new();
        let id = doc.insert_text_box(AttrPatch::default()).unwrap();
        doc.update_attrs(id, AttrPatch::geometry(10.0, 20.0, 100.0, 50.0))
            .unwrap();
        let attrs = box_attrs(&doc, id);
        assert_eq!((attrs.x, attrs.y, attrs.w, attrs.h), (10.0, 20.0, 100.0, 50.0));
    }

    #[test]
    fn test_invalid_geometry_leaves_document_unchanged() {
        let mut doc = Document::new();
        let id = doc.insert_text_box(AttrPatch::default()).unwrap();
        let before = doc.to_markup();
        let patch = AttrPatch {
            x: Some(5.0),
            w: Some(0.0),
            ..AttrPatch::default()
        };
        assert_eq!(
            doc.update_attrs(id, patch),
            Err(EditError::InvalidGeometry(GeometryError::NonPositive {
                field: "w",
                value: 0.0
            }))
        );
        assert_eq!(doc.to_markup(), before);
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn test_update_attrs_unknown_and_wrong_kind() {
        let mut doc = Document::parse("<p>x</p>").unwrap();
        let para = doc.root().children[0].id();
        assert!(matches!(
            doc.update_attrs(para, AttrPatch::default()),
            Err(EditError::NotATextBox { kind: "paragraph", .. })
        ));
        let missing = NodeId::new(999);
        assert_eq!(
            doc.update_attrs(missing, AttrPatch::default()),
            Err(EditError::NodeNotFound(missing))
        );
    }

    #[test]
    fn test_clamp_canvas_policy() {
        let mut doc = Document::new().with_canvas(CanvasPolicy::Clamp {
            width: 500.0,
            height: 400.0,
        });
        let id = doc.insert_text_box(AttrPatch::default()).unwrap();
        doc.update_attrs(id, AttrPatch::position(1000.0, -50.0)).unwrap();
        let attrs = box_attrs(&doc, id);
        assert_eq!((attrs.x, attrs.y), (240.0, 0.0));
    }

    #[test]
    fn test_remove_text_box() {
        let mut doc = Document::parse("<p>a</p>").unwrap();
        let id = doc.insert_text_box(AttrPatch::default()).unwrap();
        doc.remove_text_box(id).unwrap();
        assert!(doc.text_boxes().is_empty());
        assert_eq!(doc.to_markup(), "<p>a</p>");
    }

    #[test]
    fn test_replace_text_within_run() {
        let mut doc = Document::parse("<p>hello world</p>").unwrap();
        doc.replace_text(6, 11, "there").unwrap();
        assert_eq!(doc.to_markup(), "<p>hello there</p>");
    }

    #[test]
    fn test_replace_text_across_marked_runs() {
        let mut doc = Document::parse("<p>ab<strong>cd</strong>ef</p>").unwrap();
        doc.replace_text(1, 5, "X").unwrap();
        assert_eq!(doc.to_markup(), "<p>aXf</p>");
    }

    #[test]
    fn test_replace_text_inherits_marks() {
        let mut doc = Document::parse("<p>a<em>bc</em></p>").unwrap();
        doc.replace_text(2, 3, "Z").unwrap();
        let para = &doc.root().children[0];
        assert_eq!(
            para.children[1].kind,
            NodeKind::Text {
                text: "bZ".to_owned(),
                marks: vec![Mark::Italic]
            }
        );
    }

    #[test]
    fn test_replace_text_delete() {
        let mut doc = Document::parse("<p>abc</p>").unwrap();
        doc.replace_text(0, 3, "").unwrap();
        assert_eq!(doc.to_markup(), "<p></p>");
    }

    #[test]
    fn test_replace_text_into_empty_paragraph() {
        let mut doc = Document::parse("<p></p>").unwrap();
        doc.replace_text(0, 0, "new").unwrap();
        assert_eq!(doc.to_markup(), "<p>new</p>");
    }

    #[test]
    fn test_replace_text_over_break() {
        let mut doc = Document::parse("<p>a<br />b</p>").unwrap();
        doc.replace_text(1, 3, "X").unwrap();
        assert_eq!(doc.to_markup(), "<p>aX</p>");
    }

    #[test]
    fn test_replace_text_rejects_cross_block() {
        let mut doc = Document::parse("<p>ab</p><p>cd</p>").unwrap();
        assert!(matches!(
            doc.replace_text(1, 4, "x"),
            Err(EditError::InvalidRange { .. })
        ));
        assert_eq!(doc.text(), "ab\ncd");
    }

    #[test]
    fn test_replace_text_rejects_char_boundary() {
        let mut doc = Document::parse("<p>é</p>").unwrap();
        assert!(matches!(
            doc.replace_text(0, 1, "x"),
            Err(EditError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_set_content_resets_cursor() {
        let mut doc = Document::parse("<p>a</p>").unwrap();
        doc.set_cursor_offset(0);
        doc.apply(Command::SetContent {
            nodes: vec![Node::paragraph("b")],
        })
        .unwrap();
        assert_eq!(doc.cursor(), None);
        assert_eq!(doc.text(), "b");
    }
}
