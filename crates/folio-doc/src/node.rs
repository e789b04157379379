//! Content node types.
//!
//! The schema is closed: every node is one [`NodeKind`] variant, and all
//! rendering and view dispatch happens through exhaustive `match`es over it.

use std::fmt;

use crate::block::TextBoxAttrs;

/// Transient node identity.
///
/// Assigned when a node enters a [`Document`](crate::Document) and never
/// serialized. Two trees that differ only in ids are considered equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Id carried by nodes built outside a document.
    pub const UNASSIGNED: Self = Self(0);

    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Returns `true` if the node was never attached to a document.
    #[must_use]
    pub fn is_unassigned(self) -> bool {
        self == Self::UNASSIGNED
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inline formatting applied to a text run.
///
/// Variant order is the canonical nesting order used by the serializer
/// (outermost first), so sorted mark lists round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mark {
    Link { href: String },
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
}

impl Mark {
    /// Markup tag name for this mark.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Link { .. } => "a",
            Self::Bold => "strong",
            Self::Italic => "em",
            Self::Underline => "u",
            Self::Strike => "s",
            Self::Code => "code",
        }
    }
}

/// Type and attributes of a content node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading {
        level: u8,
        /// Anchor id used by the outline; persisted as the `id` attribute.
        anchor: Option<String>,
    },
    BulletList,
    OrderedList {
        start: u32,
    },
    ListItem,
    Blockquote,
    CodeBlock {
        language: Option<String>,
    },
    Table,
    TableRow,
    TableCell {
        header: bool,
    },
    HorizontalRule,
    Image {
        src: String,
        alt: String,
        title: Option<String>,
    },
    HardBreak,
    Text {
        text: String,
        marks: Vec<Mark>,
    },
    TextBox(TextBoxAttrs),
}

impl NodeKind {
    /// Stable type identifier.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Paragraph => "paragraph",
            Self::Heading { .. } => "heading",
            Self::BulletList => "bullet_list",
            Self::OrderedList { .. } => "ordered_list",
            Self::ListItem => "list_item",
            Self::Blockquote => "blockquote",
            Self::CodeBlock { .. } => "code_block",
            Self::Table => "table",
            Self::TableRow => "table_row",
            Self::TableCell { .. } => "table_cell",
            Self::HorizontalRule => "horizontal_rule",
            Self::Image { .. } => "image",
            Self::HardBreak => "hard_break",
            Self::Text { .. } => "text",
            Self::TextBox(_) => "text_box",
        }
    }

    /// Blocks whose children are inline content (the units of the text projection).
    #[must_use]
    pub fn is_textblock(&self) -> bool {
        matches!(
            self,
            Self::Paragraph | Self::Heading { .. } | Self::CodeBlock { .. }
        )
    }

    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Self::Text { .. } | Self::HardBreak | Self::Image { .. }
        )
    }
}

/// A node in the document tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.children == other.children
    }
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::UNASSIGNED,
            kind,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Plain text run without marks.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text {
            text: text.into(),
            marks: Vec::new(),
        })
    }

    /// Paragraph containing a single plain text run (empty text yields an empty paragraph).
    #[must_use]
    pub fn paragraph(text: &str) -> Self {
        let children = if text.is_empty() {
            Vec::new()
        } else {
            vec![Self::text(text)]
        };
        Self::new(NodeKind::Paragraph).with_children(children)
    }

    #[must_use]
    pub fn heading(level: u8, text: &str) -> Self {
        let children = if text.is_empty() {
            Vec::new()
        } else {
            vec![Self::text(text)]
        };
        Self::new(NodeKind::Heading {
            level,
            anchor: None,
        })
        .with_children(children)
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Concatenated text of all descendant text runs. Hard breaks count as `\n`.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Text { text, .. } => out.push_str(text),
            NodeKind::HardBreak => out.push('\n'),
            _ => {
                for child in &self.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Pre-order traversal over this node and all descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Find a node by id.
    #[must_use]
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        self.descendants().find(|n| n.id == id)
    }

    /// Find a node by id, mutably.
    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Child-index path from this node to the node with `id`.
    #[must_use]
    pub fn path_to(&self, id: NodeId) -> Option<Vec<usize>> {
        if self.id == id {
            return Some(Vec::new());
        }
        self.children.iter().enumerate().find_map(|(i, child)| {
            child.path_to(id).map(|mut rest| {
                rest.insert(0, i);
                rest
            })
        })
    }

    /// Remove the descendant with `id`, returning it.
    pub(crate) fn remove_descendant(&mut self, id: NodeId) -> Option<Node> {
        if let Some(pos) = self.children.iter().position(|c| c.id == id) {
            return Some(self.children.remove(pos));
        }
        self.children
            .iter_mut()
            .find_map(|c| c.remove_descendant(id))
    }
}

/// Iterator returned by [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Sequential id allocator owned by a document.
#[derive(Debug)]
pub(crate) struct IdGen {
    next: u64,
}

impl IdGen {
    pub(crate) fn new() -> Self {
        Self { next: 1 }
    }

    pub(crate) fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next);
        self.next += 1;
        id
    }

    /// Assign fresh ids to `node` and every descendant.
    pub(crate) fn assign(&mut self, node: &mut Node) {
        node.id = self.next_id();
        for child in &mut node.children {
            self.assign(child);
        }
    }
}
