//! Interactive views over positionable blocks.
//!
//! A view is a detached description of a draggable, resizable wrapper. It
//! copies what it needs from the node and reports user gestures as
//! [`ViewEvent`]s; the host applies them through the document's command
//! interface.

use crate::block::{AttrPatch, CanvasPolicy, TextBoxAttrs};
use crate::node::{Node, NodeId, NodeKind};

/// Edge or corner grabbed during a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    Top,
    Right,
    Bottom,
    Left,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeHandle {
    pub const ALL: [Self; 8] = [
        Self::Top,
        Self::Right,
        Self::Bottom,
        Self::Left,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Resizing from this handle moves the left edge.
    #[must_use]
    pub fn moves_left(self) -> bool {
        matches!(self, Self::Left | Self::TopLeft | Self::BottomLeft)
    }

    /// Resizing from this handle moves the top edge.
    #[must_use]
    pub fn moves_top(self) -> bool {
        matches!(self, Self::Top | Self::TopLeft | Self::TopRight)
    }
}

/// Attribute change produced by a gesture on a block view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEvent {
    pub node_id: NodeId,
    pub patch: AttrPatch,
}

/// Area a wrapper may be dragged or resized within.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragBounds {
    /// Parent size unknown; gestures land where they end.
    #[default]
    Unbounded,
    /// Confined to a parent container of this size.
    Parent { width: f64, height: f64 },
}

impl DragBounds {
    /// Shrink and shift `(x, y, w, h)` until it fits inside the parent.
    #[must_use]
    pub fn confine(self, x: f64, y: f64, w: f64, h: f64) -> (f64, f64, f64, f64) {
        match self {
            Self::Unbounded => (x, y, w, h),
            Self::Parent { width, height } => {
                let w = w.min(width);
                let h = h.min(height);
                (
                    x.clamp(0.0, (width - w).max(0.0)),
                    y.clamp(0.0, (height - h).max(0.0)),
                    w,
                    h,
                )
            }
        }
    }
}

impl From<CanvasPolicy> for DragBounds {
    fn from(policy: CanvasPolicy) -> Self {
        match policy {
            CanvasPolicy::Allow => Self::Unbounded,
            CanvasPolicy::Clamp { width, height } => Self::Parent { width, height },
        }
    }
}

/// Editable wrapper around a positionable block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockView {
    pub node_id: NodeId,
    pub attrs: TextBoxAttrs,
    pub bounds: DragBounds,
    /// Grid the wrapper snaps to while dragging and resizing.
    pub grid: Option<f64>,
    pub handles: &'static [ResizeHandle],
}

/// Build the interactive view for `node`.
///
/// Returns `None` when not editable or when the node has no interactive view.
#[must_use]
pub fn interactive_view(node: &Node, editable: bool) -> Option<BlockView> {
    if !editable {
        return None;
    }
    match &node.kind {
        NodeKind::TextBox(attrs) => Some(BlockView {
            node_id: node.id(),
            attrs: attrs.clone(),
            bounds: DragBounds::Unbounded,
            grid: attrs.snap_increment,
            handles: &ResizeHandle::ALL,
        }),
        NodeKind::Document
        | NodeKind::Paragraph
        | NodeKind::Heading { .. }
        | NodeKind::BulletList
        | NodeKind::OrderedList { .. }
        | NodeKind::ListItem
        | NodeKind::Blockquote
        | NodeKind::CodeBlock { .. }
        | NodeKind::Table
        | NodeKind::TableRow
        | NodeKind::TableCell { .. }
        | NodeKind::HorizontalRule
        | NodeKind::Image { .. }
        | NodeKind::HardBreak
        | NodeKind::Text { .. } => None,
    }
}

impl BlockView {
    #[must_use]
    pub fn within(mut self, bounds: DragBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Drag ended with the wrapper's origin at `x`, `y`.
    #[must_use]
    pub fn drag_stop(&self, x: f64, y: f64) -> ViewEvent {
        let (x, y, _, _) = self.bounds.confine(
            self.attrs.snap(x),
            self.attrs.snap(y),
            self.attrs.w,
            self.attrs.h,
        );
        ViewEvent {
            node_id: self.node_id,
            patch: AttrPatch::position(x, y),
        }
    }

    /// Resize ended with the wrapper at size `w` by `h`.
    ///
    /// Handles on the top or left edge keep the opposite edge fixed, so the
    /// origin shifts by the size change.
    #[must_use]
    pub fn resize_stop(&self, handle: ResizeHandle, w: f64, h: f64) -> ViewEvent {
        let w = self.attrs.snap_length(w);
        let h = self.attrs.snap_length(h);
        let x = if handle.moves_left() {
            self.attrs.snap(self.attrs.x + self.attrs.w - w)
        } else {
            self.attrs.x
        };
        let y = if handle.moves_top() {
            self.attrs.snap(self.attrs.y + self.attrs.h - h)
        } else {
            self.attrs.y
        };
        let (x, y, w, h) = self.bounds.confine(x, y, w, h);
        ViewEvent {
            node_id: self.node_id,
            patch: AttrPatch::geometry(x, y, w, h),
        }
    }
}
