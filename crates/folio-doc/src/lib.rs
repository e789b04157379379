//! Structured document model for Folio.
//!
//! A [`Document`] is a tree of [`Node`]s drawn from a closed set of kinds,
//! including absolutely-positioned text boxes. Its durable form is an HTML
//! subset: [`Document::parse`] and [`Document::to_markup`] round-trip any tree
//! without loss.
//!
//! All edits go through [`Document::apply`] with a [`Command`], which either
//! commits completely or leaves the document untouched.
//!
//! # Example
//!
//! ```
//! use folio_doc::{AttrPatch, Document, build_outline};
//!
//! let mut doc = Document::parse("<h1>Intro</h1><p>Hello</p>").unwrap();
//! let id = doc.insert_text_box(AttrPatch::position(10.0, 20.0)).unwrap();
//! assert_eq!(doc.text_boxes()[0].0, id);
//!
//! let outline = build_outline(&mut doc);
//! assert_eq!(outline.entries()[0].anchor_id, "intro");
//! ```

mod block;
mod document;
mod error;
pub mod markup;
mod node;
mod outline;
mod text;
mod util;
mod view;

pub use block::{
    AttrPatch, CanvasPolicy, DEFAULT_BACKGROUND, DEFAULT_BORDER_COLOR, DEFAULT_HEIGHT,
    DEFAULT_WIDTH, DEFAULT_X, DEFAULT_Y, GeometryError, TextBoxAttrs,
};
pub use document::{Change, Command, Document};
pub use error::{EditError, MarkupError};
pub use markup::unescape_html;
pub use node::{Descendants, Mark, Node, NodeId, NodeKind};
pub use outline::{MAX_OUTLINE_LEVEL, NO_HEADINGS_TEXT, Outline, TocEntry, build_outline};
pub use text::{BlockSpan, TextProjection};
pub use util::{escape_html, slugify};
pub use view::{BlockView, DragBounds, ResizeHandle, ViewEvent, interactive_view};
