//! Editing surface host for Folio documents.
//!
//! An [`Editor`] wraps a [`folio_doc::Document`] and keeps everything derived
//! from it in step: the table of contents is rebuilt after every change,
//! change listeners receive the new markup, and the search dialog session
//! rescans when its match list is out of date. Block views report drag and
//! resize gestures as [`folio_doc::ViewEvent`]s, which go back through
//! [`Editor::dispatch`] like any other edit.
//!
//! # Example
//!
//! ```
//! use folio_doc::{AttrPatch, Document};
//! use folio_editor::{Editor, EditorEvent, EditorOptions, Keymap};
//!
//! let keymap = Keymap::new();
//! let doc = Document::parse("<h1>Intro</h1>").unwrap();
//! let mut editor = Editor::mount(doc, &keymap, EditorOptions::default());
//!
//! let id = editor
//!     .dispatch(EditorEvent::InsertTextBox(AttrPatch::position(40.0, 40.0)))
//!     .unwrap()
//!     .unwrap();
//! let view = editor.view(id).unwrap();
//! editor.dispatch(view.drag_stop(120.0, 80.0).into()).unwrap();
//!
//! assert_eq!(editor.outline().entries()[0].anchor_id, "intro");
//! drop(editor);
//! assert!(keymap.is_empty());
//! ```

mod editor;
mod error;
mod shortcuts;

pub use editor::{Editor, EditorEvent, EditorOptions, KeyOutcome};
pub use error::EditorError;
pub use shortcuts::{
    DEFAULT_BINDINGS, Key, KeyChord, Keymap, ParseChordError, Shortcut, ShortcutScope,
};
