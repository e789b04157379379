//! `folio insert-box` and `folio move-box` command implementations.

use std::path::PathBuf;

use clap::Args;
use folio_config::Config;
use folio_doc::{AttrPatch, NodeId, ResizeHandle, TextBoxAttrs};
use folio_editor::{Editor, EditorEvent};

use super::{open_editor, save};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the insert-box command.
#[derive(Args)]
pub(crate) struct InsertBoxArgs {
    /// Document markup file.
    file: PathBuf,

    #[arg(long, default_value_t = 40.0)]
    x: f64,

    #[arg(long, default_value_t = 40.0)]
    y: f64,

    #[arg(long, default_value_t = 260.0)]
    width: f64,

    #[arg(long, default_value_t = 140.0)]
    height: f64,

    /// Title line shown above the box content.
    #[arg(long)]
    title: Option<String>,

    /// Snap grid for later moves (overrides `editor.snap_increment`).
    #[arg(long)]
    snap: Option<f64>,

    /// Lay the content out vertically.
    #[arg(long)]
    vertical: bool,

    /// Insert after this top-level block (0-based) instead of at the end.
    #[arg(long)]
    after: Option<usize>,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl InsertBoxArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let mut editor = open_editor(&self.file, &config)?;

        if let Some(index) = self.after {
            let block = top_level_block(&editor, index)?;
            editor.dispatch(EditorEvent::MoveCursor(Some(block)))?;
        }

        let mut patch = AttrPatch::geometry(self.x, self.y, self.width, self.height)
            .with_vertical(self.vertical);
        if let Some(title) = self.title {
            patch = patch.with_title(title);
        }
        if let Some(snap) = self.snap {
            patch = patch.with_snap(snap);
        }

        let Some(id) = editor.dispatch(EditorEvent::InsertTextBox(patch))? else {
            return Err(CliError::Validation("text box was not inserted".to_owned()));
        };
        save(&editor, &self.file)?;

        let (index, attrs) = locate_box(&editor, id)?;
        output.success(&format!(
            "Inserted text box {index} at {}",
            describe(&attrs)
        ));
        Ok(())
    }
}

/// Arguments for the move-box command.
#[derive(Args)]
pub(crate) struct MoveBoxArgs {
    /// Document markup file.
    file: PathBuf,

    /// Text box number (0-based, in document order).
    index: usize,

    /// New left edge.
    x: f64,

    /// New top edge.
    y: f64,

    /// Resize to this width, keeping the top-left corner.
    #[arg(long)]
    width: Option<f64>,

    /// Resize to this height, keeping the top-left corner.
    #[arg(long)]
    height: Option<f64>,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl MoveBoxArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let mut editor = open_editor(&self.file, &config)?;

        let id = nth_box(&editor, self.index)?;
        let view = editor.view(id).ok_or_else(|| {
            CliError::Validation("text boxes cannot be moved in a read-only document".to_owned())
        })?;
        editor.dispatch(view.drag_stop(self.x, self.y).into())?;

        if self.width.is_some() || self.height.is_some() {
            let view = editor.view(id).ok_or_else(|| {
                CliError::Validation(format!("text box {} disappeared", self.index))
            })?;
            let w = self.width.unwrap_or(view.attrs.w);
            let h = self.height.unwrap_or(view.attrs.h);
            editor.dispatch(view.resize_stop(ResizeHandle::BottomRight, w, h).into())?;
        }
        save(&editor, &self.file)?;

        let (_, attrs) = locate_box(&editor, id)?;
        output.success(&format!(
            "Moved text box {} to {}",
            self.index,
            describe(&attrs)
        ));
        Ok(())
    }
}

fn top_level_block(editor: &Editor, index: usize) -> Result<NodeId, CliError> {
    let blocks = &editor.document().root().children;
    blocks.get(index).map(|node| node.id()).ok_or_else(|| {
        CliError::Validation(format!(
            "block {index} not found (document has {})",
            blocks.len()
        ))
    })
}

fn nth_box(editor: &Editor, index: usize) -> Result<NodeId, CliError> {
    let boxes = editor.document().text_boxes();
    boxes.get(index).map(|(id, _)| *id).ok_or_else(|| {
        CliError::Validation(format!(
            "text box {index} not found (document has {})",
            boxes.len()
        ))
    })
}

fn locate_box(editor: &Editor, id: NodeId) -> Result<(usize, TextBoxAttrs), CliError> {
    editor
        .document()
        .text_boxes()
        .into_iter()
        .enumerate()
        .find(|(_, (box_id, _))| *box_id == id)
        .map(|(index, (_, attrs))| (index, attrs.clone()))
        .ok_or_else(|| CliError::Validation(format!("text box {id} not found")))
}

fn describe(attrs: &TextBoxAttrs) -> String {
    format!(
        "({}, {}) size {}x{}",
        attrs.x, attrs.y, attrs.w, attrs.h
    )
}

#[cfg(test)]
mod tests {
    use folio_doc::Document;
    use folio_editor::{EditorOptions, Keymap};
    use pretty_assertions::assert_eq;

    use super::*;

    fn editor(markup: &str) -> Editor {
        Editor::mount(
            Document::parse(markup).unwrap(),
            &Keymap::new(),
            EditorOptions::default(),
        )
    }

    #[test]
    fn test_nth_box_out_of_range() {
        let editor = editor(r#"<p>a</p><div data-type="text-box"></div>"#);
        assert!(nth_box(&editor, 0).is_ok());
        let err = nth_box(&editor, 3).unwrap_err();
        assert_eq!(err.to_string(), "text box 3 not found (document has 1)");
    }

    #[test]
    fn test_top_level_block_and_locate() {
        let mut editor = editor("<p>a</p><p>b</p>");
        let first = top_level_block(&editor, 0).unwrap();
        editor
            .dispatch(EditorEvent::MoveCursor(Some(first)))
            .unwrap();
        let id = editor
            .dispatch(EditorEvent::InsertTextBox(AttrPatch::geometry(
                1.0, 2.0, 30.0, 40.0,
            )))
            .unwrap()
            .unwrap();

        let (index, attrs) = locate_box(&editor, id).unwrap();
        assert_eq!(index, 0);
        assert_eq!(describe(&attrs), "(1, 2) size 30x40");
        assert!(top_level_block(&editor, 5).is_err());
    }
}
