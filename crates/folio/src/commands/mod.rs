//! CLI command implementations.

mod boxes;
mod export;
mod search;
mod toc;

use std::path::Path;

use folio_config::Config;
use folio_doc::{CanvasPolicy, Document};
use folio_editor::{Editor, EditorOptions, Keymap};

use crate::error::CliError;

pub(crate) use boxes::{InsertBoxArgs, MoveBoxArgs};
pub(crate) use export::ExportArgs;
pub(crate) use search::SearchArgs;
pub(crate) use toc::TocArgs;

fn read_document(path: &Path) -> Result<Document, CliError> {
    let markup = std::fs::read_to_string(path)?;
    Document::parse(&markup).map_err(|source| CliError::Markup {
        path: path.to_path_buf(),
        source,
    })
}

fn editor_options(config: &Config) -> EditorOptions {
    EditorOptions {
        read_only: config.editor.read_only,
        snap_increment: config.editor.snap_increment,
        canvas: config
            .editor
            .canvas()
            .map_or(CanvasPolicy::Allow, |(width, height)| CanvasPolicy::Clamp {
                width,
                height,
            }),
        max_matches: config.search.max_matches,
    }
}

/// Load `path` into an editor configured from `config`.
fn open_editor(path: &Path, config: &Config) -> Result<Editor, CliError> {
    let document = read_document(path)?;
    Ok(Editor::mount(
        document,
        &Keymap::new(),
        editor_options(config),
    ))
}

/// Write the editor's content back to `path`.
fn save(editor: &Editor, path: &Path) -> Result<(), CliError> {
    std::fs::write(path, editor.content())?;
    tracing::info!(path = %path.display(), "Saved document");
    Ok(())
}
