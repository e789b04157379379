//! The editing surface host.

use folio_doc::markup::parse_blocks;
use folio_doc::{
    AttrPatch, BlockView, CanvasPolicy, Command, Document, DragBounds, NodeId, Outline,
    ViewEvent, build_outline, interactive_view,
};
use folio_search::{
    DEFAULT_MAX_MATCHES, Match, SearchError, SearchOutcome, SearchQuery, SearchSession,
};

use crate::error::EditorError;
use crate::shortcuts::{DEFAULT_BINDINGS, KeyChord, Keymap, Shortcut, ShortcutScope};

type Listener = Box<dyn FnMut(&str) + Send>;

/// Settings applied when an editor is mounted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorOptions {
    pub read_only: bool,
    /// Snap grid given to new text boxes that do not set their own.
    pub snap_increment: Option<f64>,
    pub canvas: CanvasPolicy,
    pub max_matches: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            snap_increment: None,
            canvas: CanvasPolicy::Allow,
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }
}

/// A change requested by the user or by a block view.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    InsertTextBox(AttrPatch),
    UpdateAttrs { node: NodeId, patch: AttrPatch },
    RemoveTextBox(NodeId),
    /// Drag or resize finished on a block view.
    View(ViewEvent),
    /// Replace the whole body with parsed markup.
    SetContent(String),
    /// Move the cursor; does not count as a content change.
    MoveCursor(Option<NodeId>),
}

impl From<ViewEvent> for EditorEvent {
    fn from(event: ViewEvent) -> Self {
        Self::View(event)
    }
}

/// Result of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    SearchOpened,
    Found(SearchOutcome),
    Replaced(usize),
    SaveRequested,
    SearchClosed,
    /// The chord is not bound, or its action does not apply right now.
    Ignored,
}

/// Hosts one document: keeps its outline current, owns the search dialog
/// session and the editor's keyboard shortcuts, and tells listeners about
/// every content change.
pub struct Editor {
    doc: Document,
    outline: Outline,
    search: Option<SearchSession>,
    options: EditorOptions,
    change_listeners: Vec<Listener>,
    save_listeners: Vec<Listener>,
    shortcuts: ShortcutScope,
}

impl Editor {
    /// Mount `doc`, registering the editor's shortcuts in `keymap`.
    ///
    /// The shortcuts stay active until the editor is dropped.
    pub fn mount(doc: Document, keymap: &Keymap, options: EditorOptions) -> Self {
        let read_only = options.read_only || doc.is_read_only();
        let mut doc = doc.with_canvas(options.canvas).with_read_only(read_only);
        let outline = build_outline(&mut doc);
        let shortcuts = keymap.register(&DEFAULT_BINDINGS);
        tracing::debug!(read_only, version = doc.version(), "Mounted editor");
        Self {
            doc,
            outline,
            search: None,
            options,
            change_listeners: Vec::new(),
            save_listeners: Vec::new(),
            shortcuts,
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Current content as markup.
    #[must_use]
    pub fn content(&self) -> String {
        self.doc.to_markup()
    }

    #[must_use]
    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.doc.set_read_only(read_only);
    }

    /// Call `listener` with the new markup after every content change.
    pub fn on_change(&mut self, listener: impl FnMut(&str) + Send + 'static) {
        self.change_listeners.push(Box::new(listener));
    }

    /// Call `listener` with the current markup when the user asks to save.
    pub fn on_save(&mut self, listener: impl FnMut(&str) + Send + 'static) {
        self.save_listeners.push(Box::new(listener));
    }

    /// Apply `event` to the document.
    ///
    /// Returns the id of the inserted node for [`EditorEvent::InsertTextBox`].
    /// A failed event leaves the document, the outline and the listeners
    /// untouched.
    pub fn dispatch(&mut self, event: EditorEvent) -> Result<Option<NodeId>, EditorError> {
        let inserted = match event {
            EditorEvent::InsertTextBox(mut patch) => {
                if patch.snap_increment.is_none() {
                    patch.snap_increment = self.options.snap_increment.map(Some);
                }
                Some(self.doc.insert_text_box(patch)?)
            }
            EditorEvent::UpdateAttrs { node, patch } => {
                self.doc.update_attrs(node, patch)?;
                None
            }
            EditorEvent::RemoveTextBox(node) => {
                self.doc.remove_text_box(node)?;
                None
            }
            EditorEvent::View(ViewEvent { node_id, patch }) => {
                self.doc.update_attrs(node_id, patch)?;
                None
            }
            EditorEvent::SetContent(markup) => {
                let nodes = parse_blocks(&markup)?;
                self.doc.apply(Command::SetContent { nodes })?;
                None
            }
            EditorEvent::MoveCursor(node) => {
                self.doc.set_cursor(node);
                return Ok(None);
            }
        };
        self.content_changed();
        Ok(inserted)
    }

    /// Interactive views of every text box; empty when read-only.
    ///
    /// Views are bounded by the document's canvas.
    #[must_use]
    pub fn views(&self) -> Vec<BlockView> {
        self.doc
            .text_boxes()
            .into_iter()
            .filter_map(|(id, _)| self.view(id))
            .collect()
    }

    #[must_use]
    pub fn view(&self, node: NodeId) -> Option<BlockView> {
        interactive_view(self.doc.node(node)?, !self.doc.is_read_only())
            .map(|view| view.within(DragBounds::from(self.doc.canvas())))
    }

    /// Open the search dialog, keeping an already open session.
    pub fn open_search(&mut self) -> &mut SearchSession {
        let max = self.options.max_matches;
        self.search
            .get_or_insert_with(|| SearchSession::new().with_max_matches(max))
    }

    /// Close the search dialog. Returns `false` if it was not open.
    pub fn close_search(&mut self) -> bool {
        self.search.take().is_some()
    }

    #[must_use]
    pub fn search(&self) -> Option<&SearchSession> {
        self.search.as_ref()
    }

    /// Open the dialog if needed, set `query` and search.
    pub fn find(&mut self, query: SearchQuery) -> Result<SearchOutcome, EditorError> {
        self.open_search().set_query(query);
        let session = self.search.as_mut().ok_or(EditorError::SearchClosed)?;
        Ok(session.search(&self.doc)?)
    }

    /// Move to the next match, searching first if the list is out of date.
    pub fn find_next(&mut self) -> Result<SearchOutcome, EditorError> {
        self.navigate(SearchSession::next)
    }

    pub fn find_previous(&mut self) -> Result<SearchOutcome, EditorError> {
        self.navigate(SearchSession::previous)
    }

    fn navigate(
        &mut self,
        step: fn(&mut SearchSession) -> Result<Match, SearchError>,
    ) -> Result<SearchOutcome, EditorError> {
        let session = self.search.as_mut().ok_or(EditorError::SearchClosed)?;
        if !session.is_current(&self.doc) {
            return Ok(session.search(&self.doc)?);
        }
        match step(session) {
            Ok(_) | Err(SearchError::NoActiveMatch) => Ok(session.outcome()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the selected match.
    pub fn replace_current(&mut self) -> Result<SearchOutcome, EditorError> {
        let version = self.doc.version();
        let session = self.search.as_mut().ok_or(EditorError::SearchClosed)?;
        let result = session.replace_one(&mut self.doc);
        self.after_replace(version);
        Ok(result?)
    }

    /// Replace every match. Returns the number of replacements.
    pub fn replace_all(&mut self) -> Result<usize, EditorError> {
        let version = self.doc.version();
        let session = self.search.as_mut().ok_or(EditorError::SearchClosed)?;
        let result = session.replace_all(&mut self.doc);
        self.after_replace(version);
        Ok(result?)
    }

    fn after_replace(&mut self, version_before: u64) {
        if self.doc.version() != version_before {
            self.content_changed();
        }
    }

    /// Run the action bound to `chord` in this editor's shortcut scope.
    pub fn handle_key(&mut self, chord: &KeyChord) -> Result<KeyOutcome, EditorError> {
        let Some(action) = self.shortcuts.lookup(chord) else {
            return Ok(KeyOutcome::Ignored);
        };
        tracing::debug!(%chord, ?action, "Shortcut");
        match action {
            Shortcut::FindNext => {
                if self.search.is_none() {
                    self.open_search();
                    return Ok(KeyOutcome::SearchOpened);
                }
                self.find_next().map(KeyOutcome::Found)
            }
            Shortcut::ReplaceAll => {
                if self.search.is_none() {
                    return Ok(KeyOutcome::Ignored);
                }
                self.replace_all().map(KeyOutcome::Replaced)
            }
            Shortcut::Save => {
                let markup = self.doc.to_markup();
                for listener in &mut self.save_listeners {
                    listener(&markup);
                }
                tracing::info!(version = self.doc.version(), "Save requested");
                Ok(KeyOutcome::SaveRequested)
            }
            Shortcut::CloseSearch => Ok(if self.close_search() {
                KeyOutcome::SearchClosed
            } else {
                KeyOutcome::Ignored
            }),
        }
    }

    /// Consume the editor, releasing its shortcuts.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.doc
    }

    fn content_changed(&mut self) {
        self.outline = build_outline(&mut self.doc);
        let markup = self.doc.to_markup();
        for listener in &mut self.change_listeners {
            listener(&markup);
        }
        tracing::debug!(
            version = self.doc.version(),
            headings = self.outline.entries().len(),
            "Content changed"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use folio_doc::{EditError, GeometryError, ResizeHandle};
    use pretty_assertions::assert_eq;

    use super::*;

    fn chord(s: &str) -> KeyChord {
        s.parse().unwrap()
    }

    fn mount(markup: &str) -> (Editor, Keymap) {
        let keymap = Keymap::new();
        let editor = Editor::mount(
            Document::parse(markup).unwrap(),
            &keymap,
            EditorOptions::default(),
        );
        (editor, keymap)
    }

    fn record(editor: &mut Editor) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        editor.on_change(move |markup| sink.lock().unwrap().push(markup.to_owned()));
        seen
    }

    #[test]
    fn test_mount_builds_outline_and_registers_shortcuts() {
        let (editor, keymap) = mount("<h1>Intro</h1>");
        assert_eq!(editor.outline().entries()[0].anchor_id, "intro");
        assert_eq!(editor.content(), r#"<h1 id="intro">Intro</h1>"#);
        assert_eq!(keymap.len(), DEFAULT_BINDINGS.len());

        drop(editor);
        assert!(keymap.is_empty());
    }

    #[test]
    fn test_insert_notifies_and_refreshes_outline() {
        let (mut editor, _keymap) = mount("<p>body</p>");
        let seen = record(&mut editor);
        assert!(editor.outline().is_placeholder());

        let id = editor
            .dispatch(EditorEvent::InsertTextBox(AttrPatch::default()))
            .unwrap()
            .unwrap();
        editor
            .dispatch(EditorEvent::SetContent("<h2>Plan</h2>".to_owned()))
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains(r#"data-type="text-box""#));
        assert_eq!(seen[1], r#"<h2 id="plan">Plan</h2>"#);
        assert_eq!(editor.outline().entries()[0].text, "Plan");
        assert!(editor.document().node(id).is_none());
    }

    #[test]
    fn test_snap_default_applied_to_new_boxes() {
        let keymap = Keymap::new();
        let mut editor = Editor::mount(
            Document::new(),
            &keymap,
            EditorOptions {
                snap_increment: Some(10.0),
                ..EditorOptions::default()
            },
        );
        editor
            .dispatch(EditorEvent::InsertTextBox(AttrPatch::default()))
            .unwrap();
        editor
            .dispatch(EditorEvent::InsertTextBox(AttrPatch::default().with_snap(5.0)))
            .unwrap();
        let snaps: Vec<_> = editor
            .document()
            .text_boxes()
            .iter()
            .map(|(_, a)| a.snap_increment)
            .collect();
        assert_eq!(snaps, vec![Some(10.0), Some(5.0)]);
    }

    #[test]
    fn test_view_event_round_trip() {
        let (mut editor, _keymap) = mount("");
        let id = editor
            .dispatch(EditorEvent::InsertTextBox(
                AttrPatch::geometry(40.0, 40.0, 260.0, 140.0).with_snap(10.0),
            ))
            .unwrap()
            .unwrap();

        let view = editor.view(id).unwrap();
        editor.dispatch(view.drag_stop(103.0, 58.0).into()).unwrap();
        let view = editor.view(id).unwrap();
        assert_eq!((view.attrs.x, view.attrs.y), (100.0, 60.0));

        editor
            .dispatch(view.resize_stop(ResizeHandle::TopLeft, 200.0, 100.0).into())
            .unwrap();
        let attrs = editor.view(id).unwrap().attrs;
        assert_eq!(
            (attrs.x, attrs.y, attrs.w, attrs.h),
            (160.0, 100.0, 200.0, 100.0)
        );
    }

    #[test]
    fn test_views_bounded_by_canvas() {
        let keymap = Keymap::new();
        let mut editor = Editor::mount(
            Document::new(),
            &keymap,
            EditorOptions {
                canvas: CanvasPolicy::Clamp {
                    width: 400.0,
                    height: 300.0,
                },
                ..EditorOptions::default()
            },
        );
        let id = editor
            .dispatch(EditorEvent::InsertTextBox(AttrPatch::geometry(
                10.0, 10.0, 100.0, 50.0,
            )))
            .unwrap()
            .unwrap();

        let view = editor.view(id).unwrap();
        assert_eq!(
            view.bounds,
            DragBounds::Parent {
                width: 400.0,
                height: 300.0
            }
        );
        editor.dispatch(view.drag_stop(390.0, -20.0).into()).unwrap();
        let attrs = &editor.views()[0].attrs;
        assert_eq!((attrs.x, attrs.y), (300.0, 0.0));
    }

    #[test]
    fn test_failed_event_changes_nothing() {
        let (mut editor, _keymap) = mount("");
        let id = editor
            .dispatch(EditorEvent::InsertTextBox(AttrPatch::default()))
            .unwrap()
            .unwrap();
        let seen = record(&mut editor);
        let before = editor.content();

        let err = editor
            .dispatch(EditorEvent::UpdateAttrs {
                node: id,
                patch: AttrPatch::geometry(0.0, 0.0, -1.0, 10.0),
            })
            .unwrap_err();

        assert!(matches!(
            err,
            EditorError::Edit(EditError::InvalidGeometry(GeometryError::NonPositive { .. }))
        ));
        assert_eq!(editor.content(), before);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_read_only_has_no_views_and_rejects_insert() {
        let keymap = Keymap::new();
        let doc = Document::parse(r#"<div data-type="text-box"></div>"#).unwrap();
        let mut editor = Editor::mount(
            doc,
            &keymap,
            EditorOptions {
                read_only: true,
                ..EditorOptions::default()
            },
        );
        assert!(editor.views().is_empty());
        assert!(matches!(
            editor.dispatch(EditorEvent::InsertTextBox(AttrPatch::default())),
            Err(EditorError::Edit(EditError::ReadOnly))
        ));
    }

    #[test]
    fn test_invalid_markup_rejected() {
        let (mut editor, _keymap) = mount("<p>keep</p>");
        let err = editor
            .dispatch(EditorEvent::SetContent("<p>open".to_owned()))
            .unwrap_err();
        assert!(matches!(err, EditorError::Markup(_)));
        assert_eq!(editor.content(), "<p>keep</p>");
    }

    #[test]
    fn test_search_through_shortcuts() {
        let (mut editor, _keymap) = mount("<p>aXaXa</p>");
        let seen = record(&mut editor);

        assert_eq!(
            editor.handle_key(&chord("Ctrl+F")).unwrap(),
            KeyOutcome::SearchOpened
        );
        assert_eq!(
            editor
                .find(SearchQuery::new("a").with_replacement("b"))
                .unwrap(),
            SearchOutcome::Found {
                count: 3,
                current: 0
            }
        );
        editor.handle_key(&chord("Ctrl+F")).unwrap();
        editor.handle_key(&chord("Ctrl+F")).unwrap();
        assert_eq!(
            editor.handle_key(&chord("Ctrl+F")).unwrap(),
            KeyOutcome::Found(SearchOutcome::Found {
                count: 3,
                current: 0
            })
        );

        assert_eq!(
            editor.handle_key(&chord("Ctrl+Shift+H")).unwrap(),
            KeyOutcome::Replaced(3)
        );
        assert_eq!(editor.document().text(), "bXbXb");
        assert_eq!(seen.lock().unwrap().last().unwrap(), "<p>bXbXb</p>");

        assert_eq!(
            editor.handle_key(&chord("Escape")).unwrap(),
            KeyOutcome::SearchClosed
        );
        assert!(editor.search().is_none());
        assert_eq!(
            editor.handle_key(&chord("Escape")).unwrap(),
            KeyOutcome::Ignored
        );
        assert_eq!(
            editor.handle_key(&chord("Ctrl+Shift+H")).unwrap(),
            KeyOutcome::Ignored
        );
    }

    #[test]
    fn test_find_next_rescans_after_edit() {
        let (mut editor, _keymap) = mount("<p>ab ab</p>");
        editor.find(SearchQuery::new("ab")).unwrap();
        editor.find_next().unwrap();
        editor
            .dispatch(EditorEvent::SetContent("<p>ab ab ab</p>".to_owned()))
            .unwrap();
        assert_eq!(
            editor.find_next().unwrap(),
            SearchOutcome::Found {
                count: 3,
                current: 0
            }
        );
        assert_eq!(
            editor.find_previous().unwrap(),
            SearchOutcome::Found {
                count: 3,
                current: 2
            }
        );
    }

    #[test]
    fn test_replace_current_notifies() {
        let (mut editor, _keymap) = mount("<p>one two</p>");
        let seen = record(&mut editor);
        editor
            .find(SearchQuery::new("two").with_replacement("2"))
            .unwrap();
        assert_eq!(editor.replace_current().unwrap(), SearchOutcome::NoMatches);
        assert_eq!(seen.lock().unwrap().as_slice(), ["<p>one 2</p>".to_owned()]);
    }

    #[test]
    fn test_search_requires_open_dialog() {
        let (mut editor, _keymap) = mount("<p>x</p>");
        assert!(matches!(
            editor.find_next(),
            Err(EditorError::SearchClosed)
        ));
        assert!(matches!(
            editor.replace_all(),
            Err(EditorError::SearchClosed)
        ));
    }

    #[test]
    fn test_save_shortcut_notifies_save_listeners() {
        let (mut editor, _keymap) = mount("<p>draft</p>");
        let saved = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&saved);
        editor.on_save(move |markup| sink.lock().unwrap().push(markup.to_owned()));

        assert_eq!(
            editor.handle_key(&chord("Ctrl+S")).unwrap(),
            KeyOutcome::SaveRequested
        );
        assert_eq!(saved.lock().unwrap().as_slice(), ["<p>draft</p>".to_owned()]);
        assert_eq!(
            editor.handle_key(&chord("Ctrl+Q")).unwrap(),
            KeyOutcome::Ignored
        );
    }

    #[test]
    fn test_shortcuts_do_not_leak_between_editors() {
        let keymap = Keymap::new();
        let first = Editor::mount(Document::new(), &keymap, EditorOptions::default());
        let mut second = Editor::mount(Document::new(), &keymap, EditorOptions::default());
        assert_eq!(keymap.len(), 2 * DEFAULT_BINDINGS.len());

        drop(first);
        assert_eq!(keymap.len(), DEFAULT_BINDINGS.len());
        assert_eq!(
            second.handle_key(&chord("Ctrl+F")).unwrap(),
            KeyOutcome::SearchOpened
        );
    }
}
