use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use outline_notes_engine::{Editor, HistoryConfig, SessionStore, io};
use ratatui::widgets::ListState;
use relative_path::{RelativePath, RelativePathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Files,
    Editor,
}

/// A note being edited
pub struct OpenNote {
    pub path: RelativePathBuf,
    pub editor: Editor,
    dirty: Rc<Cell<bool>>,
    /// Fixed end of a shift-extended selection
    anchor: Option<usize>,
}

impl OpenNote {
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }
}

pub struct App {
    pub notes_path: PathBuf,
    pub files: Vec<RelativePathBuf>,
    pub file_list_state: ListState,
    pub pane: Pane,
    pub open: Option<OpenNote>,
    pub status: String,
    sessions: SessionStore,
    history_config: HistoryConfig,
    clipboard: String,
}

impl App {
    pub fn new(notes_path: PathBuf, sessions_path: PathBuf, max_undo_levels: usize) -> Result<Self> {
        let mut app = Self {
            files: Vec::new(),
            file_list_state: ListState::default(),
            pane: Pane::Files,
            open: None,
            status: String::new(),
            sessions: SessionStore::new(sessions_path),
            history_config: HistoryConfig { max_undo_levels },
            clipboard: String::new(),
            notes_path,
        };
        app.refresh_files()?;
        Ok(app)
    }

    pub fn refresh_files(&mut self) -> Result<()> {
        self.files = io::scan_markdown_files(&self.notes_path)?
            .iter()
            .filter_map(|path| relative_to(path, &self.notes_path))
            .collect();
        if self.files.is_empty() {
            self.file_list_state.select(None);
        } else if self.file_list_state.selected().is_none() {
            self.file_list_state.select(Some(0));
        }
        Ok(())
    }

    pub fn next_file(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(i) => (i + 1) % self.files.len(),
            None => 0,
        };
        self.file_list_state.select(Some(i));
    }

    pub fn previous_file(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(0) | None => self.files.len() - 1,
            Some(i) => i - 1,
        };
        self.file_list_state.select(Some(i));
    }

    /// Open the highlighted note, suspending whatever was open
    pub fn open_selected(&mut self) -> Result<()> {
        let Some(path) = self
            .file_list_state
            .selected()
            .and_then(|index| self.files.get(index))
            .cloned()
        else {
            return Ok(());
        };
        self.close_current()?;

        let content = io::read_file(&path, &self.notes_path)?;
        let mut editor = Editor::with_config(self.history_config);
        editor.load(&content);

        match self.sessions.resume(path.as_str(), &mut editor) {
            Ok(true) => self.status = format!("Resumed {path} with its undo history"),
            Ok(false) => self.status = format!("Opened {path}"),
            Err(e) => {
                log::warn!("could not resume session for {path}: {e}");
                self.status = format!("Opened {path} (undo history discarded: {e})");
            }
        }

        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        editor.subscribe(move |_| flag.set(true));

        log::info!("opened {path}");
        self.open = Some(OpenNote {
            path,
            editor,
            dirty,
            anchor: None,
        });
        self.pane = Pane::Editor;
        Ok(())
    }

    pub fn save(&mut self) -> Result<()> {
        let Some(note) = &self.open else {
            return Ok(());
        };
        io::write_file(&note.path, &self.notes_path, &note.editor.text())?;
        note.dirty.set(false);
        self.status = format!("Saved {}", note.path);
        Ok(())
    }

    /// Save the open note if it changed and suspend its history
    pub fn close_current(&mut self) -> Result<()> {
        if self.open.as_ref().is_some_and(OpenNote::is_dirty) {
            self.save()?;
        }
        if let Some(note) = self.open.take() {
            self.sessions.save(note.path.as_str(), &note.editor)?;
            log::info!("closed {}", note.path);
        }
        self.pane = Pane::Files;
        Ok(())
    }

    /// Handle one key press. Returns false when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.pane {
            Pane::Files => self.handle_files_key(key),
            Pane::Editor => {
                self.handle_editor_key(key)?;
                Ok(true)
            }
        }
    }

    fn handle_files_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => {
                self.close_current()?;
                return Ok(false);
            }
            KeyCode::Down | KeyCode::Char('j') => self.next_file(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_file(),
            KeyCode::Enter | KeyCode::Char(' ') => self.open_selected()?,
            KeyCode::Char('r') => self.refresh_files()?,
            KeyCode::Tab if self.open.is_some() => self.pane = Pane::Editor,
            _ => {}
        }
        Ok(true)
    }

    fn handle_editor_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match (key.code, ctrl, alt) {
            (KeyCode::Esc, _, _) => {
                self.close_current()?;
                return Ok(());
            }
            (KeyCode::Char('s'), true, _) => {
                self.save()?;
                return Ok(());
            }
            _ => {}
        }

        let Some(note) = self.open.as_mut() else {
            self.pane = Pane::Files;
            return Ok(());
        };
        let editor = &mut note.editor;
        let mut keep_anchor = false;

        match (key.code, ctrl, alt) {
            (KeyCode::Char('z'), true, _) => {
                if editor.undo().is_none() {
                    self.status = "Nothing to undo".to_string();
                }
            }
            (KeyCode::Char('y'), true, _) => {
                if editor.redo().is_none() {
                    self.status = "Nothing to redo".to_string();
                }
            }
            (KeyCode::Char('b'), true, _) => {
                editor.toggle_bullet_prefix();
            }
            (KeyCode::Char('k'), true, _) => {
                editor.toggle_checkbox_prefix();
            }
            (KeyCode::Char('t'), true, _) => {
                let line = editor.document().focused_line_index();
                editor.toggle_checkbox_state(line);
            }
            (KeyCode::Char('a'), true, _) => {
                editor.select_all();
            }
            (KeyCode::Char('c'), true, _) => {
                if let Some(text) = editor.selected_text() {
                    self.clipboard = text;
                }
            }
            (KeyCode::Char('x'), true, _) => {
                if let Some(text) = editor.cut_selection() {
                    self.clipboard = text;
                }
            }
            (KeyCode::Char('v'), true, _) => {
                editor.insert_text(&self.clipboard);
            }
            (KeyCode::Up, _, true) => {
                if editor.would_orphan_children() {
                    self.status = "Moving a single line out of its block".to_string();
                }
                editor.move_block_up();
            }
            (KeyCode::Down, _, true) => {
                if editor.would_orphan_children() {
                    self.status = "Moving a single line out of its block".to_string();
                }
                editor.move_block_down();
            }
            (KeyCode::Char(c), false, false) => editor.insert_text(&c.to_string()),
            (KeyCode::Enter, _, _) => editor.split_line(),
            (KeyCode::Backspace, _, _) => editor.delete_backward(),
            (KeyCode::Delete, _, _) => editor.delete_forward(),
            (KeyCode::Tab, _, _) => {
                editor.indent();
            }
            (KeyCode::BackTab, _, _) => {
                editor.unindent();
            }
            (KeyCode::Left | KeyCode::Right | KeyCode::Home | KeyCode::End, _, _) => {
                let target = horizontal_target(editor, key.code);
                keep_anchor = move_caret(editor, &mut note.anchor, target, shift);
            }
            (KeyCode::Up | KeyCode::Down, _, _) => {
                let target = vertical_target(editor, key.code == KeyCode::Up);
                keep_anchor = move_caret(editor, &mut note.anchor, target, shift);
            }
            _ => {}
        }

        if !keep_anchor {
            note.anchor = None;
        }
        Ok(())
    }
}

/// Offset a horizontal key moves the caret to, from the moving end of the
/// selection if there is one
fn horizontal_target(editor: &Editor, code: KeyCode) -> usize {
    let doc = editor.document();
    let caret = moving_end(editor);
    let (line, _) = doc.offset_to_line_local(caret);
    let line_start = doc.line_start_offset(line);
    match code {
        KeyCode::Left => caret.saturating_sub(1),
        KeyCode::Right => (caret + 1).min(doc.len()),
        KeyCode::Home => line_start,
        _ => line_start + doc.line(line).map_or(0, |l| l.len()),
    }
}

fn vertical_target(editor: &Editor, up: bool) -> usize {
    let doc = editor.document();
    let (line, local) = doc.offset_to_line_local(moving_end(editor));
    let target = if up {
        line.saturating_sub(1)
    } else {
        (line + 1).min(doc.line_count() - 1)
    };
    let len = doc.line(target).map_or(0, |l| l.len());
    doc.line_start_offset(target) + local.min(len)
}

/// The end of the selection that arrow keys move; the caret otherwise.
/// Selections are stored anchor first.
fn moving_end(editor: &Editor) -> usize {
    editor
        .selection()
        .map_or_else(|| editor.cursor_offset(), |selection| selection.end)
}

/// Move the caret, extending the selection from the anchor when shift is
/// held. Returns whether the anchor should be kept.
fn move_caret(editor: &mut Editor, anchor: &mut Option<usize>, target: usize, shift: bool) -> bool {
    if !shift {
        editor.set_cursor(target);
        return false;
    }
    let fixed = *anchor.get_or_insert(editor.cursor_offset());
    if fixed == target {
        editor.set_cursor(target);
    } else {
        editor.set_selection(fixed, target);
    }
    true
}

fn relative_to(path: &Path, root: &Path) -> Option<RelativePathBuf> {
    let stripped = path.strip_prefix(root).ok()?;
    RelativePathBuf::from_path(stripped).ok()
}

/// Path of a note relative to the notes root, for display
pub fn display_name(path: &RelativePath) -> &str {
    path.as_str()
}
