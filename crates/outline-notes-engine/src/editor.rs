//! The mutation controller.
//!
//! [`Editor`] is the only way to change a [`Document`]. Every edit passes
//! through it so that document state and undo history never disagree, and
//! every successful content mutation ends by bumping the version counter
//! and notifying subscribers with the full text.

use std::fmt;

use crate::editing::{Direction, Document, Selection};
use crate::history::{
    CommandKind, History, HistoryConfig, HistoryImportError, HistoryState, SideEffectRef, Snapshot,
};

/// Payload handed to content-changed subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentChanged<'a> {
    pub version: u64,
    pub text: &'a str,
}

type Subscriber = Box<dyn FnMut(&ContentChanged<'_>)>;

/// Outcome of a side effect that could not be recreated during redo
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SideEffectFailure {
    #[error("Could not recreate side effect, the redo was rolled back: {reason}")]
    RolledBack { reason: String },
    #[error("Could not recreate side effect and the rollback failed, document may be inconsistent: {reason}")]
    RollbackFailed { reason: String },
}

/// Editing session for one document
pub struct Editor {
    document: Document,
    history: History,
    version: u64,
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("document", &self.document)
            .field("history", &self.history)
            .field("version", &self.version)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            document: Document::default(),
            history: History::with_config(config),
            version: 0,
            subscribers: Vec::new(),
        }
    }

    /// Start a session on `text`: replaces the document, resets history and
    /// sets the baseline against the loaded content
    pub fn load(&mut self, text: &str) {
        self.document = Document::from_text(text);
        self.history.reset();
        self.history.set_baseline(&self.document);
        self.bump_version();
        log::debug!("loaded document with {} lines", self.document.line_count());
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Change counter, bumped by every mutation and focus/selection move
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn cursor_offset(&self) -> usize {
        self.document.cursor_offset()
    }

    /// Register a content-changed subscriber
    pub fn subscribe(&mut self, subscriber: impl FnMut(&ContentChanged<'_>) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    // ============ Focus and selection ============

    pub fn set_cursor(&mut self, offset: usize) {
        self.document.set_cursor(offset);
        self.after_focus_move();
    }

    pub fn focus_line(&mut self, line_index: usize, cursor: usize) {
        self.document.focus_line(line_index, cursor);
        self.after_focus_move();
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.document.set_selection(start, end);
        self.after_focus_move();
    }

    pub fn clear_selection(&mut self) {
        self.document.clear_selection();
        self.bump_version();
    }

    pub fn select_all(&mut self) {
        self.document.select_all();
        self.after_focus_move();
    }

    pub fn selection(&self) -> Option<Selection> {
        self.document.selection()
    }

    pub fn selected_text(&self) -> Option<String> {
        self.document.selected_text()
    }

    fn after_focus_move(&mut self) {
        self.history
            .focus_changed(self.document.focused_line_index(), &self.document);
        self.bump_version();
    }

    // ============ Typing ============

    /// Insert at the caret, or over the selection. Text containing newlines
    /// is inserted as content plus a line split per `\n`.
    pub fn insert_text(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n");
        if !text.contains('\n') && !self.document.has_selection() {
            if text.is_empty() {
                return;
            }
            self.document.clear_selection();
            self.history.note_typing(&self.document);
            self.document.insert_at_cursor(&text);
            self.content_changed();
            return;
        }

        if !text.contains('\n') {
            self.replace_selection(&text);
            return;
        }

        self.history.record_command(CommandKind::Paste, &self.document);
        self.document.delete_selection();
        self.insert_lines(&text);
        self.history
            .finish_command(CommandKind::Paste, &self.document);
        self.content_changed();
    }

    /// First piece goes in at the caret, every following piece after a split
    fn insert_lines(&mut self, text: &str) {
        self.document.clear_selection();
        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            self.document.insert_at_cursor(first);
        }
        for piece in pieces {
            self.document.split_focused_line();
            self.document.insert_at_cursor(piece);
        }
    }

    /// Replace a global char range with `text`. No newline widening and no
    /// empty-line cleanup: this is the path for input-method commits.
    pub fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        let len = self.document.len();
        let (start, end) = (start.min(end).min(len), start.max(end).min(len));
        let text = text.replace("\r\n", "\n");
        let (start_line, start_local) = self.document.offset_to_line_local(start);
        let (end_line, end_local) = self.document.offset_to_line_local(end);

        if start_line == end_line && !text.contains('\n') {
            if start == end && text.is_empty() {
                return;
            }
            if start_line != self.document.focused_line_index() || self.document.selection().is_some()
            {
                self.document.focus_line(start_line, start_local);
                self.history.focus_changed(start_line, &self.document);
            }
            self.history.note_typing(&self.document);
            self.document
                .focused_line_mut()
                .replace_chars(start_local..end_local, &text);
            self.content_changed();
            return;
        }

        self.history.record_command(CommandKind::Paste, &self.document);
        self.document.splice(start..end, "");
        self.insert_lines(&text);
        self.history
            .finish_command(CommandKind::Paste, &self.document);
        self.content_changed();
    }

    /// Backspace. Deletes the selection if there is one; at the content
    /// start strips one prefix element; at the start of a prefix-less line
    /// merges into the previous line.
    pub fn delete_backward(&mut self) {
        if self.document.has_selection() {
            self.delete_selection();
            return;
        }
        self.document.clear_selection();
        let line = self.document.focused_line();
        let prefix_len = line.prefix().char_len();

        if line.cursor() > prefix_len {
            self.history.note_typing(&self.document);
            self.document.delete_char_before_cursor();
            self.content_changed();
        } else if prefix_len > 0 {
            self.history.note_typing(&self.document);
            self.document.strip_prefix_element();
            self.content_changed();
        } else if self.document.focused_line_index() > 0 {
            self.merge_up();
        }
    }

    /// Delete key. Deletes the selection if there is one; at the end of a
    /// line merges the next line in.
    pub fn delete_forward(&mut self) {
        if self.document.has_selection() {
            self.delete_selection();
            return;
        }
        self.document.clear_selection();
        let line = self.document.focused_line();
        if line.cursor() < line.len() {
            self.history.note_typing(&self.document);
            self.document.delete_char_after_cursor();
            self.content_changed();
        } else {
            self.merge_down();
        }
    }

    // ============ Structural edits ============

    /// Enter. The pre-split state stays pending, so the split and any typing
    /// on the new line form one undo step.
    pub fn split_line(&mut self) {
        self.document.clear_selection();
        self.history.begin_structural(&self.document);
        self.document.split_focused_line();
        self.history
            .follow_focus(self.document.focused_line_index());
        self.content_changed();
    }

    pub fn merge_up(&mut self) {
        self.document.clear_selection();
        if self.document.focused_line_index() == 0 {
            return;
        }
        self.history.begin_structural(&self.document);
        self.document.merge_focused_into_previous();
        self.history
            .follow_focus(self.document.focused_line_index());
        self.content_changed();
    }

    pub fn merge_down(&mut self) {
        self.document.clear_selection();
        if self.document.focused_line_index() + 1 >= self.document.line_count() {
            return;
        }
        self.history.begin_structural(&self.document);
        self.document.merge_next_into_focused();
        self.history
            .follow_focus(self.document.focused_line_index());
        self.content_changed();
    }

    // ============ Selection edits ============

    pub fn delete_selection(&mut self) -> bool {
        self.run_command(CommandKind::DeleteSelection, Document::delete_selection)
    }

    pub fn replace_selection(&mut self, replacement: &str) -> bool {
        if replacement.contains('\n') {
            if !self.document.has_selection() {
                return false;
            }
            self.insert_text(replacement);
            return true;
        }
        self.run_command(CommandKind::ReplaceSelection, |doc| {
            doc.replace_selection(replacement)
        })
    }

    /// Copy the selection out and delete it
    pub fn cut_selection(&mut self) -> Option<String> {
        let text = self.document.selected_text()?;
        self.delete_selection();
        Some(text)
    }

    // ============ Commands ============

    /// Indent the selected lines, or the focused line
    pub fn indent(&mut self) -> bool {
        self.run_command(CommandKind::Indent, |doc| {
            let lines = doc.selected_line_range();
            doc.indent(lines)
        })
    }

    pub fn unindent(&mut self) -> bool {
        self.run_command(CommandKind::Unindent, |doc| {
            let lines = doc.selected_line_range();
            doc.unindent(lines)
        })
    }

    pub fn toggle_bullet_prefix(&mut self) -> bool {
        self.run_command(CommandKind::ToggleBullet, Document::toggle_bullet_prefix)
    }

    pub fn toggle_checkbox_prefix(&mut self) -> bool {
        self.run_command(CommandKind::ToggleCheckbox, Document::toggle_checkbox_prefix)
    }

    /// Check or uncheck the box on `line_index`
    pub fn toggle_checkbox_state(&mut self, line_index: usize) -> bool {
        self.run_command(CommandKind::ToggleCheckboxState, |doc| {
            doc.toggle_checkbox_state(line_index)
        })
    }

    pub fn move_block_up(&mut self) -> bool {
        self.run_command(CommandKind::MoveBlockUp, |doc| {
            doc.move_block(Direction::Up)
        })
    }

    pub fn move_block_down(&mut self) -> bool {
        self.run_command(CommandKind::MoveBlockDown, |doc| {
            doc.move_block(Direction::Down)
        })
    }

    pub fn would_orphan_children(&self) -> bool {
        self.document.would_orphan_children()
    }

    /// Replace the whole text from an external agent. Always its own undo
    /// step; the caret stays at the same offset where possible.
    pub fn apply_external_edit(&mut self, text: &str) -> bool {
        if self.document.text() == text {
            return false;
        }
        self.run_command(CommandKind::ExternalEdit, |doc| {
            doc.replace_all(text);
            true
        })
    }

    fn run_command(&mut self, kind: CommandKind, apply: impl FnOnce(&mut Document) -> bool) -> bool {
        self.history.record_command(kind, &self.document);
        let changed = apply(&mut self.document);
        self.history.finish_command(kind, &self.document);
        if changed {
            self.content_changed();
        }
        changed
    }

    // ============ Undo / redo ============

    pub fn can_undo(&self) -> bool {
        self.history.can_undo(&self.document)
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back and restore the returned snapshot. A side effect on the
    /// snapshot must be destroyed by the caller.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let snapshot = self.history.undo(&self.document)?;
        self.restore(&snapshot);
        Some(snapshot)
    }

    /// Step forward and restore the returned snapshot. A side effect on the
    /// snapshot must be recreated by the caller and reported back through
    /// [`Editor::complete_redo_side_effect`].
    pub fn redo(&mut self) -> Option<Snapshot> {
        let snapshot = self.history.redo(&self.document)?;
        self.restore(&snapshot);
        Some(snapshot)
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        self.document.restore(
            snapshot.line_texts(),
            snapshot.focused_line_index(),
            snapshot.cursor_position(),
        );
        self.history.recapture(&self.document);
        self.content_changed();
    }

    pub fn set_baseline(&mut self) {
        self.history.set_baseline(&self.document);
    }

    pub fn reset_history(&mut self) {
        self.history.reset();
    }

    // ============ Side effects ============

    /// Tie an external resource to the edit that created it. Pending edits
    /// are committed first so the creating edit is its own undo entry.
    pub fn attach_side_effect(&mut self, side_effect: SideEffectRef) -> bool {
        self.history.commit(&self.document);
        self.history.recapture(&self.document);
        self.history.attach_side_effect(side_effect)
    }

    /// Write the reference of a recreated resource into the latest undo entry
    pub fn replace_side_effect(&mut self, side_effect: SideEffectRef) -> bool {
        self.history.attach_side_effect(side_effect)
    }

    /// Report how recreating a redone side effect went. On failure the redo
    /// is rolled back with an immediate undo.
    pub fn complete_redo_side_effect<E: fmt::Display>(
        &mut self,
        outcome: Result<SideEffectRef, E>,
    ) -> Result<(), SideEffectFailure> {
        match outcome {
            Ok(side_effect) => {
                self.replace_side_effect(side_effect);
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                if self.undo().is_some() {
                    log::debug!("rolled back redo after side effect failure: {reason}");
                    Err(SideEffectFailure::RolledBack { reason })
                } else {
                    log::warn!("side effect failed and rollback was impossible: {reason}");
                    Err(SideEffectFailure::RollbackFailed { reason })
                }
            }
        }
    }

    // ============ Session state ============

    pub fn export_history(&self) -> Result<String, serde_json::Error> {
        self.history.export_json()
    }

    pub fn import_history(&mut self, json: &str) -> Result<(), HistoryImportError> {
        self.history.import_json(json)
    }

    pub fn export_history_state(&self) -> HistoryState {
        self.history.export_state()
    }

    pub fn import_history_state(&mut self, state: HistoryState) -> Result<(), HistoryImportError> {
        self.history.import_state(state)
    }

    // ============ Notification ============

    fn bump_version(&mut self) {
        self.version += 1;
    }

    fn content_changed(&mut self) {
        self.bump_version();
        if self.subscribers.is_empty() {
            return;
        }
        let text = self.document.text();
        let event = ContentChanged {
            version: self.version,
            text: &text,
        };
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor(text: &str) -> Editor {
        let mut editor = Editor::new();
        editor.load(text);
        editor
    }

    fn texts(editor: &Editor) -> Vec<String> {
        editor.document().line_texts()
    }

    #[test]
    fn test_typing_then_undo() {
        let mut editor = editor("");
        editor.insert_text("hello");
        assert_eq!(editor.text(), "hello");
        assert!(editor.can_undo());

        editor.undo();
        assert_eq!(editor.text(), "");
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_paste_decomposes_into_splits() {
        let mut editor = editor("• ");
        editor.focus_line(0, 2);
        editor.insert_text("one\ntwo\r\nthree");
        assert_eq!(texts(&editor), vec!["• one", "• two", "• three"]);
        assert_eq!(editor.cursor_offset(), editor.document().len());
    }

    #[test]
    fn test_paste_is_one_undo_step() {
        let mut editor = editor("x");
        editor.focus_line(0, 1);
        editor.insert_text("\na\nb");
        assert_eq!(editor.document().line_count(), 3);
        editor.undo();
        assert_eq!(texts(&editor), vec!["x"]);
    }

    #[test]
    fn test_backspace_strips_prefix_before_merging() {
        let mut editor = editor("a\n\t• b");
        editor.focus_line(1, 3);
        editor.delete_backward();
        assert_eq!(texts(&editor), vec!["a", "\tb"]);
        editor.delete_backward();
        assert_eq!(texts(&editor), vec!["a", "b"]);
        editor.delete_backward();
        assert_eq!(texts(&editor), vec!["ab"]);
        assert_eq!(editor.cursor_offset(), 1);
    }

    #[test]
    fn test_backspace_on_first_line_start_does_nothing() {
        let mut editor = editor("abc");
        let version = editor.version();
        editor.delete_backward();
        assert_eq!(editor.text(), "abc");
        assert_eq!(editor.version(), version);
    }

    #[test]
    fn test_delete_forward_merges_next_line() {
        let mut editor = editor("ab\ncd");
        editor.focus_line(0, 2);
        editor.delete_forward();
        assert_eq!(texts(&editor), vec!["abcd"]);
        editor.delete_forward();
        assert_eq!(texts(&editor), vec!["abd"]);
    }

    #[test]
    fn test_split_groups_with_following_typing() {
        let mut editor = editor("• a");
        editor.focus_line(0, 3);
        editor.insert_text("b");
        editor.split_line();
        editor.insert_text("c");
        assert_eq!(texts(&editor), vec!["• ab", "• c"]);

        editor.undo();
        assert_eq!(texts(&editor), vec!["• ab"]);
        editor.undo();
        assert_eq!(texts(&editor), vec!["• a"]);
    }

    #[test]
    fn test_structural_ops_clear_selection() {
        let mut editor = editor("abc\ndef");
        editor.set_selection(1, 2);
        editor.split_line();
        assert_eq!(editor.selection(), None);
        assert_eq!(texts(&editor), vec!["a", "bc", "def"]);
    }

    #[test]
    fn test_typing_over_selection_replaces_it() {
        let mut editor = editor("hello world");
        editor.set_selection(0, 5);
        editor.insert_text("bye");
        assert_eq!(editor.text(), "bye world");
        editor.undo();
        assert_eq!(editor.text(), "hello world");
    }

    #[test]
    fn test_cut_returns_whole_line_with_newline() {
        let mut editor = editor("one\ntwo\nthree");
        editor.set_selection(4, 7);
        assert_eq!(editor.cut_selection().as_deref(), Some("two\n"));
        assert_eq!(texts(&editor), vec!["one", "three"]);
    }

    #[test]
    fn test_indent_follows_selection() {
        let mut editor = editor("a\nb\nc");
        editor.set_selection(0, 3);
        editor.indent();
        assert_eq!(texts(&editor), vec!["\ta", "\tb", "c"]);
        editor.unindent();
        assert_eq!(texts(&editor), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_external_edit_is_own_step() {
        let mut editor = editor("draft");
        editor.focus_line(0, 5);
        editor.insert_text("!");
        assert!(editor.apply_external_edit("• rewritten\n• by agent"));
        assert!(!editor.apply_external_edit("• rewritten\n• by agent"));

        editor.undo();
        assert_eq!(editor.text(), "draft!");
        editor.undo();
        assert_eq!(editor.text(), "draft");
    }

    #[test]
    fn test_subscribers_see_every_content_mutation_once() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut editor = editor("a");
        let sink = Rc::clone(&seen);
        editor.subscribe(move |event| sink.borrow_mut().push(event.text.to_string()));

        editor.focus_line(0, 1);
        editor.insert_text("b");
        editor.split_line();
        editor.set_selection(0, 1);
        editor.undo();

        // Undo steps back over the split; the typed "b" is its own step
        assert_eq!(*seen.borrow(), vec!["ab", "ab\n", "ab"]);
    }

    #[test]
    fn test_version_bumps_on_focus_moves() {
        let mut editor = editor("a\nb");
        let version = editor.version();
        editor.set_cursor(2);
        assert!(editor.version() > version);
    }

    #[test]
    fn test_side_effect_redo_success_rewrites_reference() {
        let mut editor = editor("remind");
        editor.focus_line(0, 6);
        editor.insert_text(" at 9");
        assert!(editor.attach_side_effect(SideEffectRef::new("alarm", "old")));

        let undone = editor.undo().unwrap();
        assert_eq!(undone.side_effect().map(|s| s.id.as_str()), Some("old"));

        let redone = editor.redo().unwrap();
        assert_eq!(redone.side_effect().map(|s| s.id.as_str()), Some("old"));
        let outcome: Result<SideEffectRef, String> = Ok(SideEffectRef::new("alarm", "new"));
        assert_eq!(editor.complete_redo_side_effect(outcome), Ok(()));

        let undone = editor.undo().unwrap();
        assert_eq!(undone.side_effect().map(|s| s.id.as_str()), Some("new"));
    }

    #[test]
    fn test_side_effect_redo_failure_rolls_back() {
        let mut editor = editor("remind");
        editor.focus_line(0, 6);
        editor.insert_text(" at 9");
        editor.attach_side_effect(SideEffectRef::new("alarm", "old"));
        editor.undo();
        editor.redo();
        assert_eq!(editor.text(), "remind at 9");

        let outcome: Result<SideEffectRef, &str> = Err("alarm service down");
        let result = editor.complete_redo_side_effect(outcome);
        assert_eq!(
            result,
            Err(SideEffectFailure::RolledBack {
                reason: "alarm service down".to_string()
            })
        );
        assert_eq!(editor.text(), "remind");
        assert!(editor.can_redo());
    }

    #[test]
    fn test_side_effect_failure_without_history_reports_rollback_failure() {
        let mut editor = editor("x");
        let outcome: Result<SideEffectRef, &str> = Err("boom");
        assert!(matches!(
            editor.complete_redo_side_effect(outcome),
            Err(SideEffectFailure::RollbackFailed { .. })
        ));
    }

    #[test]
    fn test_history_round_trips_through_json() {
        let mut editor = editor("a");
        editor.focus_line(0, 1);
        editor.insert_text("b");
        editor.toggle_bullet_prefix();
        let json = editor.export_history().unwrap();

        let mut resumed = Editor::new();
        resumed.load(&editor.text());
        resumed.import_history(&json).unwrap();
        resumed.undo();
        assert_eq!(resumed.text(), "ab");
        resumed.undo();
        assert_eq!(resumed.text(), "a");
    }

    #[test]
    fn test_insta_document_shape_after_outline_edits() {
        let mut editor = editor("Groceries");
        editor.focus_line(0, 9);
        editor.split_line();
        editor.indent();
        editor.toggle_checkbox_prefix();
        editor.insert_text("milk");
        editor.split_line();
        editor.insert_text("eggs");
        editor.toggle_checkbox_prefix();
        insta::assert_debug_snapshot!(texts(&editor), @r#"
        [
            "Groceries",
            "\t☐ milk",
            "\t☑ eggs",
        ]
        "#);
    }
}
