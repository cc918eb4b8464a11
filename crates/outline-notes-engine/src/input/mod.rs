//! Input-method boundary.
//!
//! [`InputConnection`] translates composing/commit calls from a soft
//! keyboard or IME into [`Editor`] operations. It only remembers the
//! composing region; every change goes through the editor so undo history
//! sees adapter edits exactly like any other input.

use std::ops::Range;

use crate::editor::Editor;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputConnection {
    composing: Option<Range<usize>>,
}

impl InputConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current composing region in global char offsets
    pub fn composing_region(&self) -> Option<Range<usize>> {
        self.composing.clone()
    }

    /// Commit `text`, replacing the composing region if there is one,
    /// otherwise the selection or nothing
    pub fn commit_text(&mut self, editor: &mut Editor, text: &str) {
        match self.take_composing(editor) {
            Some(region) => editor.replace_range(region.start, region.end, text),
            None => editor.insert_text(text),
        }
    }

    /// Replace the composing region (or selection, or caret) with `text` and
    /// mark the result as the new composing region
    pub fn set_composing_text(&mut self, editor: &mut Editor, text: &str) {
        let region = self
            .take_composing(editor)
            .or_else(|| editor.selection().map(|selection| selection.range()))
            .unwrap_or_else(|| {
                let caret = editor.cursor_offset();
                caret..caret
            });
        editor.replace_range(region.start, region.end, text);
        let end = editor.cursor_offset();
        self.composing = (!text.is_empty() && end > region.start).then_some(region.start..end);
    }

    /// Mark existing text as composing without changing it
    pub fn set_composing_region(&mut self, editor: &Editor, start: usize, end: usize) {
        let len = editor.document().len();
        let (start, end) = (start.min(end).min(len), start.max(end).min(len));
        self.composing = (start < end).then_some(start..end);
    }

    /// Keep the composed text as it is and stop composing
    pub fn finish_composing_text(&mut self) {
        self.composing = None;
    }

    /// Delete `before` chars before the caret (or selection start) and
    /// `after` chars after it (or after the selection end)
    pub fn delete_surrounding_text(&mut self, editor: &mut Editor, before: usize, after: usize) {
        self.composing = None;
        let (start, end) = match editor.selection() {
            Some(selection) => (selection.min(), selection.max()),
            None => {
                let caret = editor.cursor_offset();
                (caret, caret)
            }
        };
        let len = editor.document().len();
        let tail_end = (end + after).min(len);
        if tail_end > end {
            editor.replace_range(end, tail_end, "");
        }
        let head_start = start.saturating_sub(before);
        if head_start < start {
            editor.replace_range(head_start, start, "");
        }
    }

    /// Move the caret or selection on behalf of the input method
    pub fn set_selection(&mut self, editor: &mut Editor, start: usize, end: usize) {
        if start == end {
            editor.set_cursor(start);
        } else {
            editor.set_selection(start, end);
        }
    }

    /// The composing region, clamped to the current document
    fn take_composing(&mut self, editor: &Editor) -> Option<Range<usize>> {
        let region = self.composing.take()?;
        let len = editor.document().len();
        let (start, end) = (region.start.min(len), region.end.min(len));
        (start < end).then_some(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor(text: &str, caret: usize) -> Editor {
        let mut editor = Editor::new();
        editor.load(text);
        editor.set_cursor(caret);
        editor
    }

    #[test]
    fn test_composing_then_commit_replaces_region() {
        let mut editor = editor("• ", 2);
        let mut input = InputConnection::new();

        input.set_composing_text(&mut editor, "he");
        assert_eq!(input.composing_region(), Some(2..4));
        input.set_composing_text(&mut editor, "hel");
        assert_eq!(editor.text(), "• hel");

        input.commit_text(&mut editor, "hello");
        assert_eq!(editor.text(), "• hello");
        assert_eq!(input.composing_region(), None);
        assert_eq!(editor.cursor_offset(), 7);
    }

    #[test]
    fn test_composition_is_one_undo_step() {
        let mut editor = editor("x", 1);
        let mut input = InputConnection::new();
        input.set_composing_text(&mut editor, "y");
        input.set_composing_text(&mut editor, "yo");
        input.commit_text(&mut editor, "yes");

        editor.undo();
        assert_eq!(editor.text(), "x");
    }

    #[test]
    fn test_commit_newline_splits_with_prefix() {
        let mut editor = editor("☐ milk", 6);
        let mut input = InputConnection::new();
        input.commit_text(&mut editor, "\n");
        assert_eq!(editor.document().line_texts(), vec!["☐ milk", "☐ "]);
    }

    #[test]
    fn test_set_composing_region_marks_existing_word() {
        let mut editor = editor("teh cat", 3);
        let mut input = InputConnection::new();
        input.set_composing_region(&editor, 0, 3);
        input.commit_text(&mut editor, "the");
        assert_eq!(editor.text(), "the cat");

        input.set_composing_region(&editor, 5, 99);
        assert_eq!(input.composing_region(), Some(5..7));
        input.finish_composing_text();
        assert_eq!(input.composing_region(), None);
    }

    #[test]
    fn test_delete_surrounding_around_caret() {
        let mut editor = editor("abcdef", 3);
        let mut input = InputConnection::new();
        input.delete_surrounding_text(&mut editor, 2, 1);
        assert_eq!(editor.text(), "aef");
        assert_eq!(editor.cursor_offset(), 1);
    }

    #[test]
    fn test_delete_surrounding_crosses_lines() {
        let mut editor = editor("ab\ncd", 3);
        let mut input = InputConnection::new();
        input.delete_surrounding_text(&mut editor, 1, 0);
        assert_eq!(editor.text(), "abcd");
    }

    #[test]
    fn test_set_selection_routes_through_editor() {
        let mut editor = editor("hello", 0);
        let mut input = InputConnection::new();
        input.set_selection(&mut editor, 1, 3);
        assert_eq!(editor.selected_text().as_deref(), Some("el"));
        input.set_selection(&mut editor, 4, 4);
        assert_eq!(editor.selection(), None);
        assert_eq!(editor.cursor_offset(), 4);
    }
}
