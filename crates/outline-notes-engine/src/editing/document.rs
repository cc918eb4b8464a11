use std::ops::{Range, RangeInclusive};

use crate::editing::line::{Line, Marker, Prefix, TAB};
use crate::editing::text;

/// A selection as two global char offsets. `start` is the anchor and may
/// be greater than `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn min(&self) -> usize {
        self.start.min(self.end)
    }

    pub fn max(&self) -> usize {
        self.start.max(self.end)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.min()..self.max()
    }
}

/// Line-oriented document state
///
/// The document is an ordered list of [`Line`]s that conceptually form one
/// text joined with a single `\n` between each pair. Every position the
/// document exposes is a *global offset* into that joined text, counted in
/// chars. Alongside the lines it tracks:
///
/// - the focused line, whose [`Line::cursor`] is the caret,
/// - an optional selection, during which the caret is parked at the
///   selection's lower bound so clearing it leaves the caret in place.
///
/// Invariants upheld by every method:
/// - there is always at least one line,
/// - `focused < lines.len()`,
/// - out-of-range offsets and line indices are clamped, never rejected.
///
/// ```rust
/// # use outline_notes_engine::Document;
/// let mut doc = Document::from_text("a\nb\nc");
/// assert_eq!(doc.offset_to_line_local(3), (1, 1));
/// assert_eq!(doc.line_start_offset(2), 4);
///
/// doc.set_selection(0, 1);
/// assert_eq!(doc.effective_selection_range(), Some(0..2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub(crate) lines: Vec<Line>,
    pub(crate) focused: usize,
    pub(crate) selection: Option<Selection>,
}

impl Default for Document {
    fn default() -> Self {
        Self::from_text("")
    }
}

impl Document {
    /// Split `text` on `\n` into lines. The caret starts at offset 0.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: split_lines(text),
            focused: 0,
            selection: None,
        }
    }

    /// Create a document from raw bytes, which must be valid UTF-8
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lines: Vec<Line> = lines.into_iter().map(Line::new).collect();
        if lines.is_empty() {
            lines.push(Line::default());
        }
        Self {
            lines,
            focused: 0,
            selection: None,
        }
    }

    /// The full newline-joined text
    pub fn text(&self) -> String {
        self.line_texts().join("\n")
    }

    pub fn line_texts(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.text().to_string()).collect()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Length of the joined text in chars
    pub fn len(&self) -> usize {
        self.lines.iter().map(Line::len).sum::<usize>() + self.lines.len() - 1
    }

    /// True when the document is a single empty line
    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn focused_line_index(&self) -> usize {
        self.focused
    }

    pub fn focused_line(&self) -> &Line {
        &self.lines[self.focused]
    }

    pub(crate) fn focused_line_mut(&mut self) -> &mut Line {
        &mut self.lines[self.focused]
    }

    /// Global offset of the caret
    pub fn cursor_offset(&self) -> usize {
        self.line_start_offset(self.focused) + self.focused_line().cursor()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// True for a non-collapsed selection
    pub fn has_selection(&self) -> bool {
        self.selection.is_some_and(|s| !s.is_collapsed())
    }

    // ============ Offset conversion ============

    /// Global offset of the first char of `line_index` (clamped to the last line)
    pub fn line_start_offset(&self, line_index: usize) -> usize {
        let line_index = line_index.min(self.lines.len() - 1);
        self.lines[..line_index]
            .iter()
            .map(|line| line.len() + 1)
            .sum()
    }

    /// Convert a global offset into `(line index, offset within that line)`.
    /// Offsets past the end clamp to the end of the last line.
    pub fn offset_to_line_local(&self, offset: usize) -> (usize, usize) {
        let mut remaining = offset.min(self.len());
        for (index, line) in self.lines.iter().enumerate() {
            let len = line.len();
            if remaining <= len {
                return (index, remaining);
            }
            remaining -= len + 1;
        }
        let last = self.lines.len() - 1;
        (last, self.lines[last].len())
    }

    // ============ Caret and selection ============

    /// Move the caret to a global offset, dropping any selection
    pub fn set_cursor(&mut self, offset: usize) {
        self.selection = None;
        let (line, local) = self.offset_to_line_local(offset);
        self.focused = line;
        self.lines[line].set_cursor(local);
    }

    /// Focus a line with a local cursor, dropping any selection
    pub fn focus_line(&mut self, line_index: usize, cursor: usize) {
        self.selection = None;
        self.focused = line_index.min(self.lines.len() - 1);
        self.lines[self.focused].set_cursor(cursor);
    }

    /// Store a selection and park the caret at its lower bound
    pub fn set_selection(&mut self, start: usize, end: usize) {
        let len = self.len();
        let selection = Selection::new(start.min(len), end.min(len));
        let (line, local) = self.offset_to_line_local(selection.min());
        self.focused = line;
        self.lines[line].set_cursor(local);
        self.selection = Some(selection);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn select_all(&mut self) {
        self.set_selection(0, self.len());
    }

    /// The selection as an ordered range, widened by the trailing newline
    /// when it covers whole lines.
    ///
    /// The newline is included only if the selection begins at a line start
    /// and ends right before a `\n`. A collapsed selection is never widened.
    pub fn effective_selection_range(&self) -> Option<Range<usize>> {
        let selection = self.selection?;
        let range = selection.range();
        if range.is_empty() {
            return Some(range);
        }
        let (_, start_local) = self.offset_to_line_local(range.start);
        let (end_line, end_local) = self.offset_to_line_local(range.end);
        let at_line_start = start_local == 0;
        let before_newline =
            end_line + 1 < self.lines.len() && end_local == self.lines[end_line].len();
        if at_line_start && before_newline {
            Some(range.start..range.end + 1)
        } else {
            Some(range)
        }
    }

    /// Text covered by the effective selection range
    pub fn selected_text(&self) -> Option<String> {
        if !self.has_selection() {
            return None;
        }
        let range = self.effective_selection_range()?;
        Some(text::char_slice(&self.text(), range).to_string())
    }

    /// Lines touched by the selection, or just the focused line. A
    /// selection ending at the very start of a line does not include it.
    pub fn selected_line_range(&self) -> RangeInclusive<usize> {
        match self.selection {
            Some(selection) if !selection.is_collapsed() => {
                let (first, _) = self.offset_to_line_local(selection.min());
                let (last, end_local) = self.offset_to_line_local(selection.max());
                if end_local == 0 && last > first {
                    first..=last - 1
                } else {
                    first..=last
                }
            }
            _ => self.focused..=self.focused,
        }
    }

    // ============ Selection edits ============

    /// Delete the effective selection range. No-op without a selection.
    pub fn delete_selection(&mut self) -> bool {
        self.replace_selection_with("")
    }

    /// Replace the effective selection range with `replacement`.
    /// No-op without a selection.
    pub fn replace_selection(&mut self, replacement: &str) -> bool {
        self.replace_selection_with(replacement)
    }

    fn replace_selection_with(&mut self, replacement: &str) -> bool {
        if !self.has_selection() {
            return false;
        }
        let Some(range) = self.effective_selection_range() else {
            return false;
        };
        self.splice(range, replacement);
        self.remove_empty_line_at_cursor();
        true
    }

    /// Replace a global char range with `insert`, rebuilding the lines and
    /// parking the caret after the inserted text. No newline widening and
    /// no empty-line cleanup.
    pub(crate) fn splice(&mut self, range: Range<usize>, insert: &str) {
        let len = self.len();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        let new_text = text::splice(&self.text(), start..end, insert);
        self.lines = split_lines(&new_text);
        self.set_cursor(start + text::char_len(insert));
    }

    /// Drop the line under the caret if it is empty and not the last line
    fn remove_empty_line_at_cursor(&mut self) {
        let index = self.focused;
        if self.lines[index].is_empty() && index + 1 < self.lines.len() {
            self.lines.remove(index);
            self.lines[index].set_cursor(0);
        }
    }

    // ============ Indentation ============

    /// Prepend one tab to every line in `targets`, shifting the selection so
    /// it keeps covering the same characters
    pub fn indent(&mut self, targets: RangeInclusive<usize>) -> bool {
        let targets = self.clamp_line_range(targets);
        let selection = self.selection.map(|selection| {
            let shift = |offset: usize| {
                let (line, _) = self.offset_to_line_local(offset);
                offset + targets.clone().filter(|&index| index <= line).count()
            };
            Selection::new(shift(selection.start), shift(selection.end))
        });

        for index in targets {
            self.lines[index].indent();
        }
        self.selection = selection;
        true
    }

    /// Remove one leading tab from every line in `targets` that has one
    pub fn unindent(&mut self, targets: RangeInclusive<usize>) -> bool {
        let removed: Vec<usize> = self
            .clamp_line_range(targets)
            .filter(|&index| self.lines[index].text().starts_with(TAB))
            .collect();
        if removed.is_empty() {
            return false;
        }

        let selection = self.selection.map(|selection| {
            let shift = |offset: usize| {
                let (line, local) = self.offset_to_line_local(offset);
                let before = removed.iter().filter(|&&index| index < line).count();
                let on_line = usize::from(local > 0 && removed.contains(&line));
                offset - before - on_line
            };
            Selection::new(shift(selection.start), shift(selection.end))
        });

        for &index in &removed {
            self.lines[index].unindent();
        }
        self.selection = selection;
        true
    }

    fn clamp_line_range(&self, range: RangeInclusive<usize>) -> RangeInclusive<usize> {
        let last = self.lines.len() - 1;
        let start = (*range.start()).min(last);
        let end = (*range.end()).clamp(start, last);
        start..=end
    }

    // ============ Prefix toggles ============

    /// Cycle none -> bullet -> none on the focused line. A checkbox is
    /// replaced by a bullet. Leading tabs are kept.
    pub fn toggle_bullet_prefix(&mut self) -> bool {
        self.rewrite_focused_marker(|marker| match marker {
            Marker::Bullet => Marker::None,
            _ => Marker::Bullet,
        })
    }

    /// Cycle none -> unchecked -> checked -> none on the focused line.
    /// A bullet is replaced by an unchecked box.
    pub fn toggle_checkbox_prefix(&mut self) -> bool {
        self.rewrite_focused_marker(|marker| match marker {
            Marker::None | Marker::Bullet => Marker::CheckboxUnchecked,
            Marker::CheckboxUnchecked => Marker::CheckboxChecked,
            Marker::CheckboxChecked => Marker::None,
        })
    }

    /// Flip a checkbox on any line between checked and unchecked.
    /// Lines without a checkbox are left alone.
    pub fn toggle_checkbox_state(&mut self, line_index: usize) -> bool {
        let Some(line) = self.lines.get_mut(line_index) else {
            return false;
        };
        let prefix = line.prefix();
        let marker = match prefix.marker {
            Marker::CheckboxUnchecked => Marker::CheckboxChecked,
            Marker::CheckboxChecked => Marker::CheckboxUnchecked,
            _ => return false,
        };
        line.replace_prefix(Prefix { marker, ..prefix });
        true
    }

    fn rewrite_focused_marker(&mut self, next: impl FnOnce(Marker) -> Marker) -> bool {
        // Marker widths differ, so stored selection offsets would go stale
        self.selection = None;
        let line = self.focused_line_mut();
        let prefix = line.prefix();
        line.replace_prefix(Prefix {
            marker: next(prefix.marker),
            ..prefix
        });
        true
    }

    // ============ Whole-document replacement ============

    /// Reset the lines from a snapshot's texts with the given focus and cursor
    pub(crate) fn restore(&mut self, line_texts: &[String], focused: usize, cursor: usize) {
        self.lines = line_texts.iter().map(Line::new).collect();
        if self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.focus_line(focused, cursor);
    }

    /// Replace the whole text, keeping the caret at the same global offset
    /// where possible
    pub(crate) fn replace_all(&mut self, text: &str) {
        let offset = self.cursor_offset();
        self.lines = split_lines(text);
        self.set_cursor(offset);
    }
}

fn split_lines(text: &str) -> Vec<Line> {
    text.split('\n').map(Line::new).collect()
}
