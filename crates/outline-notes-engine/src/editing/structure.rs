//! Line-level edit primitives used by the [`Editor`](crate::Editor).
//!
//! These mutate the focused line (and its neighbours) without any
//! knowledge of undo history. Only the editor calls them, so history
//! boundaries are always set around them.

use crate::editing::document::Document;
use crate::editing::line::{Line, Marker, Prefix};

impl Document {
    /// Insert text containing no newline at the caret
    pub(crate) fn insert_at_cursor(&mut self, s: &str) {
        debug_assert!(!s.contains('\n'));
        self.focused_line_mut().insert_at_cursor(s);
    }

    /// Delete the char before the caret within the focused line
    pub(crate) fn delete_char_before_cursor(&mut self) -> bool {
        let line = self.focused_line_mut();
        let cursor = line.cursor();
        if cursor == 0 {
            return false;
        }
        line.replace_chars(cursor - 1..cursor, "");
        true
    }

    /// Delete the char after the caret within the focused line
    pub(crate) fn delete_char_after_cursor(&mut self) -> bool {
        let line = self.focused_line_mut();
        let cursor = line.cursor();
        if cursor >= line.len() {
            return false;
        }
        line.replace_chars(cursor..cursor + 1, "");
        line.set_cursor(cursor);
        true
    }

    /// Remove one prefix element from the focused line: the marker if there
    /// is one, otherwise a single tab. The caret lands at the content start.
    pub(crate) fn strip_prefix_element(&mut self) -> bool {
        let line = self.focused_line_mut();
        let prefix = line.prefix();
        let stripped = match prefix.marker {
            Marker::None if prefix.tabs == 0 => return false,
            Marker::None => Prefix {
                tabs: prefix.tabs - 1,
                marker: Marker::None,
            },
            _ => Prefix {
                marker: Marker::None,
                ..prefix
            },
        };
        line.replace_prefix(stripped);
        line.set_cursor(stripped.char_len());
        true
    }

    /// Split the focused line at the caret.
    ///
    /// The new line inherits the prefix (a checked box becomes unchecked),
    /// unless the caret sat inside the prefix, in which case the new line
    /// gets no inherited prefix. Focus moves to the new line.
    pub(crate) fn split_focused_line(&mut self) {
        self.selection = None;
        let index = self.focused;
        let line = &self.lines[index];
        let prefix = line.prefix();
        let cursor = line.cursor();
        let text = line.text().to_string();

        let head = crate::editing::text::char_slice(&text, 0..cursor).to_string();
        let tail = crate::editing::text::char_slice(&text, cursor..usize::MAX).to_string();

        let inherited = if cursor < prefix.char_len() {
            Prefix::default()
        } else {
            Prefix {
                marker: prefix.marker.inherited(),
                ..prefix
            }
        };
        let new_cursor = inherited.char_len();
        let new_line = Line::with_cursor(inherited.render() + &tail, new_cursor);

        self.lines[index] = Line::with_cursor(head, cursor);
        self.lines.insert(index + 1, new_line);
        self.focused = index + 1;
    }

    /// Append the focused line onto the previous one. The caret lands at the
    /// join point. No-op on the first line.
    pub(crate) fn merge_focused_into_previous(&mut self) -> bool {
        self.selection = None;
        let index = self.focused;
        if index == 0 {
            return false;
        }
        let removed = self.lines.remove(index);
        let previous = &mut self.lines[index - 1];
        let join = previous.len();
        previous.set_text(previous.text().to_string() + removed.text());
        previous.set_cursor(join);
        self.focused = index - 1;
        true
    }

    /// Append the next line onto the focused one. The caret lands at the
    /// join point. No-op on the last line.
    pub(crate) fn merge_next_into_focused(&mut self) -> bool {
        self.selection = None;
        let index = self.focused;
        if index + 1 >= self.lines.len() {
            return false;
        }
        let removed = self.lines.remove(index + 1);
        let line = &mut self.lines[index];
        let join = line.len();
        line.set_text(line.text().to_string() + removed.text());
        line.set_cursor(join);
        true
    }
}
