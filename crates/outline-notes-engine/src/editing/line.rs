use crate::editing::text;

/// Indent character. One tab is one level of outline depth.
pub const TAB: char = '\t';

/// Marker types that may follow a line's leading tabs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Marker {
    #[default]
    None,
    Bullet,            // "• "
    CheckboxUnchecked, // "☐ "
    CheckboxChecked,   // "☑ "
}

impl Marker {
    const PARSE_ORDER: [Marker; 3] = [
        Marker::Bullet,
        Marker::CheckboxUnchecked,
        Marker::CheckboxChecked,
    ];

    /// Literal text of the marker, including its trailing space
    pub fn as_str(self) -> &'static str {
        match self {
            Marker::None => "",
            Marker::Bullet => "• ",
            Marker::CheckboxUnchecked => "☐ ",
            Marker::CheckboxChecked => "☑ ",
        }
    }

    pub fn char_len(self) -> usize {
        text::char_len(self.as_str())
    }

    pub fn is_checkbox(self) -> bool {
        matches!(self, Marker::CheckboxUnchecked | Marker::CheckboxChecked)
    }

    /// Marker carried onto the line created by splitting a line with this marker.
    /// A finished task never spawns another finished task.
    pub fn inherited(self) -> Self {
        match self {
            Marker::CheckboxChecked => Marker::CheckboxUnchecked,
            other => other,
        }
    }

    fn parse(rest: &str) -> Self {
        Self::PARSE_ORDER
            .into_iter()
            .find(|marker| rest.starts_with(marker.as_str()))
            .unwrap_or(Marker::None)
    }
}

/// Leading tabs plus optional marker, derived from a line's text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Prefix {
    pub tabs: usize,
    pub marker: Marker,
}

impl Prefix {
    /// Parse the longest prefix at the start of `text`
    pub fn parse(text: &str) -> Self {
        let tabs = text.chars().take_while(|&c| c == TAB).count();
        // Tabs are single-byte, so the char count is also the byte offset
        let marker = Marker::parse(&text[tabs..]);
        Self { tabs, marker }
    }

    pub fn char_len(&self) -> usize {
        self.tabs + self.marker.char_len()
    }

    fn byte_len(&self) -> usize {
        self.tabs + self.marker.as_str().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs == 0 && self.marker == Marker::None
    }

    pub fn render(&self) -> String {
        let mut out = "\t".repeat(self.tabs);
        out.push_str(self.marker.as_str());
        out
    }
}

/// One line of the document: raw text plus a char cursor into it.
///
/// Invariant: `cursor <= len()` at all times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    text: String,
    cursor: usize,
}

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cursor: 0,
        }
    }

    pub fn with_cursor(text: impl Into<String>, cursor: usize) -> Self {
        let mut line = Self::new(text);
        line.set_cursor(cursor);
        line
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        text::char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.len());
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.set_cursor(self.cursor);
    }

    pub fn prefix(&self) -> Prefix {
        Prefix::parse(&self.text)
    }

    pub fn prefix_str(&self) -> &str {
        &self.text[..self.prefix().byte_len()]
    }

    pub fn content(&self) -> &str {
        &self.text[self.prefix().byte_len()..]
    }

    /// Cursor relative to the content, clamped into `[0, content len]`
    pub fn content_cursor(&self) -> usize {
        let content_len = text::char_len(self.content());
        self.cursor
            .saturating_sub(self.prefix().char_len())
            .min(content_len)
    }

    pub fn indent_depth(&self) -> usize {
        self.prefix().tabs
    }

    /// Insert `s` at the cursor and advance past it
    pub(crate) fn insert_at_cursor(&mut self, s: &str) {
        self.text = text::splice(&self.text, self.cursor..self.cursor, s);
        self.cursor += text::char_len(s);
    }

    /// Replace the chars in `range` and park the cursor after the inserted text
    pub(crate) fn replace_chars(&mut self, range: std::ops::Range<usize>, s: &str) {
        let len = self.len();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        self.text = text::splice(&self.text, start..end, s);
        self.cursor = start + text::char_len(s);
    }

    /// Swap the prefix for `new`, keeping the cursor on the same content char
    pub(crate) fn replace_prefix(&mut self, new: Prefix) {
        let old_len = self.prefix().char_len();
        let new_len = new.char_len();
        let content = self.content().to_string();
        let cursor = if self.cursor >= old_len {
            self.cursor - old_len + new_len
        } else {
            self.cursor.min(new_len)
        };
        self.text = new.render() + &content;
        self.set_cursor(cursor);
    }

    /// Prepend one tab
    pub(crate) fn indent(&mut self) {
        self.text.insert(0, TAB);
        self.cursor += 1;
    }

    /// Remove one leading tab; returns whether one was there
    pub(crate) fn unindent(&mut self) -> bool {
        if self.text.starts_with(TAB) {
            self.text.remove(0);
            self.cursor = self.cursor.saturating_sub(1);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("plain", 0, Marker::None)]
    #[case("\t\tplain", 2, Marker::None)]
    #[case("• item", 0, Marker::Bullet)]
    #[case("\t☐ task", 1, Marker::CheckboxUnchecked)]
    #[case("\t\t\t☑ done", 3, Marker::CheckboxChecked)]
    #[case("•no space", 0, Marker::None)]
    #[case("x\t• not a prefix", 0, Marker::None)]
    fn test_prefix_parse(#[case] text: &str, #[case] tabs: usize, #[case] marker: Marker) {
        assert_eq!(Prefix::parse(text), Prefix { tabs, marker });
    }

    #[test]
    fn test_prefix_and_content_split() {
        let line = Line::with_cursor("\t• hello", 5);
        assert_eq!(line.prefix_str(), "\t• ");
        assert_eq!(line.content(), "hello");
        assert_eq!(line.content_cursor(), 2);
    }

    #[test]
    fn test_content_cursor_inside_prefix_clamps_to_zero() {
        let line = Line::with_cursor("\t☐ task", 1);
        assert_eq!(line.content_cursor(), 0);
    }

    #[test]
    fn test_cursor_is_clamped_to_text() {
        let mut line = Line::with_cursor("abc", 99);
        assert_eq!(line.cursor(), 3);
        line.set_text("a");
        assert_eq!(line.cursor(), 1);
    }

    #[test]
    fn test_checked_marker_is_inherited_unchecked() {
        assert_eq!(Marker::CheckboxChecked.inherited(), Marker::CheckboxUnchecked);
        assert_eq!(Marker::Bullet.inherited(), Marker::Bullet);
    }

    #[test]
    fn test_replace_prefix_keeps_cursor_on_content() {
        let mut line = Line::with_cursor("\tabc", 3);
        line.replace_prefix(Prefix {
            tabs: 1,
            marker: Marker::Bullet,
        });
        assert_eq!(line.text(), "\t• abc");
        assert_eq!(line.cursor(), 5);
        assert_eq!(line.content_cursor(), 2);
    }

    #[test]
    fn test_indent_and_unindent_move_cursor() {
        let mut line = Line::with_cursor("x", 1);
        line.indent();
        assert_eq!((line.text(), line.cursor()), ("\tx", 2));
        assert!(line.unindent());
        assert!(!line.unindent());
        assert_eq!((line.text(), line.cursor()), ("x", 1));
    }
}
