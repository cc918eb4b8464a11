//! Char-indexed string helpers.
//!
//! Every offset the engine hands out counts `char`s, never bytes, so all
//! slicing goes through these functions.

use std::ops::Range;

/// Number of chars in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the char at `char_index`, or `text.len()` past the end.
pub fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Slice `text` by a char range. Out-of-range bounds are clamped.
pub fn char_slice(text: &str, range: Range<usize>) -> &str {
    let start = byte_index(text, range.start);
    let end = byte_index(text, range.end.max(range.start));
    &text[start..end]
}

/// Char at `char_index`, if any.
pub fn char_at(text: &str, char_index: usize) -> Option<char> {
    text.chars().nth(char_index)
}

/// Replace the chars in `range` with `insert`, returning the new string.
pub fn splice(text: &str, range: Range<usize>, insert: &str) -> String {
    let start = byte_index(text, range.start);
    let end = byte_index(text, range.end.max(range.start));
    let mut out = String::with_capacity(text.len() - (end - start) + insert.len());
    out.push_str(&text[..start]);
    out.push_str(insert);
    out.push_str(&text[end..]);
    out
}
