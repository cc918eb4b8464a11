/*!
 * # Editing Core
 *
 * A note is an ordered list of [`Line`]s. Each line owns its text and a
 * caret; exactly one line is focused. Everything outside this module sees
 * the document through a single global char offset space where lines are
 * joined with `\n`.
 *
 * ## Line prefixes
 *
 * ```text
 * \t\t☐ buy milk
 * ^^^^ ^^^^^^^^
 *  |  |  content
 *  |  marker ("• ", "☐ " or "☑ ")
 *  indent (one tab per level)
 * ```
 *
 * The indent and marker together are the line's [`Prefix`]. Structural
 * operations (split, merge, indent, block moves) reason about prefixes so
 * that outlines keep their shape while being edited.
 *
 * Mutating methods are crate-private where they would bypass undo
 * bookkeeping; external callers go through [`crate::Editor`].
 */

mod blocks;
pub mod document;
pub mod line;
mod structure;
pub mod text;

pub use blocks::Direction;
pub use document::{Document, Selection};
pub use line::{Line, Marker, Prefix, TAB};
