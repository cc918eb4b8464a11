//! Indentation-aware block relocation.
//!
//! A *logical block* is a line plus every immediately following line with a
//! strictly greater indent depth. Moving a block carries its whole subtree.

use std::ops::RangeInclusive;

use crate::editing::document::{Document, Selection};

/// Which way a block move goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Document {
    /// Index of the last line in the logical block starting at `index`
    pub fn block_end(&self, index: usize) -> usize {
        let index = index.min(self.lines.len() - 1);
        let depth = self.lines[index].indent_depth();
        let mut end = index;
        while end + 1 < self.lines.len() && self.lines[end + 1].indent_depth() > depth {
            end += 1;
        }
        end
    }

    /// True when the selection starts on a line deeper than some other
    /// selected line, i.e. a block move would tear a subtree from its parent
    pub fn would_orphan_children(&self) -> bool {
        let lines = self.selected_line_range();
        let first_depth = self.lines[*lines.start()].indent_depth();
        lines
            .map(|index| self.lines[index].indent_depth())
            .any(|depth| depth < first_depth)
    }

    pub fn move_block_up(&mut self) -> bool {
        self.move_block(Direction::Up)
    }

    pub fn move_block_down(&mut self) -> bool {
        self.move_block(Direction::Down)
    }

    /// Move the focused block (or the selected lines with their subtrees)
    /// past the neighbouring sibling block.
    ///
    /// When the selection would orphan children the move degrades to a
    /// single physical line. Focus and selection follow the moved content.
    pub fn move_block(&mut self, direction: Direction) -> bool {
        let orphaning = self.would_orphan_children();
        let block = self.moving_range(orphaning);
        let (start, end) = (*block.start(), *block.end());
        let block_len = end - start + 1;
        let last = self.lines.len() - 1;

        // Lines the block swaps places with
        let (other_start, other_end) = match direction {
            Direction::Up => {
                if start == 0 {
                    return false;
                }
                let mut target = start - 1;
                if !orphaning {
                    let depth = self.lines[start].indent_depth();
                    while target > 0 && self.lines[target].indent_depth() > depth {
                        target -= 1;
                    }
                }
                (target, start - 1)
            }
            Direction::Down => {
                if end == last {
                    return false;
                }
                let target = if orphaning {
                    end + 1
                } else {
                    self.block_end(end + 1)
                };
                (end + 1, target)
            }
        };
        let other_len = other_end - other_start + 1;

        let remap = |index: usize| -> usize {
            match direction {
                Direction::Up if (start..=end).contains(&index) => index - other_len,
                Direction::Up if (other_start..=other_end).contains(&index) => index + block_len,
                Direction::Down if (start..=end).contains(&index) => index + other_len,
                Direction::Down if (other_start..=other_end).contains(&index) => {
                    index - block_len
                }
                _ => index,
            }
        };

        let selection = self.selection.map(|selection| {
            let start = self.offset_to_line_local(selection.start);
            let end = self.offset_to_line_local(selection.end);
            (start, end)
        });
        let focused = remap(self.focused);

        match direction {
            Direction::Up => self.lines[other_start..=end].rotate_left(other_len),
            Direction::Down => self.lines[start..=other_end].rotate_right(other_len),
        }

        self.focused = focused;
        self.selection = selection.map(|((start_line, start_local), (end_line, end_local))| {
            Selection::new(
                self.line_start_offset(remap(start_line)) + start_local,
                self.line_start_offset(remap(end_line)) + end_local,
            )
        });
        log::trace!("moved lines {start}..={end} {direction:?} past {other_start}..={other_end}");
        true
    }

    /// The lines a move carries: the selected lines plus the subtrees of
    /// their last members, or only the selected lines when orphaning
    fn moving_range(&self, orphaning: bool) -> RangeInclusive<usize> {
        let lines = self.selected_line_range();
        let (start, mut end) = (*lines.start(), *lines.end());
        if !orphaning {
            let depth = self.lines[start].indent_depth();
            while end + 1 < self.lines.len() && self.lines[end + 1].indent_depth() > depth {
                end += 1;
            }
        }
        start..=end
    }
}
