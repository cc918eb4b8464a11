/*!
 * # Undo/Redo History
 *
 * Snapshot-based command history with line-granularity boundaries.
 *
 * ## Boundaries
 *
 * All edits to one line, while focus stays on that line, collapse into a
 * single undo step:
 *
 * ```text
 * IDLE --begin_editing_line(L)--> EDITING(L, pending = pre-state of L)
 * EDITING(L) --edit on L--> EDITING(L)                 no new snapshot
 * EDITING(L) --focus moves to L'--> commit(pending); EDITING(L')
 * EDITING(L) --split/merge--> commit(pending); pending = pre-split state
 * ```
 *
 * The structural case keeps the pre-split state pending, so an Enter and
 * whatever is typed on the new line undo together.
 *
 * ## Command grouping
 *
 * - Discrete commands (bullet/checkbox toggles, block moves, paste, ...)
 *   commit before and after themselves: each press is one step.
 * - Incremental commands (indent/unindent) only commit when the previous
 *   command was not also indent/unindent, so a run collapses into one step.
 *
 * ## Baseline
 *
 * The baseline is the floor captured once per document load. When the
 * undo stack runs dry, one more undo returns the baseline; after that undo
 * is a no-op until something new is committed.
 *
 * ## Side effects
 *
 * An external resource created by an edit is attached to the most recent
 * undo entry. Undo hands it back so the caller can destroy it; the entry
 * pushed to the redo stack carries it forward so redo can recreate it, and
 * the recreated reference is written back with
 * [`History::attach_side_effect`].
 */

mod persist;
mod snapshot;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::editing::Document;

pub use persist::{HISTORY_FORMAT_VERSION, HistoryImportError, HistoryState};
pub use snapshot::{PendingEdit, SideEffectRef, Snapshot};

/// Default cap on the undo stack
pub const DEFAULT_MAX_UNDO_LEVELS: usize = 50;

/// Commands that take part in undo grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    ToggleBullet,
    ToggleCheckbox,
    ToggleCheckboxState,
    Indent,
    Unindent,
    MoveBlockUp,
    MoveBlockDown,
    DeleteSelection,
    ReplaceSelection,
    Paste,
    ExternalEdit,
}

impl CommandKind {
    /// Indent and unindent collapse into one step while repeated
    pub fn is_incremental(self) -> bool {
        matches!(self, CommandKind::Indent | CommandKind::Unindent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Oldest entries beyond this are silently dropped. Zero means unbounded.
    pub max_undo_levels: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: DEFAULT_MAX_UNDO_LEVELS,
        }
    }
}

/// Undo/redo state for one open document
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    baseline: Option<Snapshot>,
    is_at_baseline: bool,
    pending: Option<PendingEdit>,
    last_command: Option<CommandKind>,
    config: HistoryConfig,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    // ============ Line-level boundaries ============

    /// Start (or keep) editing `line_index`. If another line was being
    /// edited its pending snapshot is committed first.
    pub fn begin_editing_line(&mut self, line_index: usize, document: &Document) {
        match self.pending.as_ref().map(|pending| pending.line_index) {
            Some(current) if current == line_index => {}
            Some(_) => {
                self.commit(document);
                self.capture(line_index, document);
            }
            None => self.capture(line_index, document),
        }
    }

    /// Focus moved. Commits the previous line's edits when the line changed
    /// and breaks any indent/unindent run.
    pub fn focus_changed(&mut self, line_index: usize, document: &Document) {
        self.last_command = None;
        self.begin_editing_line(line_index, document);
    }

    /// Typing breaks any indent/unindent run but stays within the line step.
    /// The edit that follows invalidates redo.
    pub fn note_typing(&mut self, document: &Document) {
        self.last_command = None;
        self.begin_editing_line(document.focused_line_index(), document);
        self.discard_redo();
    }

    /// Called before a split or merge: flush edits so far and keep the
    /// pre-change state pending
    pub fn begin_structural(&mut self, document: &Document) {
        self.last_command = None;
        self.commit(document);
        self.capture(document.focused_line_index(), document);
        self.discard_redo();
    }

    fn discard_redo(&mut self) {
        if !self.redo_stack.is_empty() {
            log::trace!("new edit drops {} redo entries", self.redo_stack.len());
            self.redo_stack.clear();
        }
    }

    /// Re-point the pending snapshot at the line focus moved to as part of
    /// a structural change, without committing
    pub fn follow_focus(&mut self, line_index: usize) {
        if let Some(pending) = &mut self.pending {
            pending.line_index = line_index;
        }
    }

    /// Push the pending snapshot if the document differs from it.
    /// Returns whether an entry was pushed.
    pub fn commit(&mut self, document: &Document) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if pending.snapshot.matches(document) {
            return false;
        }
        log::debug!(
            "committing undo step for line {} ({} entries)",
            pending.line_index,
            self.undo_stack.len() + 1
        );
        self.push_undo(pending.snapshot);
        self.redo_stack.clear();
        self.is_at_baseline = false;
        true
    }

    /// Drop the pending snapshot and capture the document as it is now
    pub fn recapture(&mut self, document: &Document) {
        self.capture(document.focused_line_index(), document);
    }

    fn capture(&mut self, line_index: usize, document: &Document) {
        self.pending = Some(PendingEdit {
            snapshot: Snapshot::capture(document),
            line_index,
        });
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        let cap = self.config.max_undo_levels;
        if cap > 0 && self.undo_stack.len() > cap {
            self.undo_stack.pop_front();
            log::trace!("undo stack over {cap} entries, dropped oldest");
        }
    }

    // ============ Command grouping ============

    /// Set the boundary before a command runs
    pub fn record_command(&mut self, kind: CommandKind, document: &Document) {
        let continues_run = kind.is_incremental()
            && self.last_command.is_some_and(CommandKind::is_incremental);
        if continues_run {
            log::trace!("{kind:?} continues the current undo step");
        } else {
            self.commit(document);
            self.recapture(document);
        }
        self.last_command = Some(kind);
    }

    /// Set the boundary after a command ran
    pub fn finish_command(&mut self, kind: CommandKind, document: &Document) {
        if kind.is_incremental() {
            self.follow_focus(document.focused_line_index());
        } else {
            self.commit(document);
            self.recapture(document);
        }
    }

    pub fn last_command(&self) -> Option<CommandKind> {
        self.last_command
    }

    // ============ Undo / redo ============

    /// True when the focused line has edits not yet committed
    pub fn has_uncommitted_changes(&self, document: &Document) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.snapshot.matches(document))
    }

    pub fn can_undo(&self, document: &Document) -> bool {
        !self.undo_stack.is_empty()
            || self.has_uncommitted_changes(document)
            || (self.baseline.is_some() && !self.is_at_baseline)
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Step back. Pending edits are committed first so they can be redone.
    /// Returns the snapshot the caller must restore.
    pub fn undo(&mut self, document: &Document) -> Option<Snapshot> {
        self.last_command = None;
        self.commit(document);

        if let Some(entry) = self.undo_stack.pop_back() {
            let current =
                Snapshot::capture(document).with_side_effect(entry.side_effect().cloned());
            self.redo_stack.push(current);
            self.is_at_baseline = self.undo_stack.is_empty()
                && self
                    .baseline
                    .as_ref()
                    .is_some_and(|baseline| baseline.same_text(&entry));
            log::debug!("undo ({} left)", self.undo_stack.len());
            return Some(entry);
        }

        let baseline = self.baseline.as_ref()?;
        if self.is_at_baseline {
            return None;
        }
        self.is_at_baseline = true;
        if baseline.matches(document) {
            return None;
        }
        self.redo_stack.push(Snapshot::capture(document));
        log::debug!("undo reached baseline");
        Some(baseline.clone())
    }

    /// Step forward. The state being left is pushed onto the undo stack,
    /// carrying the popped entry's side effect.
    pub fn redo(&mut self, document: &Document) -> Option<Snapshot> {
        self.last_command = None;
        self.commit(document);

        let entry = self.redo_stack.pop()?;
        let previous =
            Snapshot::capture(document).with_side_effect(entry.side_effect().cloned());
        self.push_undo(previous);
        self.is_at_baseline = false;
        log::debug!("redo ({} left)", self.redo_stack.len());
        Some(entry)
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    // ============ Baseline ============

    /// Capture the floor. Must be called after the loaded content is in
    /// the document.
    pub fn set_baseline(&mut self, document: &Document) {
        if self.baseline.is_some() {
            log::debug!("replacing existing baseline");
        }
        self.baseline = Some(Snapshot::capture(document));
        self.is_at_baseline = true;
        self.recapture(document);
    }

    pub fn baseline(&self) -> Option<&Snapshot> {
        self.baseline.as_ref()
    }

    pub fn is_at_baseline(&self) -> bool {
        self.is_at_baseline
    }

    /// Forget everything, including the baseline
    pub fn reset(&mut self) {
        log::debug!("history reset");
        *self = Self::with_config(self.config);
    }

    // ============ Side effects ============

    /// Attach a side effect to the most recently pushed undo entry.
    /// Returns false when there is no entry to attach to.
    pub fn attach_side_effect(&mut self, side_effect: SideEffectRef) -> bool {
        match self.undo_stack.back_mut() {
            Some(entry) => {
                entry.set_side_effect(Some(side_effect));
                true
            }
            None => false,
        }
    }

    pub fn latest_side_effect(&self) -> Option<&SideEffectRef> {
        self.undo_stack.back().and_then(Snapshot::side_effect)
    }
}
