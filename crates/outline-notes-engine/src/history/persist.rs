//! Export/import of the full history state for suspend/resume.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::{CommandKind, History, PendingEdit, Snapshot};

/// Bumped whenever the serialized layout changes
pub const HISTORY_FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum HistoryImportError {
    #[error("History JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unsupported history format version {0}")]
    UnsupportedVersion(u32),
    #[error("Invalid history state: {reason}")]
    Invalid { reason: String },
}

/// Flat, line-oriented representation of a [`History`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub format_version: u32,
    pub undo_stack: Vec<Snapshot>,
    pub redo_stack: Vec<Snapshot>,
    pub baseline: Option<Snapshot>,
    pub is_at_baseline: bool,
    pub pending: Option<PendingEdit>,
    pub last_command_kind: Option<CommandKind>,
}

impl HistoryState {
    fn validate(&self) -> Result<(), HistoryImportError> {
        if self.format_version != HISTORY_FORMAT_VERSION {
            return Err(HistoryImportError::UnsupportedVersion(self.format_version));
        }
        let labelled = self
            .undo_stack
            .iter()
            .map(|s| ("undo", s))
            .chain(self.redo_stack.iter().map(|s| ("redo", s)))
            .chain(self.baseline.iter().map(|s| ("baseline", s)))
            .chain(self.pending.iter().map(|p| ("pending", &p.snapshot)));
        for (label, snapshot) in labelled {
            snapshot
                .validate()
                .map_err(|reason| HistoryImportError::Invalid {
                    reason: format!("{label} snapshot: {reason}"),
                })?;
        }
        // The pending line index points into the live document, which can
        // be a line past the pending snapshot right after a split
        Ok(())
    }
}

impl History {
    pub fn export_state(&self) -> HistoryState {
        HistoryState {
            format_version: HISTORY_FORMAT_VERSION,
            undo_stack: self.undo_stack.iter().cloned().collect(),
            redo_stack: self.redo_stack.clone(),
            baseline: self.baseline.clone(),
            is_at_baseline: self.is_at_baseline,
            pending: self.pending.clone(),
            last_command_kind: self.last_command,
        }
    }

    /// Replace this history with `state`. Either all of it is applied or,
    /// on error, none of it.
    pub fn import_state(&mut self, state: HistoryState) -> Result<(), HistoryImportError> {
        if let Err(err) = state.validate() {
            log::warn!("rejecting history import: {err}");
            return Err(err);
        }
        let mut undo_stack: VecDeque<Snapshot> = state.undo_stack.into();
        let cap = self.config.max_undo_levels;
        while cap > 0 && undo_stack.len() > cap {
            undo_stack.pop_front();
        }
        *self = History {
            undo_stack,
            redo_stack: state.redo_stack,
            baseline: state.baseline,
            is_at_baseline: state.is_at_baseline,
            pending: state.pending,
            last_command: state.last_command_kind,
            config: self.config,
        };
        log::debug!(
            "imported history: {} undo, {} redo",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.export_state())
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), HistoryImportError> {
        let state: HistoryState = serde_json::from_str(json).inspect_err(|err| {
            log::warn!("rejecting history import: {err}");
        })?;
        self.import_state(state)
    }
}
