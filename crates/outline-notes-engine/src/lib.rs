pub mod editing;
pub mod editor;
pub mod history;
pub mod input;
pub mod io;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{Direction, Document, Line, Marker, Prefix, Selection, TAB};
pub use editor::{ContentChanged, Editor, SideEffectFailure};
pub use history::{
    CommandKind, DEFAULT_MAX_UNDO_LEVELS, History, HistoryConfig, HistoryImportError,
    HistoryState, SideEffectRef, Snapshot,
};
pub use input::InputConnection;
pub use io::*;
