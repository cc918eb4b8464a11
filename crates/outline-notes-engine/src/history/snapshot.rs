use serde::{Deserialize, Serialize};

use crate::editing::Document;

/// Reference to a resource that lives outside the document (for example a
/// scheduled reminder) and must be created/destroyed in step with undo/redo
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideEffectRef {
    pub kind: String,
    pub id: String,
}

impl SideEffectRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Immutable capture of the document for undo/redo.
///
/// Only the side-effect slot can change after capture, and only from
/// inside the history engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    line_texts: Vec<String>,
    focused_line_index: usize,
    /// Cursor within the focused line, in chars
    cursor_position: usize,
    #[serde(default)]
    side_effect: Option<SideEffectRef>,
}

impl Snapshot {
    pub fn capture(document: &Document) -> Self {
        Self {
            line_texts: document.line_texts(),
            focused_line_index: document.focused_line_index(),
            cursor_position: document.focused_line().cursor(),
            side_effect: None,
        }
    }

    pub fn line_texts(&self) -> &[String] {
        &self.line_texts
    }

    pub fn text(&self) -> String {
        self.line_texts.join("\n")
    }

    pub fn focused_line_index(&self) -> usize {
        self.focused_line_index
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    pub fn side_effect(&self) -> Option<&SideEffectRef> {
        self.side_effect.as_ref()
    }

    pub(crate) fn set_side_effect(&mut self, side_effect: Option<SideEffectRef>) {
        self.side_effect = side_effect;
    }

    pub(crate) fn with_side_effect(mut self, side_effect: Option<SideEffectRef>) -> Self {
        self.side_effect = side_effect;
        self
    }

    /// Same line texts as the document
    pub(crate) fn matches(&self, document: &Document) -> bool {
        self.line_texts.len() == document.line_count()
            && self
                .line_texts
                .iter()
                .zip(document.lines())
                .all(|(text, line)| text == line.text())
    }

    pub(crate) fn same_text(&self, other: &Snapshot) -> bool {
        self.line_texts == other.line_texts
    }

    /// Structural checks applied to imported snapshots
    pub(crate) fn validate(&self) -> Result<(), String> {
        let Some(focused) = self.line_texts.get(self.focused_line_index) else {
            return Err(format!(
                "focused line {} out of range for {} lines",
                self.focused_line_index,
                self.line_texts.len()
            ));
        };
        if self.line_texts.iter().any(|text| text.contains('\n')) {
            return Err("line text contains a newline".to_string());
        }
        let len = focused.chars().count();
        if self.cursor_position > len {
            return Err(format!(
                "cursor {} past end of focused line ({len} chars)",
                self.cursor_position
            ));
        }
        Ok(())
    }
}

/// The not-yet-committed pre-edit state of the line being edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEdit {
    pub snapshot: Snapshot,
    pub line_index: usize,
}
