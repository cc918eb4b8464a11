//! Note files and suspended editing sessions on disk.

use relative_path::RelativePath;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::editor::Editor;
use crate::history::{HistoryImportError, HistoryState};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid notes directory: {0}")]
    InvalidNotesDir(String),
    #[error("Could not restore session: {0}")]
    Session(#[from] HistoryImportError),
    #[error("Note {0} changed since its session was saved")]
    StaleSession(String),
    #[error("Could not encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Read a note and return its content
pub fn read_file(relative_path: &RelativePath, notes_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(notes_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    Ok(fs::read_to_string(&absolute_path)?)
}

/// Write a note, creating parent directories as needed
pub fn write_file(
    relative_path: &RelativePath,
    notes_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(notes_root);
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&absolute_path, content)?;
    log::debug!("wrote {} chars to {}", content.chars().count(), absolute_path.display());
    Ok(())
}

/// All markdown notes under `notes_root`, sorted. Hidden directories
/// (including the session store) are skipped.
pub fn scan_markdown_files(notes_root: &Path) -> Result<Vec<PathBuf>, IoError> {
    validate_notes_dir(notes_root)?;
    let mut files = Vec::new();
    scan_directory_recursive(notes_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'));
        if hidden {
            continue;
        }
        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == "md"
        {
            files.push(path);
        }
    }
    Ok(())
}

pub fn validate_notes_dir(path: &Path) -> Result<(), IoError> {
    if !path.is_dir() {
        return Err(IoError::InvalidNotesDir(format!(
            "notes directory not found: {}",
            path.display()
        )));
    }
    Ok(())
}

/// On-disk session: the history plus a fingerprint of the text it was
/// recorded against
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    content_sha256: String,
    history: HistoryState,
}

fn content_fingerprint(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Suspended undo histories, one JSON file per document id
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the session for `doc_id` lives. The id is percent-encoded, so
    /// distinct ids never share a file.
    pub fn session_path(&self, doc_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", urlencoding::encode(doc_id)))
    }

    /// Write the editor's history for `doc_id`
    pub fn save(&self, doc_id: &str, editor: &Editor) -> Result<PathBuf, IoError> {
        let session = SessionFile {
            content_sha256: content_fingerprint(&editor.text()),
            history: editor.export_history_state(),
        };
        let json = serde_json::to_string(&session)?;
        fs::create_dir_all(&self.root)?;
        let path = self.session_path(doc_id);
        fs::write(&path, json)?;
        log::debug!("suspended session {doc_id} to {}", path.display());
        Ok(path)
    }

    /// Raw session JSON, if one was saved
    pub fn load(&self, doc_id: &str) -> Result<Option<String>, IoError> {
        let path = self.session_path(doc_id);
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(json)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Import the saved history into `editor`, which must already hold the
    /// note's current text. Returns false when there is no session.
    ///
    /// A session that fails to import, or was recorded against different
    /// text, is discarded and the error returned; the editor keeps its own
    /// history in that case.
    pub fn resume(&self, doc_id: &str, editor: &mut Editor) -> Result<bool, IoError> {
        let Some(json) = self.load(doc_id)? else {
            return Ok(false);
        };
        let session: SessionFile = match serde_json::from_str(&json) {
            Ok(session) => session,
            Err(err) => {
                log::warn!("discarding unreadable session {doc_id}: {err}");
                self.discard(doc_id)?;
                return Err(IoError::Session(HistoryImportError::Parse(err)));
            }
        };
        if session.content_sha256 != content_fingerprint(&editor.text()) {
            log::info!("{doc_id} changed since it was suspended, discarding its session");
            self.discard(doc_id)?;
            return Err(IoError::StaleSession(doc_id.to_string()));
        }
        if let Err(err) = editor.import_history_state(session.history) {
            log::warn!("discarding unreadable session {doc_id}: {err}");
            self.discard(doc_id)?;
            return Err(err.into());
        }
        log::debug!("resumed session {doc_id}");
        Ok(true)
    }

    pub fn discard(&self, doc_id: &str) -> Result<(), IoError> {
        match fs::remove_file(self.session_path(doc_id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
