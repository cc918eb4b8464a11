use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Undo levels kept per document when the config does not say otherwise
pub const DEFAULT_MAX_UNDO_LEVELS: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub notes_path: PathBuf,
    /// Where suspended undo histories are kept; defaults to
    /// `<notes_path>/.sessions`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions_path: Option<PathBuf>,
    /// Cap on the undo stack per open document. Zero means unbounded.
    #[serde(default = "default_max_undo_levels")]
    pub max_undo_levels: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

fn default_max_undo_levels() -> usize {
    DEFAULT_MAX_UNDO_LEVELS
}

impl Config {
    pub fn new(notes_path: impl Into<PathBuf>) -> Self {
        Self {
            notes_path: notes_path.into(),
            sessions_path: None,
            max_undo_levels: DEFAULT_MAX_UNDO_LEVELS,
            log_path: None,
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config.expanded()))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/outline-notes");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Resolved session directory
    pub fn sessions_dir(&self) -> PathBuf {
        self.sessions_path
            .clone()
            .unwrap_or_else(|| self.notes_path.join(".sessions"))
    }

    /// Expand `~` and `$VAR` in every path field
    fn expanded(mut self) -> Self {
        self.notes_path = Self::expand_path(&self.notes_path).unwrap_or(self.notes_path);
        self.sessions_path = self
            .sessions_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));
        self.log_path = self
            .log_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));
        self
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
