//! Patchbay preferences
//!
//! Stored as JSON under the user config dir (`raybay/preferences.json`).
//! A missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{AliasMode, PortDirection};

/// Errors that can occur while loading or saving preferences.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the preferences file
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the preferences file
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid preferences JSON
    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No config directory on this platform
    #[error("no config directory available")]
    NoConfigDir,
}

/// A remembered group box position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPosition {
    pub direction: PortDirection,
    pub group: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub alias_mode: AliasMode,
    /// Pair stereo ports automatically as they appear
    pub stereo_detection: bool,
    pub group_positions: Vec<GroupPosition>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            alias_mode: AliasMode::None,
            stereo_detection: true,
            group_positions: Vec::new(),
        }
    }
}

impl Preferences {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("raybay").join("preferences.json"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let prefs = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded preferences from {}", path.display());
        Ok(prefs)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let prefs: Preferences = serde_json::from_str(r#"{"alias_mode":"alias2"}"#).unwrap();
        assert_eq!(prefs.alias_mode, AliasMode::Alias2);
        assert!(prefs.stereo_detection);
        assert!(prefs.group_positions.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut prefs = Preferences::default();
        prefs.stereo_detection = false;
        prefs.group_positions.push(GroupPosition {
            direction: PortDirection::Output,
            group: "system".into(),
            x: 30,
            y: 40,
        });
        prefs.save_to(&path).unwrap();

        let loaded = Preferences::load_from(&path).unwrap();
        assert_eq!(loaded, prefs);
        assert_eq!(loaded.group_positions[0].x, 30);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(Preferences::load_from(&missing), Err(ConfigError::Read { .. })));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(Preferences::load_from(&broken), Err(ConfigError::Parse { .. })));
    }
}
