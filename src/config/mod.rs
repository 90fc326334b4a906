//! Configuration for jqsh
//!
//! Settings are read from a TOML file in the platform config directory:
//! - **Linux**: `~/.config/jqsh/config.toml`
//! - **macOS**: `~/Library/Application Support/jqsh/config.toml`
//! - **Windows**: `%APPDATA%\jqsh\config.toml`
//!
//! Every key is optional; a missing file means defaults.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! thread_name_prefix = "jqsh"
//!
//! [command]
//! end_of_transmission = true
//! strip_trailing_eot = true
//!
//! [output]
//! indent = 2
//! ```

use crate::error::{JqshError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name under the platform config directory
pub const APP_DIR: &str = "jqsh";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// End-of-transmission byte written after a command's input
pub const EOT: u8 = 0x04;

/// Default indentation width for printed results
pub const DEFAULT_INDENT: usize = 2;

/// Get the default config file path
pub fn config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_DIR).join(CONFIG_FILE))
}

// ==================== Sections ====================

/// Evaluator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Prefix for worker thread names
    pub thread_name_prefix: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            thread_name_prefix: "jqsh".to_string(),
        }
    }
}

/// External command settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    /// Append the EOT byte after the serialized input
    pub end_of_transmission: bool,

    /// Drop a trailing EOT echoed back by the command before decoding
    pub strip_trailing_eot: bool,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            end_of_transmission: true,
            strip_trailing_eot: true,
        }
    }
}

/// Result printing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Spaces per nesting level; 0 prints each value on one line
    pub indent: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
        }
    }
}

// ==================== JqshConfig ====================

/// Complete jqsh configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JqshConfig {
    pub engine: EngineSettings,
    pub command: CommandSettings,
    pub output: OutputSettings,
}

impl JqshConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: JqshConfig = toml::from_str(&content)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load from the default location, returning defaults if the file is
    /// missing or invalid
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration as TOML, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| JqshError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = JqshConfig::default();
        assert_eq!(config.engine.thread_name_prefix, "jqsh");
        assert!(config.command.end_of_transmission);
        assert!(config.command.strip_trailing_eot);
        assert_eq!(config.output.indent, 2);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = JqshConfig::default();
        config.output.indent = 0;
        config.command.end_of_transmission = false;
        config.save(&path).unwrap();

        let loaded = JqshConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[output]\nindent = 4\n").unwrap();

        let loaded = JqshConfig::load(&path).unwrap();
        assert_eq!(loaded.output.indent, 4);
        assert_eq!(loaded.engine, EngineSettings::default());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[output\nindent = ").unwrap();
        assert!(matches!(JqshConfig::load(&path), Err(JqshError::Toml(_))));
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let err = JqshConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
        match err {
            JqshError::WithContext { source, .. } => {
                assert!(matches!(*source, JqshError::Io(_)))
            }
            other => panic!("expected context-wrapped io error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_into_file_parent_fails_with_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let err = JqshConfig::default()
            .save(blocker.join(CONFIG_FILE))
            .unwrap_err();
        assert!(err.to_string().contains("blocker"));
    }
}
