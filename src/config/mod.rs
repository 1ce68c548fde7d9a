//! Configuration loading/saving and its CLI front-end.
//!
//! `Config` is read-only from the orchestration layer's point of view. It is
//! produced by a [`ConfigManager`] implementation, the default of which
//! persists TOML at a platform config directory (`dirs::config_dir()`).

pub mod commands;
pub mod expansion;
pub mod hooks;
pub mod project;

#[cfg(test)]
mod test;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

pub use commands::CommandConfig;
pub use expansion::{expand_command_template, expand_template};
pub use hooks::HooksConfig;
pub use project::ProjectConfig;

/// The three paths the orchestrator needs and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub repositories_dir: PathBuf,
    pub workspaces_dir: PathBuf,
    pub status_file: PathBuf,
}

impl Config {
    pub fn default_paths() -> Self {
        let home = home::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Config {
            repositories_dir: home.join("Code").join("repos"),
            workspaces_dir: home.join("Code").join("workspaces"),
            status_file: default_config_dir().join("status.yaml"),
        }
    }

    /// Expand `~` in all three paths and reject the empty string.
    pub fn expand_and_validate(mut self) -> Result<Self, OrchestratorError> {
        self.repositories_dir = expand_tilde(&self.repositories_dir)?;
        self.workspaces_dir = expand_tilde(&self.workspaces_dir)?;
        self.status_file = expand_tilde(&self.status_file)?;
        Ok(self)
    }
}

fn expand_tilde(path: &Path) -> Result<PathBuf, OrchestratorError> {
    let raw = path.to_string_lossy();
    if raw.trim().is_empty() {
        return Err(OrchestratorError::FailedToExpandRepositoriesDir {
            reason: "path is empty".to_string(),
        });
    }
    let expanded = shellexpand::tilde(raw.as_ref());
    Ok(PathBuf::from(expanded.into_owned()))
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fleet")
}

fn default_config_file_path() -> PathBuf {
    if let Ok(from_env) = std::env::var("FLEET_CONFIG_PATH") {
        return PathBuf::from(from_env);
    }
    default_config_dir().join("config.toml")
}

/// Loads/saves [`Config`] and knows where it lives on disk.
///
/// This is an external collaborator: the orchestrator only ever sees
/// `Config` values, never this trait, except during `Init` which is the one
/// operation that legitimately bootstraps configuration from scratch.
pub trait ConfigManager: Send + Sync {
    fn load(&self) -> Result<Config, OrchestratorError>;
    fn save(&self, config: &Config) -> Result<(), OrchestratorError>;
    fn exists(&self) -> bool;
    fn path(&self) -> &Path;
}

/// TOML-backed [`ConfigManager`] rooted at a platform config directory.
pub struct TomlConfigManager {
    path: PathBuf,
}

impl TomlConfigManager {
    pub fn new() -> Self {
        Self {
            path: default_config_file_path(),
        }
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Default for TomlConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager for TomlConfigManager {
    fn load(&self) -> Result<Config, OrchestratorError> {
        if !self.path.exists() {
            return Err(OrchestratorError::NotInitialized);
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| OrchestratorError::Other {
            message: format!("failed to read config at {}: {e}", self.path.display()),
        })?;
        let config: Config = toml::from_str(&contents).map_err(|e| OrchestratorError::Other {
            message: format!("failed to parse config at {}: {e}", self.path.display()),
        })?;
        config.expand_and_validate()
    }

    fn save(&self, config: &Config) -> Result<(), OrchestratorError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OrchestratorError::Other {
                message: format!("failed to create config directory {}: {e}", parent.display()),
            })?;
        }
        let serialized = toml::to_string_pretty(config).map_err(|e| OrchestratorError::Other {
            message: format!("failed to serialize config: {e}"),
        })?;
        std::fs::write(&self.path, serialized).map_err(|e| OrchestratorError::Other {
            message: format!("failed to write config at {}: {e}", self.path.display()),
        })
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn expand_and_validate_rejects_empty_path() {
        let config = Config {
            repositories_dir: PathBuf::new(),
            workspaces_dir: PathBuf::from("/tmp/ws"),
            status_file: PathBuf::from("/tmp/status.yaml"),
        };
        assert!(config.expand_and_validate().is_err());
    }

    #[test]
    fn expand_and_validate_expands_tilde() {
        let Some(home) = home::home_dir() else { return };
        let config = Config {
            repositories_dir: PathBuf::from("~/Code/repos"),
            workspaces_dir: PathBuf::from("/tmp/ws"),
            status_file: PathBuf::from("/tmp/status.yaml"),
        };
        let expanded = config.expand_and_validate().unwrap();
        assert_eq!(expanded.repositories_dir, home.join("Code").join("repos"));
    }
}
