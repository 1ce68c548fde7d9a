//! Editor launcher: the collaborator the `open-in-ide` post-hook
//! acts through after `OpenWorktree` resolves a target path.

use std::path::PathBuf;

use crate::error::OrchestratorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    Repo(PathBuf),
    Workspace(PathBuf),
}

impl OpenTarget {
    pub fn path(&self) -> &std::path::Path {
        match self {
            OpenTarget::Repo(path) => path,
            OpenTarget::Workspace(path) => path,
        }
    }
}

pub trait EditorLauncher: Send + Sync {
    fn open(&self, target: &OpenTarget) -> Result<(), OrchestratorError>;
}

/// Shells out to a configured editor command (`$FLEET_EDITOR`, default
/// `code`), passing the target path as the sole argument.
pub struct CommandEditorLauncher {
    command: String,
}

impl CommandEditorLauncher {
    pub fn new() -> Self {
        let command = std::env::var("FLEET_EDITOR").unwrap_or_else(|_| "code".to_string());
        Self { command }
    }

    pub fn with_command(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

impl Default for CommandEditorLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorLauncher for CommandEditorLauncher {
    fn open(&self, target: &OpenTarget) -> Result<(), OrchestratorError> {
        log::debug!("launching editor '{}' on {}", self.command, target.path().display());
        std::process::Command::new(&self.command)
            .arg(target.path())
            .status()
            .map_err(|e| OrchestratorError::other(format!("failed to launch editor '{}': {e}", self.command)))
            .and_then(|status| {
                if status.success() {
                    Ok(())
                } else {
                    Err(OrchestratorError::other(format!("editor '{}' exited with {status}", self.command)))
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_target_path_unwraps_either_variant() {
        let repo = OpenTarget::Repo(PathBuf::from("/a/b"));
        let workspace = OpenTarget::Workspace(PathBuf::from("/c/d"));
        assert_eq!(repo.path(), std::path::Path::new("/a/b"));
        assert_eq!(workspace.path(), std::path::Path::new("/c/d"));
    }
}
