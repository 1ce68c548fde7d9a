//! The status document: the single source of truth for repositories,
//! worktrees, and workspaces.
//!
//! Backed by YAML via `serde_yaml`, loaded whole and saved whole on every
//! mutating call — no partial writes, matching the ordering guarantee in
//! the invariant that status mutations commit before the filesystem work they guard.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

/// `remote:branch` composite key for a repository's worktree map.
pub fn worktree_key(remote: &str, branch: &str) -> String {
    format!("{remote}:{branch}")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteInfo {
    pub default_branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorktreeRecord {
    pub remote: String,
    pub branch: String,
    #[serde(default)]
    pub detached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Repository {
    pub path: PathBuf,
    #[serde(default)]
    pub remotes: BTreeMap<String, RemoteInfo>,
    #[serde(default)]
    pub worktrees: BTreeMap<String, WorktreeRecord>,
}

impl Repository {
    pub fn default_branch(&self, remote: &str) -> Option<&str> {
        self.remotes.get(remote).map(|r| r.default_branch.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Workspace {
    /// Normalized URLs (or fallback local paths) of member repositories, in order.
    #[serde(default)]
    pub repositories: Vec<String>,
    /// Branch names ("worktree refs") fanned out across all members, in order.
    #[serde(default)]
    pub worktrees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StatusDocument {
    #[serde(default)]
    pub repositories: IndexMap<String, Repository>,
    #[serde(default)]
    pub workspaces: IndexMap<String, Workspace>,
}

/// External collaborator for typed CRUD over the status document.
///
/// The orchestrator never holds the document open across operations; each
/// mutating call `load`s, mutates, and `save`s, matching the "no partial
/// writes" rule.
pub trait StatusStore: Send + Sync {
    fn load(&self) -> Result<StatusDocument, OrchestratorError>;
    fn save(&self, document: &StatusDocument) -> Result<(), OrchestratorError>;
}

/// YAML-backed [`StatusStore`] at a fixed path.
///
/// A missing file is treated as an empty document, never an error — the
/// `NotInitialized` error belongs to the configuration layer, not here.
pub struct YamlStatusStore {
    path: PathBuf,
}

impl YamlStatusStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StatusStore for YamlStatusStore {
    fn load(&self) -> Result<StatusDocument, OrchestratorError> {
        if !self.path.exists() {
            return Ok(StatusDocument::default());
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| OrchestratorError::other(format!("failed to read status document at {}: {e}", self.path.display())))?;
        if contents.trim().is_empty() {
            return Ok(StatusDocument::default());
        }
        serde_yaml::from_str(&contents)
            .map_err(|e| OrchestratorError::StatusUpdateFailure { reason: format!("malformed status document: {e}") })
    }

    fn save(&self, document: &StatusDocument) -> Result<(), OrchestratorError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OrchestratorError::other(format!("failed to create {}: {e}", parent.display())))?;
        }
        let serialized = serde_yaml::to_string(document)
            .map_err(|e| OrchestratorError::StatusUpdateFailure { reason: format!("failed to serialize status document: {e}") })?;
        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, serialized)
            .map_err(|e| OrchestratorError::other(format!("failed to write {}: {e}", tmp_path.display())))?;
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|e| OrchestratorError::other(format!("failed to rename into {}: {e}", self.path.display())))
    }
}

impl YamlStatusStore {
    fn tmp_path(&self) -> PathBuf {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let name = self.path.file_name().and_then(|n| n.to_str()).unwrap_or("status.yaml");
        parent.join(format!(".{name}.tmp"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = YamlStatusStore::new(dir.path().join("status.yaml"));
        let doc = store.load().unwrap();
        assert!(doc.repositories.is_empty());
        assert!(doc.workspaces.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = YamlStatusStore::new(dir.path().join("status.yaml"));
        let mut doc = StatusDocument::default();
        doc.repositories.insert(
            "github.com/o/r".to_string(),
            Repository {
                path: PathBuf::from("/code/repos/github.com/o/r/origin/main"),
                remotes: BTreeMap::from([(
                    "origin".to_string(),
                    RemoteInfo { default_branch: "main".to_string() },
                )]),
                worktrees: BTreeMap::new(),
            },
        );
        store.save(&doc).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn worktree_key_formats_remote_colon_branch() {
        assert_eq!(worktree_key("origin", "main"), "origin:main");
    }
}
