//! Repository & worktree engine: clone/adopt repositories,
//! create/load/delete worktrees, keep the status document and Git state
//! consistent.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::OrchestratorError;
use crate::fs_driver::FsDriver;
use crate::git_driver::{GitDriver, resolve_main_repo_path};
use crate::status::{Repository, RemoteInfo, StatusStore, WorktreeRecord, worktree_key};
use crate::url::{build_worktree_path, normalize_url};

const RESERVED_REPO_NAMES: &[&str] = &[".", "..", "status.yaml", "config.yaml"];

/// Validates a user-supplied repository identifier used as a status-document
/// key or CLI argument.
pub fn validate_repository_name(name: &str) -> Result<(), OrchestratorError> {
    if name.is_empty() {
        return Err(OrchestratorError::ArgumentEmpty { name: "repository".to_string() });
    }
    if name.contains('\\') {
        return Err(OrchestratorError::InvalidRepository { path: name.to_string() });
    }
    if RESERVED_REPO_NAMES.contains(&name) {
        return Err(OrchestratorError::InvalidRepository { path: name.to_string() });
    }
    Ok(())
}

pub struct RepositoryEngine {
    git: Arc<dyn GitDriver>,
    fs: Arc<dyn FsDriver>,
    status: Arc<dyn StatusStore>,
}

impl RepositoryEngine {
    pub fn new(git: Arc<dyn GitDriver>, fs: Arc<dyn FsDriver>, status: Arc<dyn StatusStore>) -> Self {
        Self { git, fs, status }
    }

    /// Adopt a repository given a local path already on disk.
    /// Returns `(final_url_or_path, repo_path)`.
    pub fn adopt_repository(&self, config: &Config, local_path: &Path) -> Result<(String, PathBuf), OrchestratorError> {
        let origin_url = self.git.origin_url(local_path);

        let Some(origin_url) = origin_url else {
            return self.adopt_by_path(local_path);
        };

        let normalized = match normalize_url(&origin_url) {
            Ok(url) => url,
            Err(_) => return self.adopt_by_path(local_path),
        };

        let mut document = self.status.load()?;
        if document.repositories.contains_key(&normalized) {
            let existing = &document.repositories[&normalized];
            return Ok((normalized, existing.path.clone()));
        }

        let default_branch = self
            .git
            .default_branch(local_path, "origin")
            .or_else(|| self.git.current_branch(local_path))
            .unwrap_or_else(|| "main".to_string());

        let managed_path = build_worktree_path(&config.repositories_dir, &normalized, "origin", &default_branch);
        let chosen_path = if self.git.is_git_repository(local_path) {
            local_path.to_path_buf()
        } else {
            self.fs.mkdir_all(managed_path.parent().unwrap_or(&managed_path))?;
            match self.git.clone_repository(&origin_url, &managed_path, false) {
                Ok(()) => managed_path,
                Err(e) if self.git.is_git_repository(local_path) => {
                    log::warn!("clone failed ({e}), falling back to existing local path");
                    local_path.to_path_buf()
                }
                Err(e) => return Err(e),
            }
        };

        document.repositories.insert(
            normalized.clone(),
            Repository {
                path: chosen_path.clone(),
                remotes: std::collections::BTreeMap::from([(
                    "origin".to_string(),
                    RemoteInfo { default_branch },
                )]),
                worktrees: std::collections::BTreeMap::new(),
            },
        );
        self.status.save(&document)?;

        Ok((normalized, chosen_path))
    }

    fn adopt_by_path(&self, local_path: &Path) -> Result<(String, PathBuf), OrchestratorError> {
        let key = local_path.to_string_lossy().into_owned();
        let mut document = self.status.load()?;
        document.repositories.entry(key.clone()).or_insert_with(|| Repository {
            path: local_path.to_path_buf(),
            remotes: std::collections::BTreeMap::new(),
            worktrees: std::collections::BTreeMap::new(),
        });
        self.status.save(&document)?;
        Ok((key, local_path.to_path_buf()))
    }

    /// Explicit `Clone` of a remote URL into the managed repositories directory.
    pub fn clone_repository(&self, config: &Config, url: &str, recursive: bool) -> Result<(String, PathBuf), OrchestratorError> {
        let normalized = normalize_url(url)?;
        let document = self.status.load()?;
        if document.repositories.contains_key(&normalized) {
            return Err(OrchestratorError::RepositoryExists { url: normalized });
        }

        let default_branch = self.git.default_branch(Path::new("."), "origin").unwrap_or_else(|| "main".to_string());
        let target = build_worktree_path(&config.repositories_dir, &normalized, "origin", &default_branch);
        self.fs.mkdir_all(target.parent().unwrap_or(&target))?;
        self.git.clone_repository(url, &target, recursive)?;

        let default_branch = self.git.default_branch(&target, "origin").unwrap_or(default_branch);

        let mut document = document;
        document.repositories.insert(
            normalized.clone(),
            Repository {
                path: target.clone(),
                remotes: std::collections::BTreeMap::from([(
                    "origin".to_string(),
                    RemoteInfo { default_branch },
                )]),
                worktrees: std::collections::BTreeMap::new(),
            },
        );
        self.status.save(&document)?;
        Ok((normalized, target))
    }

    /// Create a worktree in a single (already-resolved) repository, per
    /// Create a worktree for `branch` in the given repository.
    pub fn create_worktree(
        &self,
        config: &Config,
        repo_key: &str,
        branch: &str,
        remote: &str,
        force: bool,
    ) -> Result<PathBuf, OrchestratorError> {
        let mut document = self.status.load()?;
        let repo = document
            .repositories
            .get(repo_key)
            .ok_or_else(|| OrchestratorError::RepositoryNotFound { repository: repo_key.to_string() })?
            .clone();

        if !force && !self.git.is_clean(&repo.path) {
            return Err(OrchestratorError::RepositoryNotClean { repository: repo_key.to_string() });
        }

        let key = worktree_key(remote, branch);
        if repo.worktrees.contains_key(&key) {
            return Err(OrchestratorError::WorktreeExists { branch: branch.to_string() });
        }

        let worktree_path = build_worktree_path(&config.repositories_dir, repo_key, remote, branch);
        if self.fs.exists(&worktree_path) {
            return Err(OrchestratorError::DirectoryExists { path: worktree_path });
        }

        let main_repo_path = resolve_main_repo_path(&repo.path);
        self.git.worktree_add(&main_repo_path, &worktree_path, branch, remote)?;

        let repo = document.repositories.get_mut(repo_key).expect("checked above");
        repo.worktrees.insert(
            key,
            WorktreeRecord { remote: remote.to_string(), branch: branch.to_string(), detached: false },
        );
        self.status.save(&document)?;

        Ok(worktree_path)
    }

    /// Create or reuse a worktree for `spec`, a `"[remote:]branch"` argument.
    pub fn load_worktree(&self, config: &Config, repo_key: &str, spec: &str) -> Result<PathBuf, OrchestratorError> {
        let (remote, branch) = split_remote_branch(spec)?;

        let mut document = self.status.load()?;
        let repo = document
            .repositories
            .get(repo_key)
            .ok_or_else(|| OrchestratorError::RepositoryNotFound { repository: repo_key.to_string() })?
            .clone();

        let key = worktree_key(&remote, &branch);
        if let Some(existing) = repo.worktrees.get(&key) {
            let path = build_worktree_path(&config.repositories_dir, repo_key, &existing.remote, &existing.branch);
            if self.fs.exists(&path) {
                return Ok(path);
            }
        }

        if !self.git.branch_exists(&repo.path, &branch, "") && !self.git.branch_exists(&repo.path, &branch, &remote) {
            self.git.fetch(&repo.path, &remote)?;
        }

        let worktree_path = build_worktree_path(&config.repositories_dir, repo_key, &remote, &branch);
        let main_repo_path = resolve_main_repo_path(&repo.path);
        self.git.worktree_add(&main_repo_path, &worktree_path, &branch, &remote)?;

        let repo = document.repositories.get_mut(repo_key).expect("checked above");
        repo.worktrees.insert(
            key,
            WorktreeRecord { remote: remote.clone(), branch: branch.clone(), detached: false },
        );
        self.status.save(&document)?;

        Ok(worktree_path)
    }

    /// Delete a single worktree by branch.
    pub fn delete_worktree(&self, config: &Config, repo_key: &str, branch: &str, force: bool) -> Result<(), OrchestratorError> {
        let mut document = self.status.load()?;
        let repo = document
            .repositories
            .get(repo_key)
            .ok_or_else(|| OrchestratorError::RepositoryNotFound { repository: repo_key.to_string() })?
            .clone();

        let key = repo
            .worktrees
            .keys()
            .find(|k| k.ends_with(&format!(":{branch}")))
            .cloned()
            .ok_or_else(|| OrchestratorError::WorktreeNotInStatus { branch: branch.to_string() })?;
        let record = repo.worktrees[&key].clone();

        let worktree_path = build_worktree_path(&config.repositories_dir, repo_key, &record.remote, &record.branch);
        let main_repo_path = resolve_main_repo_path(&repo.path);
        self.git.worktree_remove(&main_repo_path, &worktree_path, force)?;

        let repo = document.repositories.get_mut(repo_key).expect("checked above");
        repo.worktrees.remove(&key);
        self.status.save(&document)?;
        Ok(())
    }

    /// Batch-delete worktrees, accumulating per-branch errors.
    pub fn delete_worktrees(&self, config: &Config, repo_key: &str, branches: &[String], force: bool) -> Result<(), OrchestratorError> {
        let mut failed = Vec::new();
        for branch in branches {
            if let Err(e) = self.delete_worktree(config, repo_key, branch, force) {
                log::warn!("failed to delete worktree '{branch}': {e}");
                failed.push(branch.clone());
            }
        }
        if failed.is_empty() {
            Ok(())
        } else if failed.len() == branches.len() {
            Err(OrchestratorError::BatchOperationFailed {
                message: format!("failed to delete all worktrees: {}", failed.join(", ")),
                failed,
            })
        } else {
            Err(OrchestratorError::BatchOperationFailed {
                message: format!("some worktrees failed to delete: {}", failed.join(", ")),
                failed,
            })
        }
    }

    /// Delete every worktree of a repository.
    pub fn delete_all_worktrees(&self, config: &Config, repo_key: &str, force: bool) -> Result<(), OrchestratorError> {
        let document = self.status.load()?;
        let repo = document
            .repositories
            .get(repo_key)
            .ok_or_else(|| OrchestratorError::RepositoryNotFound { repository: repo_key.to_string() })?;
        let branches: Vec<String> = repo.worktrees.values().map(|w| w.branch.clone()).collect();
        self.delete_worktrees(config, repo_key, &branches, force)
    }

    /// List worktrees for a repository.
    pub fn list_worktrees(&self, repo_key: &str) -> Result<Vec<WorktreeRecord>, OrchestratorError> {
        let document = self.status.load()?;
        let repo = document
            .repositories
            .get(repo_key)
            .ok_or_else(|| OrchestratorError::RepositoryNotFound { repository: repo_key.to_string() })?;
        Ok(repo.worktrees.values().cloned().collect())
    }

    pub fn list_repositories(&self) -> Result<Vec<String>, OrchestratorError> {
        let document = self.status.load()?;
        Ok(document.repositories.keys().cloned().collect())
    }

    /// Delete a repository. Rejects membership in any workspace.
    pub fn delete_repository(&self, config: &Config, repo_key: &str) -> Result<(), OrchestratorError> {
        let mut document = self.status.load()?;
        let repo = document
            .repositories
            .get(repo_key)
            .ok_or_else(|| OrchestratorError::RepositoryNotFound { repository: repo_key.to_string() })?
            .clone();

        if let Some((workspace_name, _)) = document.workspaces.iter().find(|(_, ws)| ws.repositories.contains(&repo_key.to_string())) {
            return Err(OrchestratorError::other(format!(
                "repository '{repo_key}' is part of workspace '{workspace_name}'"
            )));
        }

        for record in repo.worktrees.values() {
            let path = build_worktree_path(&config.repositories_dir, repo_key, &record.remote, &record.branch);
            let main_repo_path = resolve_main_repo_path(&repo.path);
            if let Err(e) = self.git.worktree_remove(&main_repo_path, &path, true) {
                log::warn!("failed to remove worktree at {}: {e}", path.display());
            }
        }

        self.fs.remove_dir_all(&repo.path)?;
        let repo_dir = config.repositories_dir.join(repo_key);
        self.fs.prune_empty_parents(&repo_dir, &config.repositories_dir);

        document.repositories.shift_remove(repo_key);
        self.status.save(&document)?;
        Ok(())
    }
}

/// Split a `"[remote:]branch"` spec on the first `:` (the "Load
/// worktree". Both sides must be non-empty when a colon is present.
pub fn split_remote_branch(spec: &str) -> Result<(String, String), OrchestratorError> {
    match spec.split_once(':') {
        Some((remote, branch)) => {
            if remote.is_empty() || branch.is_empty() {
                return Err(OrchestratorError::ArgumentEmpty { name: "remote/branch".to_string() });
            }
            if branch.contains(':') {
                return Err(OrchestratorError::BranchNameContainsColon { branch: branch.to_string() });
            }
            Ok((remote.to_string(), branch.to_string()))
        }
        None => Ok(("origin".to_string(), spec.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_remote_branch_defaults_to_origin() {
        assert_eq!(split_remote_branch("feature").unwrap(), ("origin".to_string(), "feature".to_string()));
    }

    #[test]
    fn split_remote_branch_splits_on_first_colon() {
        assert_eq!(split_remote_branch("upstream:feature").unwrap(), ("upstream".to_string(), "feature".to_string()));
    }

    #[test]
    fn split_remote_branch_rejects_colon_in_branch() {
        assert!(split_remote_branch("origin:feature:x").is_err());
    }

    #[test]
    fn validate_repository_name_rejects_reserved_names() {
        assert!(validate_repository_name("").is_err());
        assert!(validate_repository_name(".").is_err());
        assert!(validate_repository_name("status.yaml").is_err());
        assert!(validate_repository_name("a\\b").is_err());
        assert!(validate_repository_name("github.com/o/r").is_ok());
    }
}
