//! Workspace engine: create/delete workspaces, add/remove a
//! repository to/from an existing workspace, fan out branches to new
//! members, and maintain per-branch editor workspace files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::editor_workspace_file::{self, extract_repository_name_from_url, main_file_path, per_branch_file_path};
use crate::error::OrchestratorError;
use crate::fs_driver::FsDriver;
use crate::git_driver::{GitDriver, is_branch_not_found_error, resolve_main_repo_path};
use crate::prompt::{Prompter, confirm_or_abort};
use crate::status::{StatusStore, Workspace, WorktreeRecord, worktree_key};
use crate::url::build_worktree_path;

const RESERVED_WORKSPACE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

pub fn validate_workspace_name(name: &str) -> Result<(), OrchestratorError> {
    if name.is_empty() || name.chars().any(|c| RESERVED_WORKSPACE_CHARS.contains(&c)) {
        return Err(OrchestratorError::InvalidWorkspaceName { name: name.to_string() });
    }
    Ok(())
}

pub struct WorkspaceEngine {
    git: Arc<dyn GitDriver>,
    fs: Arc<dyn FsDriver>,
    status: Arc<dyn StatusStore>,
}

impl WorkspaceEngine {
    pub fn new(git: Arc<dyn GitDriver>, fs: Arc<dyn FsDriver>, status: Arc<dyn StatusStore>) -> Self {
        Self { git, fs, status }
    }

    /// Resolve a repository identifier (status-document key, absolute
    /// path, or path relative to CWD) to a local filesystem path, per
    /// Validates the name against the reserved character set.
    fn resolve_repository_path(&self, document: &crate::status::StatusDocument, identifier: &str) -> Result<PathBuf, OrchestratorError> {
        if let Some(repo) = document.repositories.get(identifier) {
            return Ok(repo.path.clone());
        }
        let as_path = PathBuf::from(identifier);
        if as_path.is_absolute() {
            return Ok(as_path);
        }
        let relative = std::env::current_dir()
            .map_err(|_| OrchestratorError::PathResolutionFailure { identifier: identifier.to_string() })?
            .join(&as_path);
        if self.fs.exists(&relative) {
            Ok(relative)
        } else {
            Err(OrchestratorError::PathResolutionFailure { identifier: identifier.to_string() })
        }
    }

    /// Create a workspace from an initial set of member repositories.
    pub fn create_workspace(
        &self,
        config: &Config,
        repository_engine: &crate::repository_engine::RepositoryEngine,
        name: &str,
        repository_identifiers: &[String],
    ) -> Result<(), OrchestratorError> {
        validate_workspace_name(name)?;

        let document = self.status.load()?;
        if document.workspaces.contains_key(name) {
            return Err(OrchestratorError::WorkspaceAlreadyExists { name: name.to_string() });
        }
        if repository_identifiers.is_empty() {
            return Err(OrchestratorError::ArgumentEmpty { name: "repositories".to_string() });
        }

        let mut seen_identifiers = std::collections::HashSet::new();
        for id in repository_identifiers {
            if !seen_identifiers.insert(id.clone()) {
                return Err(OrchestratorError::DuplicateRepository { repository: id.clone() });
            }
        }

        let mut members = Vec::new();
        for identifier in repository_identifiers {
            let path = self.resolve_repository_path(&document, identifier)?;
            if !self.git.is_git_repository(&path) {
                return Err(OrchestratorError::GitRepositoryInvalid { path: path.display().to_string() });
            }
            let (url, _) = repository_engine.adopt_repository(config, &path)?;
            if members.contains(&url) {
                return Err(OrchestratorError::DuplicateRepository { repository: url });
            }
            members.push(url);
        }

        let mut document = self.status.load()?;
        document.workspaces.insert(name.to_string(), Workspace { repositories: members, worktrees: Vec::new() });
        self.status.save(&document)?;
        Ok(())
    }

    pub fn list_workspaces(&self) -> Result<Vec<String>, OrchestratorError> {
        let document = self.status.load()?;
        Ok(document.workspaces.keys().cloned().collect())
    }

    /// The per-member, per-branch worktree paths a workspace currently
    /// fans out to, per invariant 4.
    pub fn list_worktrees(&self, workspace_name: &str) -> Result<Vec<(String, String, PathBuf)>, OrchestratorError> {
        let document = self.status.load()?;
        let workspace = document
            .workspaces
            .get(workspace_name)
            .ok_or_else(|| OrchestratorError::WorkspaceNotFound { name: workspace_name.to_string() })?;

        let mut result = Vec::new();
        for member in &workspace.repositories {
            let Some(repo) = document.repositories.get(member) else { continue };
            for branch in &workspace.worktrees {
                let key = worktree_key("origin", branch);
                if repo.worktrees.contains_key(&key) {
                    result.push((member.clone(), branch.clone(), repo.path.clone()));
                }
            }
        }
        Ok(result)
    }

    /// Add a repository to a workspace, fanning its existing branches
    /// workspace" — the most intricate flow.
    ///
    /// Guarantees every per-branch editor workspace file
    /// for branches already in the workspace's branch list is updated
    /// *before* any worktree creation is attempted, even if every
    /// subsequent worktree creation is skipped because the branch doesn't
    /// exist on the new member.
    pub fn add_repository_to_workspace(
        &self,
        config: &Config,
        repository_engine: &crate::repository_engine::RepositoryEngine,
        workspace_name: &str,
        repository_identifier: &str,
    ) -> Result<(), OrchestratorError> {
        let document = self.status.load()?;
        let workspace = document
            .workspaces
            .get(workspace_name)
            .ok_or_else(|| OrchestratorError::WorkspaceNotFound { name: workspace_name.to_string() })?
            .clone();

        if workspace.repositories.contains(&repository_identifier.to_string()) {
            return Err(OrchestratorError::DuplicateRepository { repository: repository_identifier.to_string() });
        }

        let original_path = self.resolve_repository_path(&document, repository_identifier)?;
        let (final_url, _) = repository_engine.adopt_repository(config, &original_path)?;

        let document = self.status.load()?;
        let workspace = document.workspaces.get(workspace_name).expect("checked above").clone();
        if workspace.repositories.contains(&final_url) {
            return Err(OrchestratorError::DuplicateRepository { repository: final_url });
        }

        let branches = workspace.worktrees.clone();

        let mut document = document;
        let workspace_mut = document.workspaces.get_mut(workspace_name).expect("checked above");
        workspace_mut.repositories.push(final_url.clone());
        self.status.save(&document)?;

        let folder_name = extract_repository_name_from_url(&final_url);
        for branch in &branches {
            let file_path = per_branch_file_path(&config.workspaces_dir, workspace_name, branch);
            if !self.fs.exists(&file_path) {
                continue;
            }
            let folder_path = build_worktree_path(&config.repositories_dir, &final_url, "origin", branch);
            let mut file = editor_workspace_file::read(self.fs.as_ref(), &file_path)?;
            editor_workspace_file::upsert_folder(&mut file, folder_name.clone(), folder_path.display().to_string());
            editor_workspace_file::write(self.fs.as_ref(), &file_path, &file)?;
        }

        for branch in &branches {
            match self.fan_out_one_branch(config, &final_url, branch) {
                Ok(true) => self.reconcile_editor_file(config, workspace_name, branch, &final_url)?,
                Ok(false) => log::info!("branch '{branch}' does not exist on '{final_url}', skipping"),
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Attempt to create a worktree for `branch` in `repo_url`,
    /// step 6. Returns `Ok(true)` if a worktree now exists, `Ok(false)` if
    /// the branch genuinely doesn't exist on this member (not a failure of
    /// the overall operation).
    fn fan_out_one_branch(&self, config: &Config, repo_url: &str, branch: &str) -> Result<bool, OrchestratorError> {
        let mut document = self.status.load()?;
        let repo = document
            .repositories
            .get(repo_url)
            .ok_or_else(|| OrchestratorError::RepositoryNotFound { repository: repo_url.to_string() })?
            .clone();

        let key = worktree_key("origin", branch);
        let worktree_path = build_worktree_path(&config.repositories_dir, repo_url, "origin", branch);

        if let Some(existing) = repo.worktrees.get(&key) {
            let directory_exists = self.fs.exists(&worktree_path);
            let branch_exists = self.git.branch_exists(&repo.path, branch, "") || self.git.branch_exists(&repo.path, branch, "origin");
            if directory_exists && branch_exists {
                return Ok(true);
            }
            let repo_mut = document.repositories.get_mut(repo_url).expect("checked above");
            repo_mut.worktrees.remove(&key);
            self.status.save(&document)?;
        }

        let main_repo_path = resolve_main_repo_path(&repo.path);
        match self.git.worktree_add(&main_repo_path, &worktree_path, branch, "origin") {
            Ok(()) => {
                let mut document = self.status.load()?;
                let repo_mut = document.repositories.get_mut(repo_url).expect("member resolved above");
                repo_mut.worktrees.insert(key, WorktreeRecord { remote: "origin".to_string(), branch: branch.to_string(), detached: false });
                self.status.save(&document)?;
                Ok(true)
            }
            Err(e) if is_branch_not_found_error(&e.to_string()) => Ok(false),
            Err(OrchestratorError::WorktreeExists { .. }) if self.fs.exists(&worktree_path) => {
                let mut document = self.status.load()?;
                let repo_mut = document.repositories.get_mut(repo_url).expect("member resolved above");
                repo_mut.worktrees.insert(key, WorktreeRecord { remote: "origin".to_string(), branch: branch.to_string(), detached: false });
                self.status.save(&document)?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    fn reconcile_editor_file(&self, config: &Config, workspace_name: &str, branch: &str, repo_url: &str) -> Result<(), OrchestratorError> {
        let file_path = per_branch_file_path(&config.workspaces_dir, workspace_name, branch);
        let folder_path = build_worktree_path(&config.repositories_dir, repo_url, "origin", branch);
        let mut file = editor_workspace_file::read(self.fs.as_ref(), &file_path)?;
        editor_workspace_file::upsert_folder(&mut file, extract_repository_name_from_url(repo_url), folder_path.display().to_string());
        editor_workspace_file::write(self.fs.as_ref(), &file_path, &file)
    }

    /// Remove a repository from a workspace.
    pub fn remove_repository_from_workspace(&self, config: &Config, workspace_name: &str, repository_url: &str) -> Result<(), OrchestratorError> {
        let mut document = self.status.load()?;
        let workspace = document
            .workspaces
            .get(workspace_name)
            .ok_or_else(|| OrchestratorError::WorkspaceNotFound { name: workspace_name.to_string() })?
            .clone();

        if !workspace.repositories.contains(&repository_url.to_string()) {
            return Err(OrchestratorError::RepositoryNotFound { repository: repository_url.to_string() });
        }

        for branch in &workspace.worktrees {
            let file_path = per_branch_file_path(&config.workspaces_dir, workspace_name, branch);
            if !self.fs.exists(&file_path) {
                continue;
            }
            let expected_path = build_worktree_path(&config.repositories_dir, repository_url, "origin", branch);
            let mut file = editor_workspace_file::read(self.fs.as_ref(), &file_path)?;
            editor_workspace_file::remove_folder_by_path(&mut file, &expected_path.display().to_string());
            editor_workspace_file::write(self.fs.as_ref(), &file_path, &file)?;
        }

        let workspace_mut = document.workspaces.get_mut(workspace_name).expect("checked above");
        workspace_mut.repositories.retain(|r| r != repository_url);
        self.status.save(&document)?;
        Ok(())
    }

    /// Delete a workspace.
    pub fn delete_workspace(&self, config: &Config, prompter: &dyn Prompter, workspace_name: &str, force: bool) -> Result<(), OrchestratorError> {
        validate_workspace_name(workspace_name)?;
        let document = self.status.load()?;
        let workspace = document
            .workspaces
            .get(workspace_name)
            .ok_or_else(|| OrchestratorError::WorkspaceNotFound { name: workspace_name.to_string() })?
            .clone();

        let worktrees = self.list_worktrees(workspace_name)?;

        if !force {
            let repo_count = worktrees.iter().map(|(url, _, _)| url).collect::<std::collections::HashSet<_>>().len();
            let message = format!(
                "Delete workspace '{workspace_name}'? This will remove {} worktree(s) across {repo_count} repositories.",
                worktrees.len()
            );
            confirm_or_abort(prompter, &message)?;
        }

        let mut document = self.status.load()?;
        let mut removed = std::collections::HashSet::new();
        for (repo_url, branch, repo_path) in &worktrees {
            let Some(repo) = document.repositories.get(repo_url) else {
                log::warn!("workspace references unknown repository '{repo_url}', skipping");
                continue;
            };
            let key = worktree_key("origin", branch);
            let Some(record) = repo.worktrees.get(&key) else { continue };
            let worktree_path = build_worktree_path(&config.repositories_dir, repo_url, &record.remote, &record.branch);
            let main_repo_path = resolve_main_repo_path(repo_path);
            if let Err(e) = self.git.worktree_remove(&main_repo_path, &worktree_path, true) {
                log::warn!("failed to remove worktree at {}: {e}", worktree_path.display());
                continue;
            }
            document.repositories.get_mut(repo_url).expect("checked above").worktrees.remove(&key);
            removed.insert((repo_url.clone(), branch.clone()));
        }

        let main_path = main_file_path(&config.workspaces_dir, workspace_name);
        if let Err(e) = self.fs.remove_file(&main_path) {
            log::warn!("failed to remove {}: {e}", main_path.display());
        }
        for branch in &workspace.worktrees {
            let branch_path = per_branch_file_path(&config.workspaces_dir, workspace_name, branch);
            if let Err(e) = self.fs.remove_file(&branch_path) {
                log::warn!("failed to remove {}: {e}", branch_path.display());
            }
        }

        let remaining_branches: std::collections::HashSet<String> = worktrees
            .iter()
            .filter(|(url, branch, _)| !removed.contains(&(url.clone(), branch.clone())))
            .map(|(_, branch, _)| branch.clone())
            .collect();
        let workspace_mut = document.workspaces.get_mut(workspace_name).expect("checked above");
        workspace_mut.worktrees.retain(|b| remaining_branches.contains(b));

        document.workspaces.shift_remove(workspace_name);
        self.status.save(&document)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_workspace_name_rejects_reserved_chars() {
        assert!(validate_workspace_name("").is_err());
        assert!(validate_workspace_name("a/b").is_err());
        assert!(validate_workspace_name("a:b").is_err());
        assert!(validate_workspace_name("team-a").is_ok());
    }
}
