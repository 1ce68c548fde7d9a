//! The orchestrator: the one path every public operation flows through
//! Builds a [`HookContext`], drives it through
//! [`run_with_hooks`], and on success extracts the specific result the CLI
//! needs.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, ConfigManager};
use crate::editor::{EditorLauncher, OpenTarget};
use crate::error::OrchestratorError;
use crate::forge::ForgeAdapter;
use crate::git_driver::GitDriver;
use crate::hooks::{HookContext, HookManager, HookValue, NullHookManager, OperationName, run_with_hooks};
use crate::mode::{Mode, resolve_mode};
use crate::prompt::{Prompter, confirm_or_abort, sorted_targets};
use crate::repository_engine::RepositoryEngine;
use crate::status::StatusStore;
use crate::url::sanitize_branch_for_git;
use crate::workspace_engine::WorkspaceEngine;

/// Every public operation's options, gathered into one record:
/// one record with the recognized fields, the CLI layer populating only
/// the ones relevant to the subcommand it dispatched.
#[derive(Debug, Clone, Default)]
pub struct OperationOptions {
    pub branch: Option<String>,
    pub branches: Vec<String>,
    pub ide_name: Option<String>,
    pub issue_ref: Option<String>,
    pub workspace_name: Option<String>,
    pub repository_name: Option<String>,
    pub force: bool,
    pub remote: Option<String>,
    pub recursive: bool,
    pub url: Option<String>,
    pub repositories: Vec<String>,
}

pub struct Orchestrator {
    pub config_manager: Arc<dyn ConfigManager>,
    pub status: Arc<dyn StatusStore>,
    pub git: Arc<dyn GitDriver>,
    pub prompter: Arc<dyn Prompter>,
    pub hooks: Arc<dyn HookManager>,
    pub forge: Arc<dyn ForgeAdapter>,
    pub editor: Arc<dyn EditorLauncher>,
    pub repository_engine: RepositoryEngine,
    pub workspace_engine: WorkspaceEngine,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config_manager: Arc<dyn ConfigManager>,
        status: Arc<dyn StatusStore>,
        git: Arc<dyn GitDriver>,
        fs: Arc<dyn crate::fs_driver::FsDriver>,
        prompter: Arc<dyn Prompter>,
        hooks: Arc<dyn HookManager>,
        forge: Arc<dyn ForgeAdapter>,
        editor: Arc<dyn EditorLauncher>,
    ) -> Self {
        let repository_engine = RepositoryEngine::new(git.clone(), fs.clone(), status.clone());
        let workspace_engine = WorkspaceEngine::new(git.clone(), fs.clone(), status.clone());
        Self { config_manager, status, git, prompter, hooks, forge, editor, repository_engine, workspace_engine }
    }

    /// Construct with [`NullHookManager`] — the default when no project
    /// hook configuration is present.
    #[allow(clippy::too_many_arguments)]
    pub fn without_hooks(
        config_manager: Arc<dyn ConfigManager>,
        status: Arc<dyn StatusStore>,
        git: Arc<dyn GitDriver>,
        fs: Arc<dyn crate::fs_driver::FsDriver>,
        prompter: Arc<dyn Prompter>,
        forge: Arc<dyn ForgeAdapter>,
        editor: Arc<dyn EditorLauncher>,
    ) -> Self {
        Self::new(config_manager, status, git, fs, prompter, Arc::new(NullHookManager), forge, editor)
    }

    fn config(&self) -> Result<Config, OrchestratorError> {
        self.config_manager.load()
    }

    fn resolve_mode(&self, options: &OperationOptions) -> Result<Mode, OrchestratorError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        resolve_mode(options.workspace_name.as_deref(), options.repository_name.as_deref(), &cwd, self.git.as_ref())
    }

    /// Set up repositories_dir, workspaces_dir, and the status file.
    pub fn init(&self, options: &OperationOptions, repositories_dir: PathBuf, workspaces_dir: PathBuf, status_file: PathBuf) -> Result<(), OrchestratorError> {
        let ctx = HookContext::new(OperationName::Init);
        run_with_hooks(self.hooks.as_ref(), ctx, |_ctx| {
            if self.config_manager.exists() && !options.force {
                confirm_or_abort(self.prompter.as_ref(), "Reset existing fleet configuration?")?;
            }
            let config = Config { repositories_dir: repositories_dir.clone(), workspaces_dir: workspaces_dir.clone(), status_file: status_file.clone() }
                .expand_and_validate()?;
            std::fs::create_dir_all(&config.repositories_dir)
                .map_err(|e| OrchestratorError::other(format!("failed to create {}: {e}", config.repositories_dir.display())))?;
            std::fs::create_dir_all(&config.workspaces_dir)
                .map_err(|e| OrchestratorError::other(format!("failed to create {}: {e}", config.workspaces_dir.display())))?;
            self.config_manager.save(&config)?;
            if self.status.load().is_err() {
                self.status.save(&crate::status::StatusDocument::default())?;
            }
            Ok(())
        })
        .map(|_| ())
    }

    /// Explicitly clone a repository into the managed repositories directory.
    pub fn clone(&self, options: &OperationOptions) -> Result<PathBuf, OrchestratorError> {
        let url = options.url.clone().ok_or_else(|| OrchestratorError::ArgumentEmpty { name: "url".to_string() })?;
        let ctx = HookContext::new(OperationName::Clone).with_param("url", url.clone());
        let result = run_with_hooks(self.hooks.as_ref(), ctx, |ctx| {
            let config = self.config()?;
            let (_url, path) = self.repository_engine.clone_repository(&config, &url, options.recursive)?;
            ctx.set_result("worktreePath", path.display().to_string());
            Ok(())
        })?;
        Ok(result_path(&result))
    }

    /// Create a worktree for a branch, in single-repo or workspace mode.
    pub fn create_worktree(&self, options: &OperationOptions) -> Result<PathBuf, OrchestratorError> {
        let raw_branch = options.branch.clone().unwrap_or_default();
        let branch = if raw_branch.is_empty() {
            match &options.issue_ref {
                Some(issue_ref) if !issue_ref.is_empty() => self.forge.resolve_issue_branch(issue_ref)?,
                _ => return Err(OrchestratorError::ArgumentEmpty { name: "branch".to_string() }),
            }
        } else {
            sanitize_branch_for_git(&raw_branch, None)
        };
        let remote = options.remote.clone().unwrap_or_else(|| "origin".to_string());
        let force = options.force;

        let ctx = HookContext::new(OperationName::CreateWorkTree).with_param("branch", branch.clone());
        let result = run_with_hooks(self.hooks.as_ref(), ctx, |ctx| {
            let config = self.config()?;
            match self.resolve_mode(options)? {
                Mode::SingleRepo => {
                    let repo_key = self.single_repo_key(options)?;
                    let path = self.repository_engine.create_worktree(&config, &repo_key, &branch, &remote, force)?;
                    ctx.repo_root = Some(path.clone());
                    ctx.set_result("worktreePath", path.display().to_string());
                    Ok(())
                }
                Mode::Workspace(name) => {
                    let document = self.status.load()?;
                    let workspace = document
                        .workspaces
                        .get(&name)
                        .ok_or_else(|| OrchestratorError::WorkspaceNotFound { name: name.clone() })?
                        .clone();
                    for member in &workspace.repositories {
                        match self.repository_engine.create_worktree(&config, member, &branch, &remote, force) {
                            Ok(_) | Err(OrchestratorError::WorktreeExists { .. }) => {}
                            Err(e) => return Err(e),
                        }
                    }
                    let mut document = self.status.load()?;
                    let workspace_mut = document.workspaces.get_mut(&name).expect("checked above");
                    if !workspace_mut.worktrees.contains(&branch) {
                        workspace_mut.worktrees.push(branch.clone());
                    }
                    self.status.save(&document)?;
                    ctx.set_result("worktreePath", name.clone());
                    Ok(())
                }
                Mode::None => Err(OrchestratorError::NoGitRepositoryOrWorkspaceFound),
            }
        })?;

        let path = result_path(&result);
        if options.ide_name.is_some() {
            self.editor.open(&OpenTarget::Repo(path.clone()))?;
        }
        Ok(path)
    }

    /// Create or reuse a worktree for a `"[remote:]branch"` spec.
    pub fn load_worktree(&self, options: &OperationOptions, spec: &str) -> Result<PathBuf, OrchestratorError> {
        let ctx = HookContext::new(OperationName::LoadWorktree).with_param("spec", spec);
        let result = run_with_hooks(self.hooks.as_ref(), ctx, |ctx| {
            if matches!(self.resolve_mode(options)?, Mode::Workspace(_)) {
                return Err(OrchestratorError::WorkspaceModeNotSupportedForLoad);
            }
            let config = self.config()?;
            let repo_key = self.single_repo_key(options)?;
            let path = self.repository_engine.load_worktree(&config, &repo_key, spec)?;
            ctx.repo_root = Some(path.clone());
            ctx.set_result("worktreePath", path.display().to_string());
            Ok(())
        })?;
        Ok(result_path(&result))
    }

    /// Delete one or more worktrees, or every worktree of the target.
    pub fn delete_worktrees(&self, options: &OperationOptions) -> Result<(), OrchestratorError> {
        let operation = if options.branches.is_empty() { OperationName::DeleteAllWorktrees } else { OperationName::DeleteWorkTree };
        let ctx = HookContext::new(operation);
        run_with_hooks(self.hooks.as_ref(), ctx, |_ctx| {
            let config = self.config()?;
            match self.resolve_mode(options)? {
                Mode::SingleRepo => {
                    let repo_key = self.single_repo_key(options)?;
                    if options.branches.is_empty() {
                        self.repository_engine.delete_all_worktrees(&config, &repo_key, options.force)
                    } else {
                        self.repository_engine.delete_worktrees(&config, &repo_key, &options.branches, options.force)
                    }
                }
                Mode::Workspace(name) => {
                    if !options.force {
                        confirm_or_abort(self.prompter.as_ref(), &format!("Delete worktrees in workspace '{name}'?"))?;
                    }
                    let document = self.status.load()?;
                    let workspace = document.workspaces.get(&name).ok_or_else(|| OrchestratorError::WorkspaceNotFound { name: name.clone() })?.clone();
                    let mut failed = Vec::new();
                    for member in &workspace.repositories {
                        let branches = if options.branches.is_empty() { workspace.worktrees.clone() } else { options.branches.clone() };
                        if let Err(e) = self.repository_engine.delete_worktrees(&config, member, &branches, true) {
                            log::warn!("failed to delete worktrees for '{member}': {e}");
                            failed.push(member.clone());
                        }
                    }
                    if failed.is_empty() {
                        Ok(())
                    } else {
                        Err(OrchestratorError::BatchOperationFailed {
                            message: format!("some worktrees failed to delete: {}", failed.join(", ")),
                            failed,
                        })
                    }
                }
                Mode::None => Err(OrchestratorError::NoGitRepositoryOrWorkspaceFound),
            }
        })
        .map(|_| ())
    }

    /// Open a worktree, or a workspace's per-branch editor file.
    pub fn open_worktree(&self, options: &OperationOptions) -> Result<PathBuf, OrchestratorError> {
        let branch = options.branch.clone();
        let ctx = HookContext::new(OperationName::OpenWorktree);
        let result = run_with_hooks(self.hooks.as_ref(), ctx, |ctx| {
            let config = self.config()?;
            let target = match self.resolve_mode(options)? {
                Mode::SingleRepo => {
                    let repo_key = self.single_repo_key(options)?;
                    let branch = self.resolve_target_branch(&repo_key, branch.as_deref())?;
                    let document = self.status.load()?;
                    document.repositories.get(&repo_key).ok_or_else(|| OrchestratorError::RepositoryNotFound { repository: repo_key.clone() })?;
                    let path = crate::url::build_worktree_path(&config.repositories_dir, &repo_key, "origin", &branch);
                    OpenTarget::Repo(path)
                }
                Mode::Workspace(name) => {
                    let branch = branch.ok_or_else(|| OrchestratorError::ArgumentEmpty { name: "branch".to_string() })?;
                    let path = crate::editor_workspace_file::per_branch_file_path(&config.workspaces_dir, &name, &branch);
                    OpenTarget::Workspace(path)
                }
                Mode::None => return Err(OrchestratorError::NoGitRepositoryOrWorkspaceFound),
            };
            ctx.set_result("worktreePath", target.path().display().to_string());
            self.editor.open(&target)?;
            Ok(())
        })?;
        Ok(result_path(&result))
    }

    fn resolve_target_branch(&self, repo_key: &str, branch: Option<&str>) -> Result<String, OrchestratorError> {
        if let Some(branch) = branch {
            return Ok(branch.to_string());
        }
        let worktrees = self.repository_engine.list_worktrees(repo_key)?;
        let branches: Vec<String> = worktrees.iter().map(|w| w.branch.clone()).collect();
        if branches.is_empty() {
            return Err(OrchestratorError::ArgumentEmpty { name: "branch".to_string() });
        }
        let index = self.prompter.select_one("Select a worktree", &branches)?;
        Ok(branches[index].clone())
    }

    /// List worktrees for the resolved target.
    pub fn list_worktrees(&self, options: &OperationOptions) -> Result<Vec<String>, OrchestratorError> {
        let ctx = HookContext::new(OperationName::ListWorktrees);
        let result = run_with_hooks(self.hooks.as_ref(), ctx, |ctx| {
            let branches = match self.resolve_mode(options)? {
                Mode::SingleRepo => {
                    let repo_key = self.single_repo_key(options)?;
                    self.repository_engine.list_worktrees(&repo_key)?.into_iter().map(|w| w.branch).collect()
                }
                Mode::Workspace(name) => self.workspace_engine.list_worktrees(&name)?.into_iter().map(|(_, branch, _)| branch).collect(),
                Mode::None => return Err(OrchestratorError::NoGitRepositoryOrWorkspaceFound),
            };
            ctx.set_result("worktrees", HookValue::StrList(branches));
            Ok(())
        })?;
        match result.results.get("worktrees") {
            Some(HookValue::StrList(list)) => Ok(list.clone()),
            _ => Ok(Vec::new()),
        }
    }

    pub fn list_repositories(&self) -> Result<Vec<String>, OrchestratorError> {
        let ctx = HookContext::new(OperationName::ListRepositories);
        let result = run_with_hooks(self.hooks.as_ref(), ctx, |ctx| {
            let repos = self.repository_engine.list_repositories()?;
            ctx.set_result("repositories", HookValue::StrList(repos));
            Ok(())
        })?;
        match result.results.get("repositories") {
            Some(HookValue::StrList(list)) => Ok(list.clone()),
            _ => Ok(Vec::new()),
        }
    }

    pub fn delete_repository(&self, options: &OperationOptions) -> Result<(), OrchestratorError> {
        let repo_key = options.repository_name.clone().ok_or_else(|| OrchestratorError::ArgumentEmpty { name: "repository".to_string() })?;
        let ctx = HookContext::new(OperationName::DeleteRepository).with_param("repository", repo_key.clone());
        run_with_hooks(self.hooks.as_ref(), ctx, |_ctx| {
            if !options.force {
                confirm_or_abort(self.prompter.as_ref(), &format!("Delete repository '{repo_key}'?"))?;
            }
            let config = self.config()?;
            self.repository_engine.delete_repository(&config, &repo_key)
        })
        .map(|_| ())
    }

    pub fn create_workspace(&self, options: &OperationOptions) -> Result<(), OrchestratorError> {
        let name = options.workspace_name.clone().ok_or_else(|| OrchestratorError::ArgumentEmpty { name: "name".to_string() })?;
        let ctx = HookContext::new(OperationName::CreateWorkspace).with_param("workspace", name.clone());
        run_with_hooks(self.hooks.as_ref(), ctx, |_ctx| {
            let config = self.config()?;
            self.workspace_engine.create_workspace(&config, &self.repository_engine, &name, &options.repositories)
        })
        .map(|_| ())
    }

    pub fn delete_workspace(&self, options: &OperationOptions) -> Result<(), OrchestratorError> {
        let name = options.workspace_name.clone().ok_or_else(|| OrchestratorError::ArgumentEmpty { name: "name".to_string() })?;
        let ctx = HookContext::new(OperationName::DeleteWorkspace).with_param("workspace", name.clone());
        run_with_hooks(self.hooks.as_ref(), ctx, |_ctx| {
            let config = self.config()?;
            self.workspace_engine.delete_workspace(&config, self.prompter.as_ref(), &name, options.force)
        })
        .map(|_| ())
    }

    pub fn list_workspaces(&self) -> Result<Vec<String>, OrchestratorError> {
        let ctx = HookContext::new(OperationName::ListWorkspaces);
        let result = run_with_hooks(self.hooks.as_ref(), ctx, |ctx| {
            let workspaces = self.workspace_engine.list_workspaces()?;
            ctx.set_result("workspaces", HookValue::StrList(workspaces));
            Ok(())
        })?;
        match result.results.get("workspaces") {
            Some(HookValue::StrList(list)) => Ok(list.clone()),
            _ => Ok(Vec::new()),
        }
    }

    pub fn add_repository_to_workspace(&self, options: &OperationOptions) -> Result<(), OrchestratorError> {
        let (workspace_name, repository) = self.resolve_add_remove_targets(options)?;
        let ctx = HookContext::new(OperationName::AddRepositoryToWorkspace).with_param("workspace", workspace_name.clone());
        run_with_hooks(self.hooks.as_ref(), ctx, |_ctx| {
            let config = self.config()?;
            self.workspace_engine.add_repository_to_workspace(&config, &self.repository_engine, &workspace_name, &repository)
        })
        .map(|_| ())
    }

    pub fn remove_repository_from_workspace(&self, options: &OperationOptions) -> Result<(), OrchestratorError> {
        let (workspace_name, repository) = self.resolve_add_remove_targets(options)?;
        let ctx = HookContext::new(OperationName::RemoveRepositoryFromWorkspace).with_param("workspace", workspace_name.clone());
        run_with_hooks(self.hooks.as_ref(), ctx, |_ctx| {
            let config = self.config()?;
            self.workspace_engine.remove_repository_from_workspace(&config, &workspace_name, &repository)
        })
        .map(|_| ())
    }

    /// Resolve workspace/repository interactively when either is omitted,
    /// Resolve the workspace/repository pair an add/remove call targets.
    fn resolve_add_remove_targets(&self, options: &OperationOptions) -> Result<(String, String), OrchestratorError> {
        let workspace_name = match &options.workspace_name {
            Some(name) => name.clone(),
            None => {
                let workspaces = self.workspace_engine.list_workspaces()?;
                if workspaces.is_empty() {
                    return Err(OrchestratorError::WorkspaceNotFound { name: String::new() });
                }
                let index = self.prompter.select_one("Select a workspace", &workspaces)?;
                workspaces[index].clone()
            }
        };
        let repository = match &options.repository_name {
            Some(name) => name.clone(),
            None => {
                let repos = self.repository_engine.list_repositories()?;
                if repos.is_empty() {
                    return Err(OrchestratorError::RepositoryNotFound { repository: String::new() });
                }
                let index = self.prompter.select_one("Select a repository", &repos)?;
                repos[index].clone()
            }
        };
        Ok((workspace_name, repository))
    }

    /// Resolve the single-repository target for `SingleRepo` mode: an
    /// explicit `--repository` name, or the repository owning the CWD.
    fn single_repo_key(&self, options: &OperationOptions) -> Result<String, OrchestratorError> {
        if let Some(name) = &options.repository_name {
            return Ok(name.clone());
        }
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let origin_url = self.git.origin_url(&cwd);
        match origin_url.and_then(|url| crate::url::normalize_url(&url).ok()) {
            Some(url) => Ok(url),
            None => Ok(cwd.display().to_string()),
        }
    }

    /// Interactive target + branch selection (repository or workspace, then branch).
    pub fn prompt_select_target(&self) -> Result<(String, String), OrchestratorError> {
        let ctx = HookContext::new(OperationName::PromptSelectTarget);
        let result = run_with_hooks(self.hooks.as_ref(), ctx, |ctx| {
            let repos = self.repository_engine.list_repositories()?;
            let workspaces = self.workspace_engine.list_workspaces()?;
            let targets = sorted_targets(&repos, &workspaces);
            if targets.is_empty() {
                return Err(OrchestratorError::NoGitRepositoryOrWorkspaceFound);
            }
            let repository_engine = &self.repository_engine;
            let workspace_engine = &self.workspace_engine;
            let (target, branch) = self.prompter.select_two_step(&targets, &|target| match target {
                crate::prompt::SelectableTarget::Repository(name) => {
                    repository_engine.list_worktrees(name).map(|w| w.into_iter().map(|w| w.branch).collect()).unwrap_or_default()
                }
                crate::prompt::SelectableTarget::Workspace(name) => {
                    workspace_engine.list_worktrees(name).map(|w| w.into_iter().map(|(_, b, _)| b).collect()).unwrap_or_default()
                }
            })?;
            let target_name = match &target {
                crate::prompt::SelectableTarget::Repository(name) => name.clone(),
                crate::prompt::SelectableTarget::Workspace(name) => name.clone(),
            };
            ctx.set_result("target", target_name);
            ctx.set_result("branch", branch);
            Ok(())
        })?;
        let target = result.results.get("target").and_then(as_str).unwrap_or_default();
        let branch = result.results.get("branch").and_then(as_str).unwrap_or_default();
        Ok((target, branch))
    }
}

fn as_str(value: &HookValue) -> Option<String> {
    match value {
        HookValue::Str(s) => Some(s.clone()),
        _ => None,
    }
}

fn result_path(ctx: &HookContext) -> PathBuf {
    match ctx.results.get("worktreePath") {
        Some(HookValue::Str(s)) => PathBuf::from(s),
        _ => PathBuf::new(),
    }
}
