//! Hook pipeline (C3): wraps every public operation with pre/post/error
//! phases and panic containment.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{CommandConfig, HooksConfig, ProjectConfig, expand_command_template};
use crate::error::OrchestratorError;

/// The closed set of operation names recognized by the hook pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationName {
    CreateWorkTree,
    DeleteWorkTree,
    DeleteAllWorktrees,
    OpenWorktree,
    ListWorktrees,
    LoadWorktree,
    Init,
    Clone,
    ListRepositories,
    DeleteRepository,
    CreateWorkspace,
    DeleteWorkspace,
    ListWorkspaces,
    AddRepositoryToWorkspace,
    RemoveRepositoryFromWorkspace,
    PromptSelectTarget,
}

impl std::fmt::Display for OperationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The project-config hook phase slots a `ConfigHookManager` dispatches to.
/// Distinct from [`OperationName`]: several operations share a phase slot
/// (e.g. both `CreateWorkTree` and `LoadWorktree` can drive `PostCreate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookType {
    PostCreate,
    PostStart,
    PostSwitch,
    PreCommit,
    PreMerge,
    PostMerge,
    PreRemove,
    PostRemove,
}

/// A loosely-typed scalar carried in a [`HookContext`]'s parameter, result,
/// or metadata maps.
#[derive(Debug, Clone, PartialEq)]
pub enum HookValue {
    Str(String),
    Bool(bool),
    Int(i64),
    StrList(Vec<String>),
}

impl From<&str> for HookValue {
    fn from(value: &str) -> Self {
        HookValue::Str(value.to_string())
    }
}
impl From<String> for HookValue {
    fn from(value: String) -> Self {
        HookValue::Str(value)
    }
}
impl From<bool> for HookValue {
    fn from(value: bool) -> Self {
        HookValue::Bool(value)
    }
}

/// Carries an operation's parameters, results, and metadata across the
/// pre/post/error phases.
pub struct HookContext {
    pub operation: OperationName,
    pub params: HashMap<String, HookValue>,
    pub results: HashMap<String, HookValue>,
    pub metadata: HashMap<String, HookValue>,
    pub error: Option<OrchestratorError>,
    /// Repository root or primary worktree path, when known — the working
    /// directory commands are expanded and run from.
    pub repo_root: Option<PathBuf>,
}

impl HookContext {
    pub fn new(operation: OperationName) -> Self {
        Self {
            operation,
            params: HashMap::new(),
            results: HashMap::new(),
            metadata: HashMap::new(),
            error: None,
            repo_root: None,
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<HookValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn set_result(&mut self, key: &str, value: impl Into<HookValue>) {
        self.results.insert(key.to_string(), value.into());
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        match self.params.get(key) {
            Some(HookValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// External collaborator driving the pre/post/error phases of an operation.
///
/// When no hook manager is installed, the pipeline still runs (it always
/// does — see [`run_with_hooks`]) but substitutes [`NullHookManager`],
/// which makes the pre/post phases no-ops.
pub trait HookManager: Send + Sync {
    fn pre(&self, ctx: &mut HookContext) -> Result<(), OrchestratorError>;
    fn post(&self, ctx: &mut HookContext) -> Result<(), OrchestratorError>;
    fn error(&self, ctx: &mut HookContext) -> Result<(), OrchestratorError>;
}

/// No-op [`HookManager`] — the default when no project hook configuration
/// is present.
pub struct NullHookManager;

impl HookManager for NullHookManager {
    fn pre(&self, _ctx: &mut HookContext) -> Result<(), OrchestratorError> {
        Ok(())
    }
    fn post(&self, _ctx: &mut HookContext) -> Result<(), OrchestratorError> {
        Ok(())
    }
    fn error(&self, _ctx: &mut HookContext) -> Result<(), OrchestratorError> {
        Ok(())
    }
}

/// Maps an [`OperationName`] + phase to the [`HookType`] slot it drives, if
/// any. Most operations have no configured hook; worktree lifecycle
/// operations drive the slots named by `HookType`.
fn hook_type_for(operation: OperationName, is_pre: bool) -> Option<HookType> {
    use OperationName::*;
    match (operation, is_pre) {
        (CreateWorkTree, false) => Some(HookType::PostCreate),
        (LoadWorktree, false) => Some(HookType::PostStart),
        (OpenWorktree, false) => Some(HookType::PostSwitch),
        (DeleteWorkTree, true) => Some(HookType::PreRemove),
        (DeleteWorkTree, false) => Some(HookType::PostRemove),
        (DeleteAllWorktrees, true) => Some(HookType::PreRemove),
        (DeleteAllWorktrees, false) => Some(HookType::PostRemove),
        _ => None,
    }
}

/// Runs commands declared in project config (`.fleet/hooks.toml`) at the
/// pre/post/error phases of worktree lifecycle operations.
///
/// Pre-hooks and error-hooks are blocking and fail-fast: a non-zero exit
/// short-circuits (and for pre-hooks, aborts the operation before its
/// body runs). Post-hooks are best-effort: a failure supersedes the
/// operation's own result but does not roll back
/// completed work.
pub struct ConfigHookManager {
    hooks: HooksConfig,
}

impl ConfigHookManager {
    pub fn new(hooks: HooksConfig) -> Self {
        Self { hooks }
    }

    /// Load from `<repo_root>/.fleet/hooks.toml` via [`ProjectConfig`],
    /// falling back to an empty [`HooksConfig`] when absent.
    pub fn load(repo_root: &std::path::Path) -> Result<Self, OrchestratorError> {
        let project = ProjectConfig::load(repo_root)?;
        let hooks = match project {
            Some(project) => HooksConfig {
                post_create: project.post_create_command,
                post_start: project.post_start_command,
                pre_commit: project.pre_commit_command,
                pre_merge: project.pre_merge_command,
                post_merge: project.post_merge_command,
                ..HooksConfig::default()
            },
            None => HooksConfig::default(),
        };
        Ok(Self { hooks })
    }

    fn run_phase(&self, ctx: &mut HookContext, hook_type: HookType) -> Result<(), OrchestratorError> {
        let Some(command_config) = self.hooks.get(hook_type) else {
            return Ok(());
        };
        if command_config.is_empty() {
            return Ok(());
        }
        let repo_root = ctx.repo_root.clone().unwrap_or_else(|| PathBuf::from("."));
        let repo_name = repo_root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("repo")
            .to_string();
        let branch = ctx.param_str("branch").unwrap_or_default().to_string();
        let worktree_path = ctx
            .results
            .get("worktreePath")
            .and_then(|v| match v {
                HookValue::Str(s) => Some(PathBuf::from(s)),
                _ => None,
            })
            .unwrap_or_else(|| repo_root.clone());

        for (label, command) in command_config.commands() {
            let expanded = expand_command_template(&command, &repo_name, &branch, &worktree_path, &repo_root, None)
                .map_err(|e| OrchestratorError::other(format!("hook '{label}' template error: {e}")))?;
            log::debug!("running hook '{label}': {expanded}");
            let status = std::process::Command::new("sh").arg("-c").arg(&expanded).current_dir(&repo_root).status();
            match status {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    return Err(OrchestratorError::other(format!(
                        "hook '{label}' exited with status {status}"
                    )));
                }
                Err(e) => return Err(OrchestratorError::other(format!("hook '{label}' failed to start: {e}"))),
            }
        }
        Ok(())
    }
}

impl HookManager for ConfigHookManager {
    fn pre(&self, ctx: &mut HookContext) -> Result<(), OrchestratorError> {
        match hook_type_for(ctx.operation, true) {
            Some(hook_type) => self.run_phase(ctx, hook_type),
            None => Ok(()),
        }
    }

    fn post(&self, ctx: &mut HookContext) -> Result<(), OrchestratorError> {
        match hook_type_for(ctx.operation, false) {
            Some(hook_type) => self.run_phase(ctx, hook_type),
            None => Ok(()),
        }
    }

    fn error(&self, _ctx: &mut HookContext) -> Result<(), OrchestratorError> {
        Ok(())
    }
}

/// Drives the full hook contract around an operation body: pre-hooks,
/// the panic-barriered body, and post-/error-hooks, in order.
///
/// A pre-hook failure short-circuits before `body` runs. A panic inside
/// `body` is caught and converted to [`OrchestratorError::Panic`]. A
/// post/error-hook failure supersedes the operation's own outcome.
pub fn run_with_hooks<F>(hooks: &dyn HookManager, mut ctx: HookContext, body: F) -> Result<HookContext, OrchestratorError>
where
    F: FnOnce(&mut HookContext) -> Result<(), OrchestratorError>,
{
    if let Err(e) = hooks.pre(&mut ctx) {
        ctx.error = Some(e.clone());
        let _ = hooks.error(&mut ctx);
        return Err(e);
    }

    let operation = ctx.operation;
    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        let mut ctx = ctx;
        let result = body(&mut ctx);
        (ctx, result)
    }));

    let (mut ctx, result) = match outcome {
        Ok(pair) => pair,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            let mut ctx = HookContext::new(operation);
            let error = OrchestratorError::Panic { operation: operation.to_string(), payload: message };
            ctx.error = Some(error.clone());
            let _ = hooks.error(&mut ctx);
            return Err(error);
        }
    };

    match result {
        Ok(()) => {
            ctx.set_result("success", true);
            match hooks.post(&mut ctx) {
                Ok(()) => Ok(ctx),
                Err(e) => {
                    ctx.error = Some(e.clone());
                    Err(e)
                }
            }
        }
        Err(e) => {
            ctx.error = Some(e.clone());
            match hooks.error(&mut ctx) {
                Ok(()) => Err(e),
                Err(hook_err) => Err(hook_err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_hook_failure_short_circuits_before_body_runs() {
        struct FailingPre;
        impl HookManager for FailingPre {
            fn pre(&self, _ctx: &mut HookContext) -> Result<(), OrchestratorError> {
                Err(OrchestratorError::other("pre failed"))
            }
            fn post(&self, _ctx: &mut HookContext) -> Result<(), OrchestratorError> {
                Ok(())
            }
            fn error(&self, _ctx: &mut HookContext) -> Result<(), OrchestratorError> {
                Ok(())
            }
        }

        let mut body_ran = false;
        let ctx = HookContext::new(OperationName::CreateWorkTree);
        let result = run_with_hooks(&FailingPre, ctx, |_ctx| {
            body_ran = true;
            Ok(())
        });
        assert!(result.is_err());
        assert!(!body_ran);
    }

    #[test]
    fn panic_in_body_converts_to_panic_error() {
        let ctx = HookContext::new(OperationName::CreateWorkTree);
        let result = run_with_hooks(&NullHookManager, ctx, |_ctx| {
            panic!("boom");
        });
        match result {
            Err(OrchestratorError::Panic { operation, payload }) => {
                assert_eq!(operation, "CreateWorkTree");
                assert_eq!(payload, "boom");
            }
            other => panic!("expected Panic error, got {other:?}"),
        }
    }

    #[test]
    fn successful_body_sets_success_result() {
        let ctx = HookContext::new(OperationName::ListRepositories);
        let ctx = run_with_hooks(&NullHookManager, ctx, |_ctx| Ok(())).unwrap();
        assert_eq!(ctx.results.get("success"), Some(&HookValue::Bool(true)));
    }

    #[test]
    fn hook_type_for_maps_create_worktree_to_post_create() {
        assert_eq!(hook_type_for(OperationName::CreateWorkTree, false), Some(HookType::PostCreate));
        assert_eq!(hook_type_for(OperationName::ListRepositories, false), None);
    }
}
