//! Interactive prompter: target disambiguation and confirmations.

use crate::error::OrchestratorError;

/// A selectable target for interactive disambiguation: either a repository
/// or a workspace, sorted repositories-before-workspaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectableTarget {
    Repository(String),
    Workspace(String),
}

impl std::fmt::Display for SelectableTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectableTarget::Repository(name) => write!(f, "{name} (repository)"),
            SelectableTarget::Workspace(name) => write!(f, "{name} (workspace)"),
        }
    }
}

/// External collaborator for every interactive decision the orchestrator
/// needs to make when its inputs don't already disambiguate the target.
pub trait Prompter: Send + Sync {
    /// Select one item from a non-empty list; returns its index.
    fn select_one(&self, message: &str, items: &[String]) -> Result<usize, OrchestratorError>;

    /// Select a target, then a branch among that target's worktrees.
    fn select_two_step(
        &self,
        targets: &[SelectableTarget],
        branches_for: &dyn Fn(&SelectableTarget) -> Vec<String>,
    ) -> Result<(SelectableTarget, String), OrchestratorError>;

    fn confirm(&self, message: &str) -> Result<bool, OrchestratorError>;

    /// Free-text input, used by `Init`'s interactive path configuration.
    fn text(&self, message: &str, default: &str) -> Result<String, OrchestratorError>;
}

/// Real terminal prompter built on `inquire`.
pub struct InquirePrompter;

impl InquirePrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InquirePrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for InquirePrompter {
    fn select_one(&self, message: &str, items: &[String]) -> Result<usize, OrchestratorError> {
        let selection = inquire::Select::new(message, items.to_vec())
            .raw_prompt()
            .map_err(|e| OrchestratorError::other(format!("prompt cancelled: {e}")))?;
        Ok(selection.index)
    }

    fn select_two_step(
        &self,
        targets: &[SelectableTarget],
        branches_for: &dyn Fn(&SelectableTarget) -> Vec<String>,
    ) -> Result<(SelectableTarget, String), OrchestratorError> {
        let labels: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
        let target_index = self.select_one("Select a repository or workspace", &labels)?;
        let target = targets[target_index].clone();
        let branches = branches_for(&target);
        if branches.is_empty() {
            return Err(OrchestratorError::other(format!("{target} has no worktrees")));
        }
        let branch_index = self.select_one("Select a branch", &branches)?;
        Ok((target, branches[branch_index].clone()))
    }

    fn confirm(&self, message: &str) -> Result<bool, OrchestratorError> {
        inquire::Confirm::new(message)
            .with_default(false)
            .prompt()
            .map_err(|e| OrchestratorError::other(format!("prompt cancelled: {e}")))
    }

    fn text(&self, message: &str, default: &str) -> Result<String, OrchestratorError> {
        inquire::Text::new(message)
            .with_default(default)
            .prompt()
            .map_err(|e| OrchestratorError::other(format!("prompt cancelled: {e}")))
    }
}

/// Confirm a destructive action, returning [`OrchestratorError::DeletionCancelled`]
/// on decline — the shared pattern behind every `--force`-gated prompt in
/// Worktree listings for a single target, used by the two-step selector.
pub fn confirm_or_abort(prompter: &dyn Prompter, message: &str) -> Result<(), OrchestratorError> {
    if prompter.confirm(message)? {
        Ok(())
    } else {
        Err(OrchestratorError::DeletionCancelled)
    }
}

/// Ordering rule: repositories before workspaces, alphabetical
/// by name within each group.
pub fn sorted_targets(repository_names: &[String], workspace_names: &[String]) -> Vec<SelectableTarget> {
    let mut repos: Vec<String> = repository_names.to_vec();
    repos.sort();
    let mut workspaces: Vec<String> = workspace_names.to_vec();
    workspaces.sort();
    repos
        .into_iter()
        .map(SelectableTarget::Repository)
        .chain(workspaces.into_iter().map(SelectableTarget::Workspace))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_targets_puts_repositories_first_then_alphabetical() {
        let targets = sorted_targets(
            &["zeta".to_string(), "alpha".to_string()],
            &["beta-ws".to_string(), "alpha-ws".to_string()],
        );
        assert_eq!(
            targets,
            vec![
                SelectableTarget::Repository("alpha".to_string()),
                SelectableTarget::Repository("zeta".to_string()),
                SelectableTarget::Workspace("alpha-ws".to_string()),
                SelectableTarget::Workspace("beta-ws".to_string()),
            ]
        );
    }
}
