//! Mode resolver: decides whether an operation targets a single
//! repository, a workspace, or requires interactive selection.

use std::path::Path;

use crate::error::OrchestratorError;
use crate::git_driver::GitDriver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Workspace(String),
    SingleRepo,
    None,
}

/// Resolution runs four rules in order. `cwd` is probed for Git-repository-ness
/// only when neither name is given.
pub fn resolve_mode(
    workspace_name: Option<&str>,
    repository_name: Option<&str>,
    cwd: &Path,
    git: &dyn GitDriver,
) -> Result<Mode, OrchestratorError> {
    let workspace_name = workspace_name.filter(|s| !s.is_empty());
    let repository_name = repository_name.filter(|s| !s.is_empty());

    if workspace_name.is_some() && repository_name.is_some() {
        return Err(OrchestratorError::ConflictingTargets);
    }
    if let Some(name) = workspace_name {
        return Ok(Mode::Workspace(name.to_string()));
    }
    if repository_name.is_some() {
        return Ok(Mode::SingleRepo);
    }
    if git.is_git_repository(cwd) {
        Ok(Mode::SingleRepo)
    } else {
        Ok(Mode::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FakeGit {
        is_repo: bool,
    }

    impl GitDriver for FakeGit {
        fn clone_repository(&self, _: &str, _: &Path, _: bool) -> Result<(), OrchestratorError> {
            unimplemented!()
        }
        fn worktree_add(&self, _: &Path, _: &Path, _: &str, _: &str) -> Result<(), OrchestratorError> {
            unimplemented!()
        }
        fn worktree_remove(&self, _: &Path, _: &Path, _: bool) -> Result<(), OrchestratorError> {
            unimplemented!()
        }
        fn branch_exists(&self, _: &Path, _: &str, _: &str) -> bool {
            unimplemented!()
        }
        fn current_branch(&self, _: &Path) -> Option<String> {
            unimplemented!()
        }
        fn default_branch(&self, _: &Path, _: &str) -> Option<String> {
            unimplemented!()
        }
        fn fetch(&self, _: &Path, _: &str) -> Result<(), OrchestratorError> {
            unimplemented!()
        }
        fn is_clean(&self, _: &Path) -> bool {
            unimplemented!()
        }
        fn is_git_repository(&self, _: &Path) -> bool {
            self.is_repo
        }
        fn origin_url(&self, _: &Path) -> Option<String> {
            unimplemented!()
        }
    }

    #[test]
    fn both_names_given_is_conflicting() {
        let git = FakeGit { is_repo: false };
        let result = resolve_mode(Some("ws"), Some("repo"), &PathBuf::from("."), &git);
        assert!(matches!(result, Err(OrchestratorError::ConflictingTargets)));
    }

    #[test]
    fn workspace_name_wins_without_repository_name() {
        let git = FakeGit { is_repo: false };
        let result = resolve_mode(Some("ws"), None, &PathBuf::from("."), &git).unwrap();
        assert_eq!(result, Mode::Workspace("ws".to_string()));
    }

    #[test]
    fn repository_name_selects_single_repo() {
        let git = FakeGit { is_repo: false };
        let result = resolve_mode(None, Some("repo"), &PathBuf::from("."), &git).unwrap();
        assert_eq!(result, Mode::SingleRepo);
    }

    #[test]
    fn cwd_probe_decides_when_neither_given() {
        let git = FakeGit { is_repo: true };
        let result = resolve_mode(None, None, &PathBuf::from("."), &git).unwrap();
        assert_eq!(result, Mode::SingleRepo);

        let git = FakeGit { is_repo: false };
        let result = resolve_mode(None, None, &PathBuf::from("."), &git).unwrap();
        assert_eq!(result, Mode::None);
    }
}
