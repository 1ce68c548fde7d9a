//! Git driver: the one place that shells out to the real `git` binary.
//!
//! Every call is a `git` subcommand executed with `std::process::Command`,
//! stdout captured, stderr folded into the error on non-zero exit. No
//! `git2` dependency — plumbing commands are invoked directly.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::OrchestratorError;

/// External collaborator for every Git operation the orchestrator needs.
///
/// Implementations are expected to be stateless beyond the `git` binary
/// itself; every method takes the repository path it should operate in.
pub trait GitDriver: Send + Sync {
    fn clone_repository(&self, url: &str, target: &Path, recursive: bool) -> Result<(), OrchestratorError>;
    fn worktree_add(&self, repo_path: &Path, worktree_path: &Path, branch: &str, remote: &str) -> Result<(), OrchestratorError>;
    fn worktree_remove(&self, repo_path: &Path, worktree_path: &Path, force: bool) -> Result<(), OrchestratorError>;
    fn branch_exists(&self, repo_path: &Path, branch: &str, remote: &str) -> bool;
    fn current_branch(&self, repo_path: &Path) -> Option<String>;
    fn default_branch(&self, repo_path: &Path, remote: &str) -> Option<String>;
    fn fetch(&self, repo_path: &Path, remote: &str) -> Result<(), OrchestratorError>;
    fn is_clean(&self, repo_path: &Path) -> bool;
    fn is_git_repository(&self, path: &Path) -> bool;
    fn origin_url(&self, repo_path: &Path) -> Option<String>;
}

/// Shells out to the `git` binary found on `PATH`.
pub struct RealGitDriver;

impl RealGitDriver {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, repo_path: &Path, args: &[&str]) -> Result<String, String> {
        log::debug!("git -C {} {}", repo_path.display(), args.join(" "));
        let output = Command::new("git")
            .arg("-C")
            .arg(repo_path)
            .args(args)
            .output()
            .map_err(|e| format!("failed to spawn git: {e}"))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }

    fn run_bare(&self, args: &[&str]) -> Result<String, String> {
        log::debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .output()
            .map_err(|e| format!("failed to spawn git: {e}"))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

impl Default for RealGitDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive substring match for "this branch/ref does not exist"
/// responses from `git`, used by the workspace engine to distinguish
/// "branch missing on this member" from a genuine failure.
pub fn is_branch_not_found_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    const PATTERNS: &[&str] = &[
        "not found",
        "does not exist",
        "not found on remote",
        "could not resolve",
        "invalid reference",
        "no such ref",
    ];
    PATTERNS.iter().any(|p| lower.contains(p)) || (lower.contains("fatal:") && lower.contains("branch"))
}

impl GitDriver for RealGitDriver {
    fn clone_repository(&self, url: &str, target: &Path, recursive: bool) -> Result<(), OrchestratorError> {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OrchestratorError::FailedToCloneRepository {
                url: url.to_string(),
                reason: format!("failed to create parent directories: {e}"),
            })?;
        }
        let target_str = target.to_string_lossy().into_owned();
        let mut args = vec!["clone"];
        if recursive {
            args.push("--recursive");
        }
        args.push(url);
        args.push(&target_str);
        self.run_bare(&args).map(|_| ()).map_err(|reason| OrchestratorError::FailedToCloneRepository {
            url: url.to_string(),
            reason,
        })
    }

    fn worktree_add(&self, repo_path: &Path, worktree_path: &Path, branch: &str, remote: &str) -> Result<(), OrchestratorError> {
        let worktree_str = worktree_path.to_string_lossy().into_owned();
        let has_local = self.branch_exists(repo_path, branch, "");
        let result = if has_local {
            self.run(repo_path, &["worktree", "add", &worktree_str, branch])
        } else if self.branch_exists(repo_path, branch, remote) {
            let tracking = format!("{remote}/{branch}");
            self.run(repo_path, &["worktree", "add", "-b", branch, &worktree_str, &tracking])
        } else {
            self.run(repo_path, &["worktree", "add", "-b", branch, &worktree_str])
        };
        result.map(|_| ()).map_err(|reason| {
            if reason.to_lowercase().contains("already exists") {
                OrchestratorError::WorktreeExists { branch: branch.to_string() }
            } else {
                OrchestratorError::other(format!("failed to add worktree for '{branch}': {reason}"))
            }
        })
    }

    fn worktree_remove(&self, repo_path: &Path, worktree_path: &Path, force: bool) -> Result<(), OrchestratorError> {
        let worktree_str = worktree_path.to_string_lossy().into_owned();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&worktree_str);
        match self.run(repo_path, &args) {
            Ok(_) => Ok(()),
            Err(e) if !force && e.to_lowercase().contains("submodules cannot be moved or removed") => {
                log::debug!("retrying worktree removal with --force due to submodules");
                self.run(repo_path, &["worktree", "remove", "--force", &worktree_str])
                    .map(|_| ())
                    .map_err(|reason| OrchestratorError::other(format!("failed to remove worktree: {reason}")))
            }
            Err(reason) => Err(OrchestratorError::other(format!("failed to remove worktree: {reason}"))),
        }
    }

    fn branch_exists(&self, repo_path: &Path, branch: &str, remote: &str) -> bool {
        let ref_name = if remote.is_empty() {
            format!("refs/heads/{branch}")
        } else {
            format!("refs/remotes/{remote}/{branch}")
        };
        self.run(repo_path, &["show-ref", "--verify", "--quiet", &ref_name]).is_ok()
    }

    fn current_branch(&self, repo_path: &Path) -> Option<String> {
        self.run(repo_path, &["rev-parse", "--abbrev-ref", "HEAD"])
            .ok()
            .filter(|b| b != "HEAD")
    }

    fn default_branch(&self, repo_path: &Path, remote: &str) -> Option<String> {
        let head_ref = format!("refs/remotes/{remote}/HEAD");
        if let Ok(full) = self.run(repo_path, &["symbolic-ref", &head_ref]) {
            if let Some(branch) = full.strip_prefix(&format!("refs/remotes/{remote}/")) {
                return Some(branch.to_string());
            }
        }
        self.current_branch(repo_path)
    }

    fn fetch(&self, repo_path: &Path, remote: &str) -> Result<(), OrchestratorError> {
        self.run(repo_path, &["fetch", remote])
            .map(|_| ())
            .map_err(|reason| OrchestratorError::other(format!("failed to fetch '{remote}': {reason}")))
    }

    fn is_clean(&self, repo_path: &Path) -> bool {
        self.run(repo_path, &["status", "--porcelain"]).is_ok_and(|out| out.is_empty())
    }

    fn is_git_repository(&self, path: &Path) -> bool {
        self.run(path, &["rev-parse", "--git-dir"]).is_ok()
    }

    fn origin_url(&self, repo_path: &Path) -> Option<String> {
        self.run(repo_path, &["remote", "get-url", "origin"]).ok()
    }
}

/// Compute the main repository path (not a linked worktree) from any path
/// known to be inside the repository, by asking Git for its common dir.
pub fn resolve_main_repo_path(repo_path: &Path) -> PathBuf {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .args(["rev-parse", "--path-format=absolute", "--git-common-dir"])
        .output();
    match output {
        Ok(out) if out.status.success() => {
            let common = String::from_utf8_lossy(&out.stdout).trim().to_string();
            let common_path = PathBuf::from(common);
            common_path.parent().map(Path::to_path_buf).unwrap_or_else(|| repo_path.to_path_buf())
        }
        _ => repo_path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_not_found_patterns_match_case_insensitively() {
        assert!(is_branch_not_found_error("fatal: Remote branch FOO not found"));
        assert!(is_branch_not_found_error("pathspec 'x' does not exist"));
        assert!(is_branch_not_found_error("could not resolve ref"));
        assert!(is_branch_not_found_error("invalid reference: x"));
        assert!(is_branch_not_found_error("fatal: branch not tracked"));
        assert!(!is_branch_not_found_error("worktree already exists"));
    }
}
