//! URL & path normalizer (C1).
//!
//! Canonical identifiers for repositories, and the path construction rules
//! that derive worktree directories and sanitized branch components from
//! them.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::OrchestratorError;

/// Normalize a Git remote URL (any of the SSH short form, `ssh://`, or
/// `https://` forms) to its canonical `host/path` identity.
///
/// - Strips a trailing `.git`.
/// - Anything with a `scheme://` prefix (`https://`, `ssh://`, ...) is parsed
///   as a URL and returned as `host/path` with the leading slash trimmed.
/// - `user@host:owner/repo` (contains `@` and `:`, no `scheme://` prefix) is
///   treated as SSH shorthand and returned as `host/owner/repo`.
/// - Anything else fails with [`OrchestratorError::UnsupportedRepositoryUrlFormat`].
///
/// Callers pass raw remote URLs here, never this function's own `host/path`
/// output — a normalized string isn't itself a recognized input form.
pub fn normalize_url(raw: &str) -> Result<String, OrchestratorError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(OrchestratorError::RepositoryUrlEmpty);
    }

    let without_git_suffix = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    if without_git_suffix.contains("://") {
        return normalize_url_form(without_git_suffix);
    }

    if without_git_suffix.contains('@') && without_git_suffix.contains(':') {
        return normalize_ssh_shorthand(without_git_suffix);
    }

    Err(OrchestratorError::UnsupportedRepositoryUrlFormat {
        url: raw.to_string(),
    })
}

fn normalize_ssh_shorthand(value: &str) -> Result<String, OrchestratorError> {
    // user@host:owner/repo -> host/owner/repo
    let after_at = value.split_once('@').map(|(_, rest)| rest).unwrap_or(value);
    let (host, path) = after_at.split_once(':').ok_or_else(|| {
        OrchestratorError::UnsupportedRepositoryUrlFormat {
            url: value.to_string(),
        }
    })?;
    if host.is_empty() || path.is_empty() {
        return Err(OrchestratorError::UnsupportedRepositoryUrlFormat {
            url: value.to_string(),
        });
    }
    Ok(format!("{host}/{}", path.trim_start_matches('/')))
}

fn normalize_url_form(value: &str) -> Result<String, OrchestratorError> {
    let parsed = url::Url::parse(value).map_err(|_| OrchestratorError::UnsupportedRepositoryUrlFormat {
        url: value.to_string(),
    })?;
    let host = parsed
        .host_str()
        .ok_or_else(|| OrchestratorError::UnsupportedRepositoryUrlFormat {
            url: value.to_string(),
        })?;
    let path = parsed.path().trim_start_matches('/');
    if path.is_empty() {
        return Err(OrchestratorError::UnsupportedRepositoryUrlFormat {
            url: value.to_string(),
        });
    }
    Ok(format!("{host}/{path}"))
}

/// Build the on-disk worktree path for `<repositories_dir>/<url>/<remote>/<branch>`.
///
/// Pure function of its inputs: same `(repositories_dir, url, remote, branch)`
/// always produces the same path.
pub fn build_worktree_path(repositories_dir: &std::path::Path, url: &str, remote: &str, branch: &str) -> PathBuf {
    repositories_dir.join(url).join(remote).join(branch)
}

/// As [`build_worktree_path`], but falls back to `~/Code/repos/<url>/<remote>/<branch>`
/// when the configuration cannot be loaded (e.g. before `flt init` has run).
pub fn build_worktree_path_with_config(config: Option<&Config>, url: &str, remote: &str, branch: &str) -> PathBuf {
    match config {
        Some(config) => build_worktree_path(&config.repositories_dir, url, remote, branch),
        None => {
            let fallback = home::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Code")
                .join("repos");
            build_worktree_path(&fallback, url, remote, branch)
        }
    }
}

/// Sanitize a branch name for use as a single filesystem path component
/// (editor workspace file names): replace `/` with `-`.
pub fn sanitize_branch_for_filename(branch: &str) -> String {
    branch.replace('/', "-")
}

/// Sanitize a branch name for use as a Git ref.
///
/// Deterministic but implementation-defined per spec: replaces whitespace
/// runs with `-`, strips characters Git forbids in refs, collapses repeated
/// dashes, and trims leading/trailing `/` and `.`.
///
/// When `branch` is empty and `issue_ref` is non-empty, sanitization is
/// bypassed entirely — the caller is expected to derive the branch name from
/// the issue reference via a [`crate::forge::ForgeAdapter`] instead.
pub fn sanitize_branch_for_git(branch: &str, issue_ref: Option<&str>) -> String {
    if branch.is_empty() && issue_ref.is_some_and(|issue| !issue.is_empty()) {
        return String::new();
    }

    let mut out = String::with_capacity(branch.len());
    let mut last_was_dash = false;
    for ch in branch.trim().chars() {
        let replaced = if ch.is_whitespace() {
            Some('-')
        } else if "~^:?*[\\".contains(ch) {
            None
        } else {
            Some(ch)
        };
        match replaced {
            Some('-') => {
                if !last_was_dash {
                    out.push('-');
                }
                last_was_dash = true;
            }
            Some(c) => {
                out.push(c);
                last_was_dash = false;
            }
            None => {}
        }
    }

    let trimmed = out.trim_matches(|c| c == '/' || c == '.' || c == '-');
    trimmed.replace("..", ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_https_with_git_suffix() {
        assert_eq!(
            normalize_url("https://github.com/octocat/Hello-World.git").unwrap(),
            "github.com/octocat/Hello-World"
        );
    }

    #[test]
    fn normalizes_ssh_shorthand() {
        assert_eq!(
            normalize_url("git@github.com:octocat/Hello-World.git").unwrap(),
            "github.com/octocat/Hello-World"
        );
    }

    #[test]
    fn normalizes_ssh_url_form() {
        assert_eq!(
            normalize_url("ssh://git@github.com/octocat/Hello-World.git").unwrap(),
            "github.com/octocat/Hello-World"
        );
    }

    #[test]
    fn all_three_forms_agree() {
        let https = normalize_url("https://github.com/octocat/Hello-World.git").unwrap();
        let ssh_shorthand = normalize_url("git@github.com:octocat/Hello-World").unwrap();
        let ssh_url = normalize_url("ssh://git@github.com/octocat/Hello-World.git").unwrap();
        assert_eq!(https, ssh_shorthand);
        assert_eq!(ssh_shorthand, ssh_url);
    }

    #[test]
    fn empty_url_fails() {
        assert!(matches!(
            normalize_url("").unwrap_err(),
            OrchestratorError::RepositoryUrlEmpty
        ));
    }

    #[test]
    fn garbage_url_fails_unsupported_format() {
        assert!(matches!(
            normalize_url("not a url").unwrap_err(),
            OrchestratorError::UnsupportedRepositoryUrlFormat { .. }
        ));
    }

    #[test]
    fn build_worktree_path_is_deterministic() {
        let base = std::path::Path::new("/code/repos");
        let a = build_worktree_path(base, "github.com/o/r", "origin", "main");
        let b = build_worktree_path(base, "github.com/o/r", "origin", "main");
        assert_eq!(a, b);
        assert_eq!(a, std::path::PathBuf::from("/code/repos/github.com/o/r/origin/main"));
    }

    #[test]
    fn sanitize_branch_for_filename_replaces_slashes() {
        assert_eq!(sanitize_branch_for_filename("feature/foo"), "feature-foo");
    }

    #[test]
    fn sanitize_branch_for_git_bypassed_for_issue_ref() {
        assert_eq!(sanitize_branch_for_git("", Some("JIRA-1")), "");
    }

    #[test]
    fn sanitize_branch_for_git_strips_forbidden_chars() {
        assert_eq!(sanitize_branch_for_git("feature: fix?", None), "feature-fix");
    }
}
