//! Forge adapter: resolves an issue reference to a branch name.

use crate::error::OrchestratorError;
use crate::url::sanitize_branch_for_git;

pub trait ForgeAdapter: Send + Sync {
    fn resolve_issue_branch(&self, issue_ref: &str) -> Result<String, OrchestratorError>;
}

/// No forge configured: any issue reference fails. `CreateWorkTree` then
/// surfaces `ArgumentEmpty` for an empty branch with no usable issue
/// reference, as specified.
pub struct NullForgeAdapter;

impl ForgeAdapter for NullForgeAdapter {
    fn resolve_issue_branch(&self, issue_ref: &str) -> Result<String, OrchestratorError> {
        Err(OrchestratorError::ArgumentEmpty {
            name: format!("no forge configured to resolve issue reference '{issue_ref}'"),
        })
    }
}

/// Derives `issue/<issue_ref>` deterministically, sanitized for use as a
/// branch name. A reasonable stand-in for a ticket-tracker integration
/// absent network access.
pub struct PatternForgeAdapter;

impl ForgeAdapter for PatternForgeAdapter {
    fn resolve_issue_branch(&self, issue_ref: &str) -> Result<String, OrchestratorError> {
        if issue_ref.trim().is_empty() {
            return Err(OrchestratorError::ArgumentEmpty { name: "issue_ref".to_string() });
        }
        let sanitized = sanitize_branch_for_git(issue_ref, None);
        Ok(format!("issue/{sanitized}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_forge_adapter_always_errors() {
        assert!(NullForgeAdapter.resolve_issue_branch("JIRA-1").is_err());
    }

    #[test]
    fn pattern_forge_adapter_derives_issue_branch() {
        assert_eq!(PatternForgeAdapter.resolve_issue_branch("JIRA-1").unwrap(), "issue/JIRA-1");
    }

    #[test]
    fn pattern_forge_adapter_rejects_empty_issue_ref() {
        assert!(PatternForgeAdapter.resolve_issue_branch("").is_err());
    }
}
