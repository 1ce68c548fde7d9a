//! Stable error taxonomy for the orchestration layer.
//!
//! Every error the orchestrator can surface is a variant of [`OrchestratorError`].
//! Higher layers (the hook pipeline, the CLI) compare errors only by [`StableKind`],
//! never by message text, so the user-facing wording here can change freely.

use std::path::PathBuf;

use crate::styling::{ERROR, ERROR_BOLD, ERROR_EMOJI, HINT, HINT_EMOJI};

/// Stable, matchable identifier for an [`OrchestratorError`] variant.
///
/// A stable, closed error taxonomy; tests assert on this rather
/// than on `to_string()` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StableKind {
    GitRepositoryNotFound,
    GitRepositoryInvalid,
    RepositoryUrlEmpty,
    OriginRemoteNotFound,
    OriginRemoteInvalidUrl,
    UnsupportedRepositoryUrlFormat,
    WorktreeExists,
    WorktreeNotInStatus,
    RepositoryNotClean,
    DirectoryExists,
    BranchNameContainsColon,
    ArgumentEmpty,
    FailedToDetectDefaultBranch,
    FailedToCloneRepository,
    FailedToInitializeRepository,
    NoGitRepositoryOrWorkspaceFound,
    WorkspaceModeNotSupportedForLoad,
    InvalidWorkspaceName,
    WorkspaceAlreadyExists,
    WorkspaceNotFound,
    RepositoryNotFound,
    InvalidRepository,
    DuplicateRepository,
    StatusUpdateFailure,
    RepositoryAdditionFailure,
    PathResolutionFailure,
    NotInitialized,
    FailedToExpandRepositoriesDir,
    DeletionCancelled,
    ConflictingTargets,
    RepositoryExists,
    BatchOperationFailed,
    Panic,
    Other,
}

/// Domain errors produced by the orchestration layer.
///
/// Each variant stores the data needed to render a user-facing message. The
/// [`kind`](OrchestratorError::kind) method recovers the stable identifier
/// so callers can match without depending on wording.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OrchestratorError {
    #[error("repository not found at '{path}'")]
    GitRepositoryNotFound { path: String },

    #[error("'{path}' is not a valid git repository")]
    GitRepositoryInvalid { path: String },

    #[error("repository URL is empty")]
    RepositoryUrlEmpty,

    #[error("no origin remote configured for '{path}'")]
    OriginRemoteNotFound { path: String },

    #[error("origin remote URL for '{path}' could not be parsed")]
    OriginRemoteInvalidUrl { path: String },

    #[error("unsupported repository URL format: '{url}'")]
    UnsupportedRepositoryUrlFormat { url: String },

    #[error("worktree for branch '{branch}' already exists")]
    WorktreeExists { branch: String },

    #[error("worktree for branch '{branch}' is not recorded in the status document")]
    WorktreeNotInStatus { branch: String },

    #[error("repository '{repository}' has uncommitted changes")]
    RepositoryNotClean { repository: String },

    #[error("directory already exists: {}", path.display())]
    DirectoryExists { path: PathBuf },

    #[error("branch name '{branch}' contains a colon")]
    BranchNameContainsColon { branch: String },

    #[error("argument '{name}' must not be empty")]
    ArgumentEmpty { name: String },

    #[error("failed to detect default branch for '{repository}'")]
    FailedToDetectDefaultBranch { repository: String },

    #[error("failed to clone '{url}': {reason}")]
    FailedToCloneRepository { url: String, reason: String },

    #[error("failed to initialize repository at '{}': {reason}", path.display())]
    FailedToInitializeRepository { path: PathBuf, reason: String },

    #[error("no git repository or workspace found")]
    NoGitRepositoryOrWorkspaceFound,

    #[error("workspace mode is not supported for load-worktree")]
    WorkspaceModeNotSupportedForLoad,

    #[error("invalid workspace name '{name}'")]
    InvalidWorkspaceName { name: String },

    #[error("workspace '{name}' already exists")]
    WorkspaceAlreadyExists { name: String },

    #[error("workspace '{name}' not found")]
    WorkspaceNotFound { name: String },

    #[error("repository '{repository}' not found")]
    RepositoryNotFound { repository: String },

    #[error("'{path}' is not a valid repository reference")]
    InvalidRepository { path: String },

    #[error("repository '{repository}' is already a member of the workspace")]
    DuplicateRepository { repository: String },

    #[error("failed to update status document: {reason}")]
    StatusUpdateFailure { reason: String },

    #[error("failed to add repository '{repository}' to workspace '{workspace}': {reason}")]
    RepositoryAdditionFailure {
        repository: String,
        workspace: String,
        reason: String,
    },

    #[error("could not resolve path for '{identifier}'")]
    PathResolutionFailure { identifier: String },

    #[error("fleet has not been initialized; run 'flt init' first")]
    NotInitialized,

    #[error("failed to expand repositories directory: {reason}")]
    FailedToExpandRepositoriesDir { reason: String },

    #[error("deletion cancelled")]
    DeletionCancelled,

    #[error("both a workspace and a repository were specified; pass only one")]
    ConflictingTargets,

    #[error("repository '{url}' already exists")]
    RepositoryExists { url: String },

    /// Batch worktree deletion: some or all targets failed.
    #[error("{message}")]
    BatchOperationFailed { message: String, failed: Vec<String> },

    #[error("panic in {operation}: {payload}")]
    Panic { operation: String, payload: String },

    #[error("{message}")]
    Other { message: String },
}

impl OrchestratorError {
    pub fn kind(&self) -> StableKind {
        use OrchestratorError::*;
        match self {
            GitRepositoryNotFound { .. } => StableKind::GitRepositoryNotFound,
            GitRepositoryInvalid { .. } => StableKind::GitRepositoryInvalid,
            RepositoryUrlEmpty => StableKind::RepositoryUrlEmpty,
            OriginRemoteNotFound { .. } => StableKind::OriginRemoteNotFound,
            OriginRemoteInvalidUrl { .. } => StableKind::OriginRemoteInvalidUrl,
            UnsupportedRepositoryUrlFormat { .. } => StableKind::UnsupportedRepositoryUrlFormat,
            WorktreeExists { .. } => StableKind::WorktreeExists,
            WorktreeNotInStatus { .. } => StableKind::WorktreeNotInStatus,
            RepositoryNotClean { .. } => StableKind::RepositoryNotClean,
            DirectoryExists { .. } => StableKind::DirectoryExists,
            BranchNameContainsColon { .. } => StableKind::BranchNameContainsColon,
            ArgumentEmpty { .. } => StableKind::ArgumentEmpty,
            FailedToDetectDefaultBranch { .. } => StableKind::FailedToDetectDefaultBranch,
            FailedToCloneRepository { .. } => StableKind::FailedToCloneRepository,
            FailedToInitializeRepository { .. } => StableKind::FailedToInitializeRepository,
            NoGitRepositoryOrWorkspaceFound => StableKind::NoGitRepositoryOrWorkspaceFound,
            WorkspaceModeNotSupportedForLoad => StableKind::WorkspaceModeNotSupportedForLoad,
            InvalidWorkspaceName { .. } => StableKind::InvalidWorkspaceName,
            WorkspaceAlreadyExists { .. } => StableKind::WorkspaceAlreadyExists,
            WorkspaceNotFound { .. } => StableKind::WorkspaceNotFound,
            RepositoryNotFound { .. } => StableKind::RepositoryNotFound,
            InvalidRepository { .. } => StableKind::InvalidRepository,
            DuplicateRepository { .. } => StableKind::DuplicateRepository,
            StatusUpdateFailure { .. } => StableKind::StatusUpdateFailure,
            RepositoryAdditionFailure { .. } => StableKind::RepositoryAdditionFailure,
            PathResolutionFailure { .. } => StableKind::PathResolutionFailure,
            NotInitialized => StableKind::NotInitialized,
            FailedToExpandRepositoriesDir { .. } => StableKind::FailedToExpandRepositoriesDir,
            DeletionCancelled => StableKind::DeletionCancelled,
            ConflictingTargets => StableKind::ConflictingTargets,
            RepositoryExists { .. } => StableKind::RepositoryExists,
            BatchOperationFailed { .. } => StableKind::BatchOperationFailed,
            Panic { .. } => StableKind::Panic,
            Other { .. } => StableKind::Other,
        }
    }

    /// Styled, human-readable rendering for CLI output (no stack traces).
    pub fn styled(&self) -> String {
        let hint = self.hint();
        let header = format!("{ERROR_EMOJI} {ERROR}{self}{ERROR:#}");
        match hint {
            Some(hint) => format!("{header}\n\n{HINT_EMOJI} {HINT}{hint}{HINT:#}"),
            None => header,
        }
    }

    fn hint(&self) -> Option<String> {
        use OrchestratorError::*;
        match self {
            NotInitialized => Some("Run 'flt init' to set up repositories_dir, workspaces_dir and the status file".into()),
            RepositoryNotClean { .. } => Some("Commit or stash changes first, or pass --force".into()),
            WorktreeExists { branch } => Some(format!("Use 'flt worktree load {branch}' to reuse it")),
            DuplicateRepository { .. } => Some("Remove the repository first if you want to re-add it".into()),
            ConflictingTargets => Some("Pass either --workspace or --repository, not both".into()),
            _ => None,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        OrchestratorError::Other { message: message.into() }
    }
}

/// Renders `<ERROR_BOLD>text<ERROR_BOLD:#>` inline emphasis for the occasional
/// error message that wants to bold a single token (branch, path, name).
pub fn bold(text: &str) -> String {
    format!("{ERROR_BOLD}{text}{ERROR_BOLD:#}")
}
