//! `clap` CLI surface: one subcommand per operation, each building an
//! [`OperationOptions`] and calling into the [`Orchestrator`].

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::orchestrator::{OperationOptions, Orchestrator};

#[derive(Parser, Debug)]
#[command(name = "flt", version, about = "Fan-out worktree and workspace orchestrator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Set up repositories_dir, workspaces_dir and the status file.
    Init {
        #[arg(long)]
        repositories_dir: Option<PathBuf>,
        #[arg(long)]
        workspaces_dir: Option<PathBuf>,
        #[arg(long)]
        status_file: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
    /// Explicitly clone a repository into the managed repositories directory.
    Clone {
        url: String,
        #[arg(long)]
        recursive: bool,
    },
    #[command(subcommand)]
    Worktree(WorktreeCommand),
    #[command(subcommand)]
    Repository(RepositoryCommand),
    #[command(subcommand)]
    Workspace(WorkspaceCommand),
}

#[derive(Subcommand, Debug)]
pub enum WorktreeCommand {
    /// Create a worktree for a branch.
    Create {
        branch: Option<String>,
        #[arg(long)]
        issue: Option<String>,
        #[arg(long)]
        remote: Option<String>,
        #[arg(long)]
        force: bool,
        #[arg(long)]
        workspace: Option<String>,
        #[arg(long)]
        repository: Option<String>,
        #[arg(long)]
        ide: Option<String>,
    },
    /// Load (create if needed, otherwise reuse) a worktree for `[remote:]branch`.
    Load {
        spec: String,
        #[arg(long)]
        repository: Option<String>,
    },
    /// Delete one or more worktrees by branch name.
    Delete {
        branches: Vec<String>,
        #[arg(long)]
        force: bool,
        #[arg(long)]
        workspace: Option<String>,
        #[arg(long)]
        repository: Option<String>,
    },
    /// Delete every worktree of the target.
    DeleteAll {
        #[arg(long)]
        force: bool,
        #[arg(long)]
        workspace: Option<String>,
        #[arg(long)]
        repository: Option<String>,
    },
    /// Open a worktree (or workspace editor file) in the configured editor.
    Open {
        branch: Option<String>,
        #[arg(long)]
        workspace: Option<String>,
        #[arg(long)]
        repository: Option<String>,
    },
    /// List worktrees for a repository or workspace.
    List {
        #[arg(long)]
        workspace: Option<String>,
        #[arg(long)]
        repository: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RepositoryCommand {
    /// List adopted repositories.
    List,
    /// Delete a repository (must not be a workspace member).
    Delete {
        repository: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommand {
    /// Create a workspace from one or more repositories.
    Create { name: String, repositories: Vec<String> },
    /// Delete a workspace.
    Delete {
        name: String,
        #[arg(long)]
        force: bool,
    },
    /// List workspaces.
    List,
    /// Add a repository to an existing workspace.
    Add {
        #[arg(long)]
        workspace: Option<String>,
        #[arg(long)]
        repository: Option<String>,
    },
    /// Remove a repository from a workspace (worktrees on disk are untouched).
    Remove {
        #[arg(long)]
        workspace: Option<String>,
        #[arg(long)]
        repository: Option<String>,
    },
}

/// Dispatch a parsed [`Cli`] into the [`Orchestrator`], printing results.
pub fn run(cli: Cli, orchestrator: &Orchestrator) -> Result<(), crate::error::OrchestratorError> {
    match cli.command {
        Command::Init { repositories_dir, workspaces_dir, status_file, force } => {
            let defaults = crate::config::Config::default_paths();
            orchestrator.init(
                &OperationOptions { force, ..Default::default() },
                repositories_dir.unwrap_or(defaults.repositories_dir),
                workspaces_dir.unwrap_or(defaults.workspaces_dir),
                status_file.unwrap_or(defaults.status_file),
            )?;
            println!("fleet initialized");
        }
        Command::Clone { url, recursive } => {
            let path = orchestrator.clone(&OperationOptions { url: Some(url), recursive, ..Default::default() })?;
            println!("{}", crate::path::format_path_for_display(&path));
        }
        Command::Worktree(cmd) => run_worktree(cmd, orchestrator)?,
        Command::Repository(cmd) => run_repository(cmd, orchestrator)?,
        Command::Workspace(cmd) => run_workspace(cmd, orchestrator)?,
    }
    Ok(())
}

fn run_worktree(cmd: WorktreeCommand, orchestrator: &Orchestrator) -> Result<(), crate::error::OrchestratorError> {
    match cmd {
        WorktreeCommand::Create { branch, issue, remote, force, workspace, repository, ide } => {
            let path = orchestrator.create_worktree(&OperationOptions {
                branch,
                issue_ref: issue,
                remote,
                force,
                workspace_name: workspace,
                repository_name: repository,
                ide_name: ide,
                ..Default::default()
            })?;
            println!("{}", crate::path::format_path_for_display(&path));
        }
        WorktreeCommand::Load { spec, repository } => {
            let path = orchestrator.load_worktree(&OperationOptions { repository_name: repository, ..Default::default() }, &spec)?;
            println!("{}", crate::path::format_path_for_display(&path));
        }
        WorktreeCommand::Delete { branches, force, workspace, repository } => {
            orchestrator.delete_worktrees(&OperationOptions {
                branches,
                force,
                workspace_name: workspace,
                repository_name: repository,
                ..Default::default()
            })?;
        }
        WorktreeCommand::DeleteAll { force, workspace, repository } => {
            orchestrator.delete_worktrees(&OperationOptions {
                force,
                workspace_name: workspace,
                repository_name: repository,
                ..Default::default()
            })?;
        }
        WorktreeCommand::Open { branch, workspace, repository } => {
            orchestrator.open_worktree(&OperationOptions {
                branch,
                workspace_name: workspace,
                repository_name: repository,
                ..Default::default()
            })?;
        }
        WorktreeCommand::List { workspace, repository } => {
            let branches = orchestrator.list_worktrees(&OperationOptions {
                workspace_name: workspace,
                repository_name: repository,
                ..Default::default()
            })?;
            for branch in branches {
                println!("{branch}");
            }
        }
    }
    Ok(())
}

fn run_repository(cmd: RepositoryCommand, orchestrator: &Orchestrator) -> Result<(), crate::error::OrchestratorError> {
    match cmd {
        RepositoryCommand::List => {
            for repo in orchestrator.list_repositories()? {
                println!("{repo}");
            }
        }
        RepositoryCommand::Delete { repository, force } => {
            orchestrator.delete_repository(&OperationOptions { repository_name: Some(repository), force, ..Default::default() })?;
        }
    }
    Ok(())
}

fn run_workspace(cmd: WorkspaceCommand, orchestrator: &Orchestrator) -> Result<(), crate::error::OrchestratorError> {
    match cmd {
        WorkspaceCommand::Create { name, repositories } => {
            orchestrator.create_workspace(&OperationOptions { workspace_name: Some(name), repositories, ..Default::default() })?;
        }
        WorkspaceCommand::Delete { name, force } => {
            orchestrator.delete_workspace(&OperationOptions { workspace_name: Some(name), force, ..Default::default() })?;
        }
        WorkspaceCommand::List => {
            for workspace in orchestrator.list_workspaces()? {
                println!("{workspace}");
            }
        }
        WorkspaceCommand::Add { workspace, repository } => {
            orchestrator.add_repository_to_workspace(&OperationOptions {
                workspace_name: workspace,
                repository_name: repository,
                ..Default::default()
            })?;
        }
        WorkspaceCommand::Remove { workspace, repository } => {
            orchestrator.remove_repository_from_workspace(&OperationOptions {
                workspace_name: workspace,
                repository_name: repository,
                ..Default::default()
            })?;
        }
    }
    Ok(())
}
