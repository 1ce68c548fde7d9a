use std::process;
use std::sync::Arc;

use clap::Parser;

use fleet::cli::{self, Cli};
use fleet::config::{Config, ConfigManager, TomlConfigManager};
use fleet::editor::CommandEditorLauncher;
use fleet::forge::PatternForgeAdapter;
use fleet::fs_driver::RealFsDriver;
use fleet::git_driver::RealGitDriver;
use fleet::hooks::{ConfigHookManager, HookManager, NullHookManager};
use fleet::orchestrator::Orchestrator;
use fleet::prompt::InquirePrompter;
use fleet::status::YamlStatusStore;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let orchestrator = build_orchestrator();

    if let Err(e) = cli::run(cli, &orchestrator) {
        eprintln!("{}", e.styled());
        process::exit(1);
    }
}

/// Wire the real collaborators together.
/// The hook manager is chosen per-invocation: a `ConfigHookManager` when the
/// current directory carries `.fleet/hooks.toml`, [`NullHookManager`]
/// otherwise.
fn build_orchestrator() -> Orchestrator {
    let config_manager = Arc::new(TomlConfigManager::new());
    let status_store = config_manager
        .load()
        .map(|config: Config| Arc::new(YamlStatusStore::new(config.status_file)) as Arc<dyn fleet::status::StatusStore>)
        .unwrap_or_else(|_| Arc::new(YamlStatusStore::new(std::env::temp_dir().join("fleet-status.yaml"))));

    let hooks: Arc<dyn HookManager> = std::env::current_dir()
        .ok()
        .and_then(|cwd| ConfigHookManager::load(&cwd).ok())
        .map(|manager| Arc::new(manager) as Arc<dyn HookManager>)
        .unwrap_or_else(|| Arc::new(NullHookManager));

    Orchestrator::new(
        config_manager,
        status_store,
        Arc::new(RealGitDriver::new()),
        Arc::new(RealFsDriver::new()),
        Arc::new(InquirePrompter::new()),
        hooks,
        Arc::new(PatternForgeAdapter),
        Arc::new(CommandEditorLauncher::new()),
    )
}
