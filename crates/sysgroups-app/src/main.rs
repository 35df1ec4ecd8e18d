use std::sync::Arc;

use clap::Parser;
use sysgroups_app::cli::Cli;
use sysgroups_app::command;
use sysgroups_app::telemetry::{apply_log_level, init_tracing};
use sysgroups_core::config::load_config;
use sysgroups_service::{
    Authorizer, CasbinPermissionStore, GroupProviders, MemoryCache, init_system_groups,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter_handle = init_tracing("info");

    let cli = Cli::parse();
    let config = load_config()?;

    tracing::debug!(config = ?config, "Configuration loaded");
    apply_log_level(&filter_handle, &config.logging.level);

    let store = match cli.policy.as_deref().or(config.policy.path.as_deref()) {
        Some(path) => {
            tracing::info!(path, "Loading group policies");
            CasbinPermissionStore::from_file(path).await?
        }
        None => CasbinPermissionStore::in_memory().await?,
    };
    let store = Arc::new(store);

    init_system_groups(store.as_ref(), &config.groups).await?;

    let authz = Authorizer::from_settings(
        &config,
        store.clone(),
        Arc::new(MemoryCache::new()),
        GroupProviders::new(),
    );

    let output = command::run(&cli.command, &authz, &store).await?;
    if !output.is_empty() {
        println!("{output}");
    }

    Ok(())
}
