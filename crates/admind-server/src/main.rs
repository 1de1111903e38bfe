// admind Server
//
// Daemon binary wiring the managed job subsystem: configuration, logging,
// durable store, command registry, startup recovery and the retention
// scheduler. Command invocations reach the manager through the RPC/CLI
// layer, which is deployed separately.

mod config;
mod logging;

use admind_core::commands::{register_samples, CommandRegistry};
use admind_core::{JobManagerService, RetentionScheduler};
use admind_store::{JsonFileBackend, StorageBackend};
use anyhow::Result;
use log::info;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = match config::ServerConfig::from_file("config.toml") {
        Ok(cfg) => cfg,
        Err(_) => {
            eprintln!("Warning: config.toml not found, using defaults");
            config::ServerConfig::default()
        }
    };
    config.validate()?;

    // Initialize logging
    logging::init_logging(
        &config.logging.level,
        &config.logging.file_path,
        config.logging.log_to_console,
        &config.logging.format,
    )?;

    info!("Starting admind v{}", env!("CARGO_PKG_VERSION"));

    // Open the durable job store
    std::fs::create_dir_all(&config.storage.data_path)?;
    let jobs_file = Path::new(&config.storage.data_path).join("jobs.json");
    let backend: Arc<dyn StorageBackend> = Arc::new(JsonFileBackend::open(&jobs_file)?);
    info!("Job store opened at {}", jobs_file.display());

    // Command registry, resolved once at startup
    let mut registry = CommandRegistry::new();
    register_samples(&mut registry);
    info!("Registered commands: {}", registry.names().join(", "));

    // Job manager + startup reconciliation
    let manager = Arc::new(JobManagerService::new(backend, Arc::new(registry)));
    manager.configure_retention(config.managed_jobs.policy());
    let recovered = manager.recover_interrupted()?;
    if recovered > 0 {
        info!("Recovered {} interrupted jobs", recovered);
    }

    // Background retention sweeps
    let scheduler = RetentionScheduler::spawn(Arc::clone(&manager));

    info!("admind ready");
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received");
    scheduler.abort();
    info!("Server shutdown complete");
    Ok(())
}
