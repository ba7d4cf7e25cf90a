//! Status command handlers

use anyhow::Result;

use lectio_core::Config;

use crate::engine::Engine;
use crate::output::{Output, OutputFormat};

/// Show engine and catalog status
pub async fn show(engine: &Engine, output: &Output) -> Result<()> {
    let engine_status = engine.integration.get_status();
    let stats = engine.content.get_stats().await?;
    let sync_status = engine.sync.get_status();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "overall": engine_status.overall,
                    "services": engine_status.services,
                    "catalog": stats,
                    "sync": sync_status,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{:?}", engine_status.overall);
        }
        OutputFormat::Human => {
            println!("Lectio Status");
            println!("=============");
            println!();
            println!("Overall: {:?}", engine_status.overall);
            println!();
            println!("Services:");
            for service in &engine_status.services {
                let state = if service.ready { "ready" } else { "down" };
                match &service.last_error {
                    Some(error) => println!("  {:14} {} ({})", service.name, state, error),
                    None => println!("  {:14} {}", service.name, state),
                }
            }
            println!();
            println!("Storage:");
            println!("  Location: {}", engine.config.data_dir.display());
            println!();
            println!("Contents:");
            println!("  Readings:  {}", stats.total_readings);
            println!("  Favorites: {}", stats.total_favorites);
            println!();
            println!("Sync:");
            println!("  State:  {:?}", sync_status.state);
            println!("  Queued: {}", sync_status.queue_len);
        }
    }
    Ok(())
}

/// Show configuration without opening the store
pub fn show_config(output: &Output) -> Result<()> {
    let config = Config::load()?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "sync_enabled": config.sync_enabled,
                    "sync_interval_secs": config.sync_interval_secs,
                    "database": config.sqlite_path(),
                    "backups": config.backups_dir(),
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration");
            println!("=============");
            println!("Data dir:      {}", config.data_dir.display());
            println!("Database:      {}", config.sqlite_path().display());
            println!("Backups:       {}", config.backups_dir().display());
            println!(
                "Sync:          {}",
                if config.sync_enabled { "enabled" } else { "disabled" }
            );
            println!("Sync interval: {}s", config.sync_interval_secs);
        }
    }
    Ok(())
}
