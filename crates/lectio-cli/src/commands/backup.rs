//! Backup command handlers

use anyhow::Result;
use chrono::{Local, TimeZone};

use crate::engine::Engine;
use crate::output::{Output, OutputFormat};

/// Create a named backup
pub async fn create(engine: &Engine, name: String, output: &Output) -> Result<()> {
    let metadata = engine.export.create_backup(&name).await?;
    output.success(&format!(
        "Created backup {} ({} reading(s), {} bytes)",
        metadata.id, metadata.reading_count, metadata.size_bytes
    ));
    if output.is_quiet() {
        println!("{}", metadata.id);
    }
    Ok(())
}

/// List backups, oldest first
pub fn list(engine: &Engine, output: &Output) -> Result<()> {
    let backups = engine.export.list_backups();

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&backups)?);
        }
        OutputFormat::Quiet => {
            for backup in &backups {
                println!("{}", backup.id);
            }
        }
        OutputFormat::Human => {
            if backups.is_empty() {
                println!("No backups.");
                return Ok(());
            }
            for backup in &backups {
                let when = Local
                    .timestamp_millis_opt(backup.created_at)
                    .single()
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| backup.created_at.to_string());
                println!(
                    "{} | {} | {} | {} reading(s)",
                    &backup.id[..12.min(backup.id.len())],
                    when,
                    backup.name,
                    backup.reading_count
                );
            }
            println!("\n{} backup(s)", backups.len());
        }
    }
    Ok(())
}

/// Restore a backup, replacing the catalog
pub async fn restore(engine: &Engine, id: String, output: &Output) -> Result<()> {
    let id = resolve_backup_id(engine, &id)?;
    let report = engine.export.restore_backup(&id).await?;
    output.success(&format!("Restored {} reading(s)", report.imported));
    Ok(())
}

/// Delete a backup
pub fn delete(engine: &Engine, id: String, output: &Output) -> Result<()> {
    let id = resolve_backup_id(engine, &id)?;
    engine.export.delete_backup(&id)?;
    output.success(&format!("Deleted backup {}", id));
    Ok(())
}

/// Resolve a full backup id from a full id or unique prefix
fn resolve_backup_id(engine: &Engine, prefix: &str) -> Result<String> {
    let matches: Vec<String> = engine
        .export
        .list_backups()
        .into_iter()
        .map(|b| b.id)
        .filter(|id| id.starts_with(prefix))
        .collect();

    match matches.len() {
        0 => anyhow::bail!("Backup not found: {}", prefix),
        1 => Ok(matches.into_iter().next().unwrap()),
        n => anyhow::bail!("Ambiguous backup id '{}' ({} matches)", prefix, n),
    }
}
