//! Sync command handlers

use anyhow::{bail, Result};
use chrono::{Local, TimeZone};

use lectio_core::ResolutionPolicy;

use crate::engine::Engine;
use crate::output::{Output, OutputFormat};

/// Run a sync now
pub async fn sync_now(engine: &Engine, output: &Output) -> Result<()> {
    let report = engine.sync.sync_now().await;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.success {
        output.success(&report.message);
    } else {
        output.message(&format!("✗ {}", report.message));
    }
    if report.conflicts_found > 0 {
        output.message(&format!(
            "{} conflict(s) need resolution (lectio sync conflicts)",
            report.conflicts_found
        ));
    }
    Ok(())
}

/// Show sync engine status
pub fn status(engine: &Engine, output: &Output) -> Result<()> {
    let status = engine.sync.get_status();

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        OutputFormat::Quiet => {
            println!("{:?}", status.state);
        }
        OutputFormat::Human => {
            println!("Sync");
            println!("====");
            println!("State:     {:?}", status.state);
            match status.last_sync_time {
                Some(ms) => {
                    let when = Local
                        .timestamp_millis_opt(ms)
                        .single()
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| ms.to_string());
                    println!("Last sync: {}", when);
                }
                None => println!("Last sync: never"),
            }
            println!("Queued:    {}", status.queue_len);
            println!("Conflicts: {}", status.conflict_count);
            if let Some(ref error) = status.last_error {
                println!("Error:     {}", error);
            }
        }
    }
    Ok(())
}

/// List unresolved conflicts
pub fn conflicts(engine: &Engine, output: &Output) -> Result<()> {
    let conflicts = engine.sync.get_conflicts();

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&conflicts)?);
        }
        OutputFormat::Quiet => {
            for conflict in &conflicts {
                println!("{}", conflict.id);
            }
        }
        OutputFormat::Human => {
            if conflicts.is_empty() {
                println!("No conflicts.");
                return Ok(());
            }
            for conflict in &conflicts {
                println!(
                    "{} | {} | {:?} | local {} vs cloud {}",
                    conflict.id,
                    conflict.reading_id,
                    conflict.conflict_type,
                    conflict.local.updated_at,
                    conflict.cloud.updated_at
                );
            }
            println!("\n{} conflict(s)", conflicts.len());
            println!("Resolve with: lectio sync resolve <id> <local|cloud|merge>");
        }
    }
    Ok(())
}

/// Resolve a conflict with an explicit policy
pub async fn resolve(engine: &Engine, id: String, policy: String, output: &Output) -> Result<()> {
    let policy = match policy.as_str() {
        "local" => ResolutionPolicy::Local,
        "cloud" => ResolutionPolicy::Cloud,
        "merge" => ResolutionPolicy::Merge,
        other => bail!("Unknown policy '{}' (expected local, cloud, or merge)", other),
    };

    engine.sync.resolve_conflict(&id, policy).await?;
    output.success(&format!("Resolved conflict {}", id));
    Ok(())
}

/// Run the validate-then-sync workflow
pub async fn workflow(engine: &Engine, output: &Output) -> Result<()> {
    let report = engine.integration.perform_complete_workflow().await?;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output.message(&format!(
        "Validated {} reading(s): {} valid, {} invalid",
        report.validation.total, report.validation.valid_count, report.validation.invalid_count
    ));
    output.message(&format!(
        "Sync: {} synced, {} failed",
        report.sync.items_synced, report.sync.items_failed
    ));
    if report.success {
        output.success("Workflow completed");
    } else {
        output.message("✗ Workflow completed with problems");
    }
    Ok(())
}
