//! Validate command handler

use anyhow::{Context, Result};

use crate::engine::Engine;
use crate::output::{Output, OutputFormat};

/// Validate every reading, optionally with the integrity scan
pub async fn run(engine: &Engine, integrity: bool, output: &Output) -> Result<()> {
    let (readings, favorite_ids) = {
        let store = engine.store.lock().await;
        let readings = store.all_readings().context("Failed to load catalog")?;
        let favorite_ids = store.get_favorite_ids().context("Failed to load favorites")?;
        (readings, favorite_ids)
    };

    let batch = engine.validation.validate_batch(&readings);

    if output.is_json() {
        let mut body = serde_json::json!({ "validation": batch });
        if integrity {
            let report = engine.validation.check_integrity(&readings, &favorite_ids);
            body["integrity"] = serde_json::to_value(&report)?;
        }
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    match output.format {
        OutputFormat::Quiet => {
            println!("{}", batch.invalid_count);
        }
        _ => {
            println!(
                "{} reading(s): {} valid, {} invalid ({:.0}% success)",
                batch.total, batch.valid_count, batch.invalid_count, batch.success_rate
            );
            for failure in &batch.failures {
                println!();
                println!("{}:", failure.reading_id);
                for error in &failure.errors {
                    println!("  {}: {}", error.field, error.message);
                }
            }
        }
    }

    if integrity {
        let report = engine.validation.check_integrity(&readings, &favorite_ids);
        if report.is_valid() {
            output.success("Integrity check passed");
        } else {
            output.message(&format!("✗ {} integrity issue(s):", report.issues.len()));
            for issue in &report.issues {
                output.message(&format!("  {:?}", issue));
            }
        }
    }
    Ok(())
}
