//! Reading command handlers

use std::io::Read as _;

use anyhow::{bail, Context, Result};

use lectio_core::{Reading, ReadingType, SearchFilters};

use crate::engine::Engine;
use crate::output::{Output, OutputFormat};

/// Add a reading to the catalog
#[allow(clippy::too_many_arguments)]
pub async fn add(
    engine: &Engine,
    date: String,
    title: String,
    content: Option<String>,
    reading_type: String,
    reference: Option<String>,
    difficulty: u8,
    language: String,
    output: &Output,
) -> Result<()> {
    let reading_type = parse_reading_type(&reading_type)?;

    let content = match content {
        Some(c) => c,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read content from stdin")?;
            buf.trim().to_string()
        }
    };
    if content.is_empty() {
        bail!("Content cannot be empty");
    }

    let mut reading = Reading::new(date, title, content, reading_type);
    reading.reference = reference.unwrap_or_default();
    reading.difficulty = difficulty;
    reading.language = language;

    // Surface field problems before writing
    let report = engine.validation.validate_reading(&reading);
    if !report.is_valid() {
        let problems: Vec<String> = report
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        bail!("Invalid reading:\n  {}", problems.join("\n  "));
    }
    for warning in &report.warnings {
        output.message(&format!("⚠ {}: {}", warning.field, warning.message));
    }

    engine
        .store
        .lock()
        .await
        .add_reading(&reading)
        .context("Failed to add reading")?;

    output.success(&format!("Added reading: {}", reading.id));
    if output.is_quiet() {
        println!("{}", reading.id);
    }
    Ok(())
}

/// List readings, by date or by filters
#[allow(clippy::too_many_arguments)]
pub async fn list(
    engine: &Engine,
    date: Option<String>,
    reading_type: Option<String>,
    language: Option<String>,
    favorites: bool,
    limit: u32,
    offset: u32,
    output: &Output,
) -> Result<()> {
    if let Some(date) = date {
        let readings = engine.content.get_readings_for_date(&date).await;
        output.print_readings(&readings);
        return Ok(());
    }

    let filters = SearchFilters {
        reading_type: reading_type.as_deref().map(parse_reading_type).transpose()?,
        language,
        favorites_only: favorites,
        limit: Some(limit),
        offset: Some(offset),
        ..Default::default()
    };
    let results = engine.content.search_readings(&filters).await?;
    output.print_readings(&results.readings);
    Ok(())
}

/// Show a single reading
pub async fn show(engine: &Engine, id: String, output: &Output) -> Result<()> {
    let reading = engine
        .store
        .lock()
        .await
        .get_reading(&id)?
        .with_context(|| format!("Reading not found: {}", id))?;

    output.print_reading(&reading);
    Ok(())
}

/// Popular readings
pub async fn popular(engine: &Engine, limit: usize, output: &Output) -> Result<()> {
    let readings = engine.content.get_popular_readings(limit).await;
    output.print_readings(&readings);
    Ok(())
}

/// Recommendations across difficulty levels
pub async fn recommend(engine: &Engine, user: Option<String>, output: &Output) -> Result<()> {
    let scored = engine.content.get_recommendations(user.as_deref()).await;

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&scored)?);
        }
        _ => {
            if scored.is_empty() {
                output.message("No recommendations available.");
                return Ok(());
            }
            for item in &scored {
                if output.is_quiet() {
                    println!("{}", item.reading.id);
                } else {
                    println!(
                        "{:.2} | {} | difficulty {}/5",
                        item.score, item.reading.title, item.reading.difficulty
                    );
                }
            }
        }
    }
    Ok(())
}

fn parse_reading_type(s: &str) -> Result<ReadingType> {
    ReadingType::parse(s).with_context(|| {
        format!(
            "Unknown reading type '{}' (expected one of: {})",
            s,
            ReadingType::ALL
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}
