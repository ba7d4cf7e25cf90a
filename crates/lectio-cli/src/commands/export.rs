//! Export and import command handlers

use anyhow::{bail, Context, Result};

use lectio_core::{DataType, ImportOptions};

use crate::engine::Engine;
use crate::output::Output;

/// Export the catalog as JSON or CSV
pub async fn export(
    engine: &Engine,
    format: String,
    data_type: String,
    file: Option<String>,
    output: &Output,
) -> Result<()> {
    let payload = match format.as_str() {
        "json" => {
            let data_type = parse_data_type(&data_type)?;
            engine.export.export_to_json(data_type).await?
        }
        "csv" => engine.export.export_to_csv().await?,
        other => bail!("Unknown export format '{}' (expected json or csv)", other),
    };

    match file {
        Some(path) => {
            std::fs::write(&path, &payload)
                .with_context(|| format!("Failed to write {}", path))?;
            output.success(&format!("Exported to {}", path));
        }
        None => print!("{}", payload),
    }
    Ok(())
}

/// Import a JSON export file
pub async fn import(
    engine: &Engine,
    file: String,
    overwrite: bool,
    skip_duplicates: bool,
    favorites: bool,
    output: &Output,
) -> Result<()> {
    let json = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file))?;

    let report = engine
        .export
        .import_from_json(
            &json,
            ImportOptions {
                overwrite,
                skip_duplicates,
                import_favorites: favorites,
            },
        )
        .await?;

    output.success(&format!(
        "Imported {} reading(s), skipped {}, restored {} favorite(s)",
        report.imported, report.skipped, report.favorites_restored
    ));
    Ok(())
}

fn parse_data_type(s: &str) -> Result<DataType> {
    match s {
        "full" => Ok(DataType::Full),
        "readings" => Ok(DataType::Readings),
        "favorites" => Ok(DataType::Favorites),
        "custom" => Ok(DataType::Custom),
        other => bail!(
            "Unknown data type '{}' (expected full, readings, favorites, or custom)",
            other
        ),
    }
}
