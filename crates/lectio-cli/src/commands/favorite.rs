//! Favorites command handlers

use anyhow::Result;

use crate::engine::Engine;
use crate::output::{Output, OutputFormat};

/// Favorite a reading
pub async fn add(engine: &Engine, id: String, output: &Output) -> Result<()> {
    engine.content.add_to_favorites(&id).await?;
    engine.favorites.add_favorite(&id).await?;
    output.success(&format!("Favorited {}", id));
    Ok(())
}

/// Unfavorite a reading
pub async fn remove(engine: &Engine, id: String, output: &Output) -> Result<()> {
    engine.content.remove_from_favorites(&id).await?;
    engine.favorites.remove_favorite(&id).await?;
    output.success(&format!("Unfavorited {}", id));
    Ok(())
}

/// List favorited readings
pub async fn list(engine: &Engine, output: &Output) -> Result<()> {
    let readings = engine.favorites.get_favorites().await;
    output.print_readings(&readings);
    Ok(())
}

/// Favorites statistics
pub async fn stats(engine: &Engine, output: &Output) -> Result<()> {
    let stats = engine.favorites.get_statistics().await;

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Quiet => {
            println!("{}", stats.total_favorites);
        }
        OutputFormat::Human => {
            println!("Favorites");
            println!("=========");
            println!("Total:       {}", stats.total_favorites);
            println!("Collections: {}", stats.total_collections);
            if !stats.recently_added.is_empty() {
                println!();
                println!("Recently added:");
                for reading in &stats.recently_added {
                    println!("  {} | {}", reading.date, reading.title);
                }
            }
            if !stats.most_viewed.is_empty() {
                println!();
                println!("Most viewed:");
                for (id, views) in &stats.most_viewed {
                    println!("  {} ({} views)", id, views);
                }
            }
        }
    }
    Ok(())
}

/// Create a named collection
pub fn create_collection(
    engine: &Engine,
    name: String,
    description: Option<String>,
    output: &Output,
) -> Result<()> {
    let collection = engine.favorites.create_collection(&name, description)?;
    output.success(&format!("Created collection: {}", collection.id));
    if output.is_quiet() {
        println!("{}", collection.id);
    }
    Ok(())
}

/// Delete a collection
pub fn delete_collection(engine: &Engine, id: String, output: &Output) -> Result<()> {
    engine.favorites.delete_collection(&id)?;
    output.success(&format!("Deleted collection {}", id));
    Ok(())
}

/// Add a reading to a collection
pub fn add_to_collection(
    engine: &Engine,
    collection: String,
    reading: String,
    output: &Output,
) -> Result<()> {
    engine.favorites.add_to_collection(&collection, &reading)?;
    output.success(&format!("Added {} to {}", reading, collection));
    Ok(())
}

/// Remove a reading from a collection
pub fn remove_from_collection(
    engine: &Engine,
    collection: String,
    reading: String,
    output: &Output,
) -> Result<()> {
    engine.favorites.remove_from_collection(&collection, &reading)?;
    output.success(&format!("Removed {} from {}", reading, collection));
    Ok(())
}

/// List collections
pub fn list_collections(engine: &Engine, output: &Output) -> Result<()> {
    let collections = engine.favorites.get_collections();

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&collections)?);
        }
        OutputFormat::Quiet => {
            for collection in &collections {
                println!("{}", collection.id);
            }
        }
        OutputFormat::Human => {
            for collection in &collections {
                println!(
                    "{} | {} | {} reading(s)",
                    collection.id,
                    collection.name,
                    collection.reading_ids.len()
                );
            }
            println!("\n{} collection(s)", collections.len());
        }
    }
    Ok(())
}
