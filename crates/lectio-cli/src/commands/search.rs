//! Search command handlers

use anyhow::Result;

use crate::engine::Engine;
use crate::output::{Output, OutputFormat};

/// Search readings and record the query in history
pub async fn search(engine: &Engine, query: String, limit: u32, output: &Output) -> Result<()> {
    let results = engine.search.search(&query, limit).await;

    output.print_readings(&results.readings);
    if !output.is_quiet() && !output.is_json() {
        println!(
            "{} of {} match(es) in {} ms",
            results.readings.len(),
            results.total,
            results.execution_time_ms
        );
    }
    Ok(())
}

/// Show search history analytics
pub async fn analytics(engine: &Engine, output: &Output) -> Result<()> {
    let analytics = engine.search.get_analytics().await;

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&analytics)?);
        }
        OutputFormat::Quiet => {
            println!("{}", analytics.total_searches);
        }
        OutputFormat::Human => {
            println!("Search Analytics");
            println!("================");
            println!("Searches:     {}", analytics.total_searches);
            println!("Avg results:  {:.1}", analytics.average_results);
            println!("Success rate: {:.0}%", analytics.success_rate * 100.0);
            if !analytics.top_terms.is_empty() {
                println!();
                println!("Top terms:");
                for (term, count) in &analytics.top_terms {
                    println!("  {} ({})", term, count);
                }
            }
        }
    }
    Ok(())
}
