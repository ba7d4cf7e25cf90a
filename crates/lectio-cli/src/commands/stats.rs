//! Stats command handler

use anyhow::Result;

use crate::engine::Engine;
use crate::output::Output;

/// Show catalog statistics
pub async fn show(engine: &Engine, output: &Output) -> Result<()> {
    let stats = engine.content.get_stats().await?;
    output.print_stats(&stats);
    Ok(())
}
