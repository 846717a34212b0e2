use anyhow::Result;
use owo_colors::OwoColorize;
use todosync_core::SyncConfig;

use super::{build_reconciler, resolve_todo};

pub async fn run(block_id: &str) -> Result<()> {
    let config = SyncConfig::load()?;
    let reconciler = build_reconciler(&config)?;

    let todo = resolve_todo(&reconciler, block_id).await?;
    reconciler.delete_todo(&todo).await?;

    println!("{} {}", "-".red(), todo.content().red());
    if todo.remote_id.is_none() {
        println!("   {}", "No calendar event to delete".dimmed());
    }

    Ok(())
}
