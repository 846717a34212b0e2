use anyhow::Result;
use owo_colors::OwoColorize;
use todosync_core::SyncConfig;

use super::{build_reconciler, resolve_todo};
use crate::render::Render;

pub async fn run(block_id: &str) -> Result<()> {
    let config = SyncConfig::load()?;
    let reconciler = build_reconciler(&config)?;

    let todo = resolve_todo(&reconciler, block_id).await?;
    reconciler.complete_todo(&todo).await?;

    let mut done = todo;
    done.status = Some("x".to_string());
    println!("{} {}", "✓".green(), done.render());

    Ok(())
}
