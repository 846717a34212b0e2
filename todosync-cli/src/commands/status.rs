use anyhow::Result;
use owo_colors::OwoColorize;
use todosync_core::SyncConfig;
use todosync_core::vault::ListMode;

use super::build_reconciler;
use crate::render::Render;
use crate::utils::tui;

pub async fn run(mode: ListMode) -> Result<()> {
    let config = SyncConfig::load()?;
    let reconciler = build_reconciler(&config)?;

    let spinner = tui::create_spinner("Comparing notes and calendar");
    let result = reconciler.plan(mode).await;
    spinner.finish_and_clear();

    match result {
        Ok(plan) => {
            println!("{}", plan.render());
            if !plan.remote_created.is_empty() {
                println!(
                    "\n   {}",
                    format!(
                        "{} calendar-only todo(s) without a note line",
                        plan.remote_created.len()
                    )
                    .dimmed()
                );
            }
        }
        Err(e) => println!("   {}", e.to_string().red()),
    }

    Ok(())
}
