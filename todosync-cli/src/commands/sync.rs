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

    let plan = match result {
        Ok(plan) => plan,
        Err(e) => {
            println!("   {}", e.to_string().red());
            return Err(e.into());
        }
    };
    println!("{}", plan.render());

    if plan.is_empty() {
        return Ok(());
    }

    let spinner = tui::create_spinner("Applying changes");
    let report = reconciler.apply(&plan).await;
    spinner.finish_and_clear();

    println!("\n{}", report.render());

    if reconciler.pending_retries() > 0 && !reconciler.drain_retries().await {
        anyhow::bail!(
            "{} status update(s) could not be delivered. Run `todosync sync` again later.",
            reconciler.pending_retries()
        );
    }

    Ok(())
}
