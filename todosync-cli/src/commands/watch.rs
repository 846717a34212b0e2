use anyhow::Result;
use owo_colors::OwoColorize;
use todosync_core::SyncConfig;
use todosync_core::vault::ListMode;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use super::build_reconciler;
use crate::render::Render;

pub async fn run(mode: ListMode) -> Result<()> {
    let config = SyncConfig::load()?;
    let reconciler = build_reconciler(&config)?;

    let mut sync_tick = interval(config.sync_interval);
    let mut retry_tick = interval(config.retry_interval);
    sync_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    retry_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    println!(
        "{}",
        format!(
            "Watching {} every {}s. Press Ctrl-C to stop.",
            config.vault_path().display(),
            config.sync_interval.as_secs()
        )
        .dimmed()
    );

    loop {
        tokio::select! {
            _ = sync_tick.tick() => {
                match reconciler.reconcile(mode).await {
                    Ok((plan, report)) if !plan.is_empty() => {
                        println!("{}", plan.render());
                        println!("{}", report.render());
                    }
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "Reconciliation pass failed"),
                }
            }
            _ = retry_tick.tick(), if reconciler.pending_retries() > 0 => {
                if reconciler.drain_retries().await {
                    info!("Delivered queued status updates");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let pending = reconciler.pending_retries();
                if pending > 0 {
                    println!("{}", format!("{pending} status update(s) still queued").yellow());
                }
                return Ok(());
            }
        }
    }
}
