pub mod config;
pub mod delete;
pub mod done;
pub mod list;
pub mod status;
pub mod sync;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use todosync_core::SyncConfig;
use todosync_core::codec::DefaultTodoSerializer;
use todosync_core::event::EventMapper;
use todosync_core::reconcile::Reconciler;
use todosync_core::remote::RemoteClient;
use todosync_core::status::{NetworkStatus, StatusSink, SyncStatus};
use todosync_core::todo::Todo;
use todosync_core::vault::{FsVault, LocalStore};
use tracing::debug;

/// Logs status transitions instead of drawing them.
struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn sync_status(&self, status: SyncStatus) {
        debug!(%status, "Sync status");
    }

    fn network_status(&self, status: NetworkStatus) {
        debug!(%status, "Network status");
    }
}

/// Wire the vault and the configured provider together.
pub fn build_reconciler(config: &SyncConfig) -> Result<Reconciler> {
    let remote = config.require_remote()?.clone();
    remote.provider.ensure_installed()?;

    let vault_path = config.vault_path();
    if !vault_path.is_dir() {
        anyhow::bail!(
            "Vault not found at {}.\n\n\
            Set `vault_dir` in {}",
            vault_path.display(),
            SyncConfig::config_path()?.display()
        );
    }

    let local = Arc::new(LocalStore::new(
        Arc::new(FsVault::new(vault_path)),
        Arc::new(DefaultTodoSerializer::new(config.timezone)),
    ));
    let remote = Arc::new(RemoteClient::new(
        Arc::new(remote),
        EventMapper::new(config.timezone),
        Arc::new(LogStatusSink),
    ));

    Ok(Reconciler::new(local, remote, config.reconcile_options()))
}

pub async fn resolve_todo(reconciler: &Reconciler, block_id: &str) -> Result<Todo> {
    let block_id = block_id.trim_start_matches('^');
    match reconciler.resolve(block_id).await? {
        Some(todo) => Ok(todo),
        None => anyhow::bail!("No todo with block id ^{} in the sync window", block_id),
    }
}
