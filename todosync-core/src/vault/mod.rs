//! The local note vault.

mod block_id;
mod fs;
mod rewrite;
mod store;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::SyncResult;

pub use block_id::{BLOCK_ID_WIDTH, block_id_for};
pub use fs::FsVault;
pub use rewrite::{DeleteLine, LineRewrite, MARK_DONE, Resync, SetStatus};
pub use store::{EditorCursor, ListMode, LocalStore};

/// Raw file access to a vault.
#[async_trait]
pub trait VaultStore: Send + Sync {
    async fn read(&self, path: &Path) -> SyncResult<String>;

    async fn write(&self, path: &Path, content: &str) -> SyncResult<()>;

    /// Every note in the vault.
    async fn list(&self) -> SyncResult<Vec<PathBuf>>;
}
