use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::vault::VaultStore;

/// A vault backed by a directory of markdown files.
///
/// Paths handed in and out are relative to `root`.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsVault { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

#[async_trait]
impl VaultStore for FsVault {
    async fn read(&self, path: &Path) -> SyncResult<String> {
        Ok(tokio::fs::read_to_string(self.root.join(path)).await?)
    }

    async fn write(&self, path: &Path, content: &str) -> SyncResult<()> {
        Ok(tokio::fs::write(self.root.join(path), content).await?)
    }

    async fn list(&self) -> SyncResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if is_hidden(&path) {
                    continue;
                }

                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if path.extension().is_some_and(|e| e == "md") {
                    if let Ok(relative) = path.strip_prefix(&self.root) {
                        files.push(relative.to_path_buf());
                    }
                }
            }
        }

        files.sort();
        Ok(files)
    }
}
