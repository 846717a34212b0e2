//! In-memory doubles for the vault, the calendar and status reporting.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::error::{SyncError, SyncResult};
use crate::event::{Event, EventPatch};
use crate::remote::RemoteCalendar;
use crate::status::{NetworkStatus, StatusSink, SyncStatus};
use crate::vault::VaultStore;

#[derive(Default)]
pub struct MemoryVault {
    files: Mutex<BTreeMap<PathBuf, String>>,
    writes: AtomicUsize,
    yield_on_io: AtomicBool,
}

impl MemoryVault {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let vault = MemoryVault::default();
        for (path, content) in files {
            vault.set(path, content);
        }
        vault
    }

    /// Replace a file without counting it as a write.
    pub fn set(&self, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_string());
    }

    pub fn content(&self, path: &str) -> String {
        self.files
            .lock()
            .unwrap()
            .get(Path::new(path))
            .cloned()
            .unwrap_or_default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Yield to the scheduler around every read and write, so concurrent
    /// callers interleave.
    pub fn set_yield_on_io(&self, enabled: bool) {
        self.yield_on_io.store(enabled, Ordering::SeqCst);
    }

    async fn maybe_yield(&self) {
        if self.yield_on_io.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl VaultStore for MemoryVault {
    async fn read(&self, path: &Path) -> SyncResult<String> {
        self.maybe_yield().await;
        let content = self.files.lock().unwrap().get(path).cloned();
        self.maybe_yield().await;
        content.ok_or_else(|| {
            SyncError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ))
        })
    }

    async fn write(&self, path: &Path, content: &str) -> SyncResult<()> {
        self.maybe_yield().await;
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list(&self) -> SyncResult<Vec<PathBuf>> {
        Ok(self.files.lock().unwrap().keys().cloned().collect())
    }
}

#[derive(Default)]
pub struct FakeCalendar {
    events: Mutex<Vec<Event>>,
    inserted: Mutex<Vec<Event>>,
    patches: Mutex<Vec<(String, EventPatch)>>,
    deleted: Mutex<Vec<String>>,
    rejected: Mutex<Vec<String>>,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeCalendar {
    pub fn with_events(events: Vec<Event>) -> Self {
        FakeCalendar {
            events: Mutex::new(events),
            ..Default::default()
        }
    }

    /// Fail the next `n` calls of any kind with a transient error.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Always fail inserts of events with this summary.
    pub fn reject_summary(&self, summary: &str) {
        self.rejected.lock().unwrap().push(summary.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inserted(&self) -> Vec<Event> {
        self.inserted.lock().unwrap().clone()
    }

    pub fn patches(&self) -> Vec<(String, EventPatch)> {
        self.patches.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn enter(&self) -> SyncResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SyncError::Provider("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteCalendar for FakeCalendar {
    async fn list_events(
        &self,
        _from: DateTime<FixedOffset>,
        max_results: u32,
    ) -> SyncResult<Vec<Event>> {
        self.enter()?;
        let events = self.events.lock().unwrap();
        Ok(events.iter().take(max_results as usize).cloned().collect())
    }

    async fn insert_event(&self, event: &Event) -> SyncResult<Event> {
        self.enter()?;
        let summary = event.summary.clone().unwrap_or_default();
        if self.rejected.lock().unwrap().contains(&summary) {
            return Err(SyncError::Provider(format!("rejected '{summary}'")));
        }

        let mut inserted = self.inserted.lock().unwrap();
        let mut created = event.clone();
        created.id = Some(format!("evt-{}", inserted.len() + 1));
        inserted.push(created.clone());
        self.events.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn patch_event(&self, event_id: &str, patch: &EventPatch) -> SyncResult<()> {
        self.enter()?;
        self.patches
            .lock()
            .unwrap()
            .push((event_id.to_string(), patch.clone()));
        Ok(())
    }

    async fn delete_event(&self, event_id: &str) -> SyncResult<()> {
        self.enter()?;
        self.deleted.lock().unwrap().push(event_id.to_string());
        self.events
            .lock()
            .unwrap()
            .retain(|e| e.id.as_deref() != Some(event_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    sync: Mutex<Vec<SyncStatus>>,
    network: Mutex<Vec<NetworkStatus>>,
}

impl RecordingSink {
    pub fn last_sync(&self) -> Option<SyncStatus> {
        self.sync.lock().unwrap().last().copied()
    }

    pub fn last_network(&self) -> Option<NetworkStatus> {
        self.network.lock().unwrap().last().copied()
    }

    pub fn sync_history(&self) -> Vec<SyncStatus> {
        self.sync.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingSink {
    fn sync_status(&self, status: SyncStatus) {
        self.sync.lock().unwrap().push(status);
    }

    fn network_status(&self, status: NetworkStatus) {
        self.network.lock().unwrap().push(status);
    }
}
