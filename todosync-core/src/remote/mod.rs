//! The remote calendar.

mod client;
pub mod protocol;
mod provider;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::error::SyncResult;
use crate::event::{Event, EventPatch};

pub use client::{RemoteClient, RetryPolicy};
pub use provider::{Provider, ProviderRemote, RemoteConfig};

/// Raw event access to a calendar service.
#[async_trait]
pub trait RemoteCalendar: Send + Sync {
    /// One page of events starting at `from`, ordered by start time, with
    /// recurring events expanded.
    async fn list_events(
        &self,
        from: DateTime<FixedOffset>,
        max_results: u32,
    ) -> SyncResult<Vec<Event>>;

    async fn insert_event(&self, event: &Event) -> SyncResult<Event>;

    async fn patch_event(&self, event_id: &str, patch: &EventPatch) -> SyncResult<()>;

    async fn delete_event(&self, event_id: &str) -> SyncResult<()>;
}
