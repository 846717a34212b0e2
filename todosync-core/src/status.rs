//! Sync and network status reporting.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Unknown,
    /// An insert, patch or delete is in flight.
    Upload,
    /// A list is in flight.
    Download,
    SuccessWaiting,
    FailedWarning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkStatus {
    #[default]
    Unknown,
    Healthy,
    ConnectionError,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::Unknown => "unknown",
            SyncStatus::Upload => "uploading",
            SyncStatus::Download => "downloading",
            SyncStatus::SuccessWaiting => "idle",
            SyncStatus::FailedWarning => "failed",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NetworkStatus::Unknown => "unknown",
            NetworkStatus::Healthy => "healthy",
            NetworkStatus::ConnectionError => "connection error",
        };
        write!(f, "{}", s)
    }
}

/// Receives status transitions from the remote client.
pub trait StatusSink: Send + Sync {
    fn sync_status(&self, status: SyncStatus);
    fn network_status(&self, status: NetworkStatus);
}

pub struct NoopStatusSink;

impl StatusSink for NoopStatusSink {
    fn sync_status(&self, _status: SyncStatus) {}
    fn network_status(&self, _status: NetworkStatus) {}
}
