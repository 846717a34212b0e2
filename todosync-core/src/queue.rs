//! Deferred replay of remote mutations that failed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::SyncResult;

/// The mutation a queued item stands for.
#[async_trait]
pub trait Replay<T: Send + Sync>: Send + Sync {
    /// `Ok(false)` means "not done yet, keep it queued".
    async fn replay(&self, item: &T) -> SyncResult<bool>;
}

/// FIFO of failed mutations, replayed on each [`RetryQueue::drain`].
///
/// Items are retried until they succeed; there is no attempt cap.
pub struct RetryQueue<T> {
    items: Mutex<VecDeque<T>>,
    replay: Arc<dyn Replay<T>>,
    draining: tokio::sync::Mutex<()>,
}

impl<T: Send + Sync> RetryQueue<T> {
    pub fn new(replay: Arc<dyn Replay<T>>) -> Self {
        RetryQueue {
            items: Mutex::new(VecDeque::new()),
            replay,
            draining: tokio::sync::Mutex::new(()),
        }
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<T>> {
        // A poisoned queue still holds valid items.
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn enqueue(&self, item: T) {
        self.items().push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Replay each item queued at the time of the call, once, in order.
    ///
    /// Failures go back to the tail. Items enqueued during the drain wait
    /// for the next one. Returns whether every replayed item succeeded.
    pub async fn drain(&self) -> bool {
        let _draining = self.draining.lock().await;

        let snapshot = self.len();
        let mut all_succeeded = true;

        for _ in 0..snapshot {
            let Some(item) = self.items().pop_front() else {
                break;
            };

            let succeeded = match self.replay.replay(&item).await {
                Ok(done) => done,
                Err(e) => {
                    warn!(error = %e, "Replay failed, keeping item queued");
                    false
                }
            };

            if !succeeded {
                all_succeeded = false;
                self.enqueue(item);
            }
        }

        debug!(replayed = snapshot, pending = self.len(), "Drained retry queue");
        all_succeeded
    }
}
