//! One reconciliation pass, plus single-todo operations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::date;
use crate::error::{SyncError, SyncResult};
use crate::event::Event;
use crate::queue::{Replay, RetryQueue};
use crate::reconcile::{DiffKind, ReconcilePlan, ReconcileReport, StatusAuthority, TodoDiff};
use crate::remote::RemoteClient;
use crate::todo::Todo;
use crate::vault::{ListMode, LocalStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub fetch_weeks_ago: u32,
    pub max_results: u32,
    pub authority: StatusAuthority,
    pub tz: Tz,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions {
            fetch_weeks_ago: 4,
            max_results: 2000,
            authority: StatusAuthority::default(),
            tz: Tz::UTC,
        }
    }
}

/// Replays a status patch left over from a failed delivery.
struct StatusPatchReplay {
    remote: Arc<RemoteClient>,
}

#[async_trait]
impl Replay<Todo> for StatusPatchReplay {
    async fn replay(&self, todo: &Todo) -> SyncResult<bool> {
        self.remote.patch_status(todo).await.map(|_| true)
    }
}

enum Outcome {
    Applied(DiffKind),
    NotFound,
    Failed { queued: bool, error: SyncError },
}

pub struct Reconciler {
    local: Arc<LocalStore>,
    remote: Arc<RemoteClient>,
    retries: RetryQueue<Todo>,
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(local: Arc<LocalStore>, remote: Arc<RemoteClient>, options: ReconcileOptions) -> Self {
        let replay = Arc::new(StatusPatchReplay {
            remote: remote.clone(),
        });

        Reconciler {
            local,
            remote,
            retries: RetryQueue::new(replay),
            options,
        }
    }

    /// Start of the window both stores are read from.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        date::window_start(now.with_timezone(&self.options.tz), self.options.fetch_weeks_ago)
    }

    async fn fetch(&self, mode: ListMode) -> SyncResult<(Vec<Todo>, Vec<Todo>)> {
        let from = self.window_start(Utc::now());
        let (local, remote) = tokio::join!(
            self.local.list_tasks(from, mode),
            self.remote.list_todos(from, self.options.max_results),
        );
        Ok((local?, remote?))
    }

    /// Read both stores and classify, without changing anything.
    pub async fn plan(&self, mode: ListMode) -> SyncResult<ReconcilePlan> {
        let (local, remote) = self.fetch(mode).await?;
        Ok(ReconcilePlan::build(local, remote, self.options.authority))
    }

    /// Plans only push inserts and patches.
    async fn push(&self, diff: &TodoDiff) -> Outcome {
        if diff.kind == DiffKind::Insert {
            self.push_insert(diff).await
        } else {
            self.push_patch(diff).await
        }
    }

    async fn push_insert(&self, diff: &TodoDiff) -> Outcome {
        match self.remote.insert_todo(&diff.todo).await {
            Ok(_) => Outcome::Applied(DiffKind::Insert),
            Err(error) => Outcome::Failed {
                queued: false,
                error,
            },
        }
    }

    /// Patch an event's status. Undelivered patches are queued.
    async fn push_patch(&self, diff: &TodoDiff) -> Outcome {
        match self.remote.patch_status(&diff.todo).await {
            Ok(()) => Outcome::Applied(DiffKind::Patch),
            Err(error) => {
                let queued = matches!(error, SyncError::DeliveryFailed { .. });
                if queued {
                    self.retries.enqueue(diff.todo.clone());
                }
                Outcome::Failed { queued, error }
            }
        }
    }

    async fn pull(&self, diff: &TodoDiff) -> Outcome {
        match self.local.update(&diff.todo).await {
            Ok(true) => Outcome::Applied(DiffKind::Pull),
            Ok(false) => Outcome::NotFound,
            Err(error) => Outcome::Failed {
                queued: false,
                error,
            },
        }
    }

    /// Execute a plan. Every mutation is attempted; failures are counted
    /// and logged, never propagated.
    pub async fn apply(&self, plan: &ReconcilePlan) -> ReconcileReport {
        let (pushed, pulled) = tokio::join!(
            join_all(plan.to_push.iter().map(|d| self.push(d))),
            join_all(plan.to_pull.iter().map(|d| self.pull(d))),
        );

        let mut report = ReconcileReport::default();
        let diffs = plan.to_push.iter().chain(&plan.to_pull);
        for (diff, outcome) in diffs.zip(pushed.into_iter().chain(pulled)) {
            match outcome {
                Outcome::Applied(DiffKind::Insert) => report.inserted += 1,
                Outcome::Applied(DiffKind::Patch) => report.patched += 1,
                Outcome::Applied(DiffKind::Pull) => report.pulled += 1,
                Outcome::NotFound => report.not_found += 1,
                Outcome::Failed { queued, error } => {
                    error!(
                        kind = %diff.kind,
                        content = diff.todo.content(),
                        block_id = diff.block_id().unwrap_or_default(),
                        path = %diff.todo.source_path.as_deref().unwrap_or(std::path::Path::new("")).display(),
                        error = %error,
                        "Failed to apply change"
                    );
                    if queued {
                        report.queued += 1;
                    }
                    report.errors.push(format!("{diff}: {error}"));
                }
            }
        }

        info!(%report, "Reconciliation pass applied");
        report
    }

    /// Plan and apply one full pass.
    pub async fn reconcile(&self, mode: ListMode) -> SyncResult<(ReconcilePlan, ReconcileReport)> {
        let plan = self.plan(mode).await?;
        let report = self.apply(&plan).await;
        Ok((plan, report))
    }

    /// Find the local todo with `block_id`, linked to its remote event.
    pub async fn resolve(&self, block_id: &str) -> SyncResult<Option<Todo>> {
        let (local, remote) = self.fetch(ListMode::Manual).await?;

        let Some(mut todo) = local
            .into_iter()
            .find(|t| t.block_id.as_deref() == Some(block_id))
        else {
            return Ok(None);
        };

        if let Some(event) = remote
            .iter()
            .find(|t| t.block_id.as_deref() == Some(block_id))
        {
            todo.remote_id = event.remote_id.clone();
            todo.remote_link = event.remote_link.clone();
        }

        Ok(Some(todo))
    }

    /// Remove the todo's line, then its remote event.
    pub async fn delete_todo(&self, todo: &Todo) -> SyncResult<()> {
        if !self.local.delete(todo).await? {
            warn!(content = todo.content(), "Local line already gone");
        }

        if todo.remote_id.is_some() {
            self.remote.delete_todo(todo).await?;
        }
        Ok(())
    }

    pub async fn insert_todo(&self, todo: &Todo) -> SyncResult<Event> {
        self.remote.insert_todo(todo).await
    }

    /// Tick the todo's checkbox and mark its event done.
    ///
    /// An undelivered remote patch is queued for [`Reconciler::drain_retries`].
    pub async fn complete_todo(&self, todo: &Todo) -> SyncResult<()> {
        let mut done = todo.clone();
        done.status = Some("x".to_string());

        if !self.local.mark_done(&done).await? {
            warn!(content = todo.content(), "Local line already gone");
        }

        if done.remote_id.is_none() {
            return Ok(());
        }

        match self.remote.patch_status(&done).await {
            Ok(()) => Ok(()),
            Err(e @ SyncError::DeliveryFailed { .. }) => {
                self.retries.enqueue(done);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Replay queued patches once. Returns whether all of them went through.
    pub async fn drain_retries(&self) -> bool {
        self.retries.drain().await
    }

    pub fn pending_retries(&self) -> usize {
        self.retries.len()
    }
}
