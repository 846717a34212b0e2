//! Todo-level access to the remote calendar with bounded retry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, error, warn};

use crate::error::{SyncError, SyncResult};
use crate::event::{Event, EventMapper, EventPatch};
use crate::remote::RemoteCalendar;
use crate::status::{NetworkStatus, StatusSink, SyncStatus};
use crate::todo::Todo;

/// Fixed-delay retry for remote mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 20,
            delay: Duration::from_millis(100),
        }
    }
}

pub struct RemoteClient {
    calendar: Arc<dyn RemoteCalendar>,
    mapper: EventMapper,
    sink: Arc<dyn StatusSink>,
    retry: RetryPolicy,
}

impl RemoteClient {
    pub fn new(
        calendar: Arc<dyn RemoteCalendar>,
        mapper: EventMapper,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        RemoteClient {
            calendar,
            mapper,
            sink,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn mapper(&self) -> &EventMapper {
        &self.mapper
    }

    fn report(&self, ok: bool) {
        if ok {
            self.sink.network_status(NetworkStatus::Healthy);
            self.sink.sync_status(SyncStatus::SuccessWaiting);
        } else {
            self.sink.network_status(NetworkStatus::ConnectionError);
            self.sink.sync_status(SyncStatus::FailedWarning);
        }
    }

    /// Remote todos starting at `from`, at most `max_results` of them.
    ///
    /// Events that cannot be mapped are logged and skipped.
    pub async fn list_todos(
        &self,
        from: DateTime<FixedOffset>,
        max_results: u32,
    ) -> SyncResult<Vec<Todo>> {
        self.sink.sync_status(SyncStatus::Download);

        let events = match self.calendar.list_events(from, max_results).await {
            Ok(events) => {
                self.report(true);
                events
            }
            Err(e) => {
                self.report(false);
                return Err(e);
            }
        };

        let todos: Vec<Todo> = events
            .iter()
            .filter_map(|event| match self.mapper.from_remote_event(event) {
                Ok(todo) => Some(todo),
                Err(e) => {
                    warn!(
                        event_id = event.id.as_deref().unwrap_or_default(),
                        summary = event.summary.as_deref().unwrap_or_default(),
                        error = %e,
                        "Skipping remote event"
                    );
                    None
                }
            })
            .collect();

        debug!(count = todos.len(), "Listed remote todos");
        Ok(todos)
    }

    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        todo: &Todo,
        mut call: F,
    ) -> SyncResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        self.sink.sync_status(SyncStatus::Upload);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match call().await {
                Ok(value) => {
                    self.report(true);
                    debug!(operation, content = todo.content(), attempt, "Remote call succeeded");
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.retry.attempts => {
                    debug!(operation, content = todo.content(), attempt, error = %e, "Retrying remote call");
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => {
                    self.report(false);
                    error!(
                        operation,
                        content = todo.content(),
                        block_id = todo.block_id.as_deref().unwrap_or_default(),
                        attempt,
                        error = %e,
                        "Remote call failed"
                    );
                    if !e.is_transient() {
                        return Err(e);
                    }
                    return Err(SyncError::DeliveryFailed {
                        operation,
                        content: todo.content().to_string(),
                        attempts: attempt,
                    });
                }
            }
        }
    }

    fn remote_id<'a>(todo: &'a Todo) -> SyncResult<&'a str> {
        todo.remote_id.as_deref().ok_or_else(|| {
            SyncError::InvalidReference(format!("'{}' has no remote event id", todo.content()))
        })
    }

    /// Create an event for `todo`. Mapping errors are returned without retry.
    pub async fn insert_todo(&self, todo: &Todo) -> SyncResult<Event> {
        let event = self.mapper.to_remote_event(todo)?;
        let calendar = self.calendar.as_ref();
        let event = &event;

        self.with_retry("insert", todo, move || calendar.insert_event(event))
            .await
    }

    /// Send the patch `make_patch` builds for `todo`.
    pub async fn patch_todo<F>(&self, todo: &Todo, make_patch: F) -> SyncResult<()>
    where
        F: FnOnce(&EventMapper, &Todo) -> SyncResult<EventPatch>,
    {
        let event_id = Self::remote_id(todo)?;
        let patch = make_patch(&self.mapper, todo)?;
        let calendar = self.calendar.as_ref();
        let patch = &patch;

        self.with_retry("patch", todo, move || calendar.patch_event(event_id, patch))
            .await
    }

    /// Mirror `todo`'s status onto its event.
    pub async fn patch_status(&self, todo: &Todo) -> SyncResult<()> {
        self.patch_todo(todo, EventMapper::status_patch).await
    }

    pub async fn delete_todo(&self, todo: &Todo) -> SyncResult<()> {
        let event_id = Self::remote_id(todo)?;
        let calendar = self.calendar.as_ref();

        self.with_retry("delete", todo, move || calendar.delete_event(event_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDateTime;
    use crate::testing::{FakeCalendar, RecordingSink};
    use chrono::TimeZone;

    fn client(calendar: Arc<FakeCalendar>, sink: Arc<RecordingSink>) -> RemoteClient {
        RemoteClient::new(calendar, EventMapper::new(chrono_tz::Tz::UTC), sink).with_retry_policy(
            RetryPolicy {
                attempts: 3,
                delay: Duration::ZERO,
            },
        )
    }

    fn todo() -> Todo {
        Todo {
            content: Some("Buy milk".into()),
            start_date_time: Some("2024-01-01".into()),
            block_id: Some("AB12CD34".into()),
            remote_id: Some("evt-1".into()),
            ..Default::default()
        }
    }

    fn window() -> DateTime<FixedOffset> {
        chrono::Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap()
            .fixed_offset()
    }

    #[tokio::test]
    async fn test_insert_retries_transient_failures() {
        let calendar = Arc::new(FakeCalendar::default());
        calendar.fail_next(2);
        let sink = Arc::new(RecordingSink::default());

        let event = client(calendar.clone(), sink.clone())
            .insert_todo(&todo())
            .await
            .unwrap();

        assert!(event.id.is_some());
        assert_eq!(calendar.calls(), 3);
        assert_eq!(calendar.inserted().len(), 1);
        assert_eq!(sink.last_sync(), Some(SyncStatus::SuccessWaiting));
        assert_eq!(sink.last_network(), Some(NetworkStatus::Healthy));
    }

    #[tokio::test]
    async fn test_exhausted_retries_become_delivery_failure() {
        let calendar = Arc::new(FakeCalendar::default());
        calendar.fail_next(10);
        let sink = Arc::new(RecordingSink::default());

        let err = client(calendar.clone(), sink.clone())
            .patch_status(&todo())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::DeliveryFailed {
                operation: "patch",
                attempts: 3,
                ..
            }
        ));
        assert_eq!(calendar.calls(), 3);
        assert_eq!(sink.last_sync(), Some(SyncStatus::FailedWarning));
        assert_eq!(sink.last_network(), Some(NetworkStatus::ConnectionError));
    }

    #[tokio::test]
    async fn test_mapping_error_is_not_retried() {
        let calendar = Arc::new(FakeCalendar::default());
        let mut undated = todo();
        undated.start_date_time = None;

        let err = client(calendar.clone(), Arc::new(RecordingSink::default()))
            .insert_todo(&undated)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::InvalidTodo(_)));
        assert_eq!(calendar.calls(), 0);
    }

    #[tokio::test]
    async fn test_patch_requires_remote_id() {
        let mut local_only = todo();
        local_only.remote_id = None;
        let err = client(Arc::new(FakeCalendar::default()), Arc::new(RecordingSink::default()))
            .delete_todo(&local_only)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_list_skips_unmappable_events() {
        let calendar = Arc::new(FakeCalendar::with_events(vec![
            Event {
                id: Some("ok".into()),
                summary: Some("Fine".into()),
                start: Some(EventDateTime::date("2024-01-02")),
                end: Some(EventDateTime::date("2024-01-02")),
                ..Default::default()
            },
            Event {
                id: Some("broken".into()),
                summary: Some("No interval".into()),
                ..Default::default()
            },
        ]));
        let sink = Arc::new(RecordingSink::default());

        let todos = client(calendar, sink.clone())
            .list_todos(window(), 2000)
            .await
            .unwrap();

        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].remote_id.as_deref(), Some("ok"));
        assert_eq!(
            sink.sync_history(),
            vec![SyncStatus::Download, SyncStatus::SuccessWaiting]
        );
    }
}
