//! Todo <-> remote event conversion.

use chrono_tz::Tz;

use crate::date::TodoDate;
use crate::error::{SyncError, SyncResult};
use crate::event::metadata::EventMetadata;
use crate::event::types::{Event, EventDateTime, EventPatch};
use crate::todo::{DEFAULT_STATUS, Todo};

/// Summary prefixes written by status patches.
const STATUS_ICONS: &[(&str, &str)] = &[
    ("x", "✅"),
    ("X", "✅"),
    ("-", "🚫"),
    ("!", "❗️"),
    (">", "💤"),
    ("?", "❓"),
    ("/", "🚧"),
];

fn status_icon(status: &str) -> Option<&'static str> {
    STATUS_ICONS
        .iter()
        .find(|(s, _)| *s == status)
        .map(|(_, icon)| *icon)
}

/// Statuses that survive a status patch unchanged; anything else becomes `x`.
fn normalize_status(status: Option<&str>) -> &str {
    match status {
        Some(s) if s == DEFAULT_STATUS || status_icon(s).is_some() => s,
        _ => "x",
    }
}

fn strip_status_icon(summary: &str) -> &str {
    for (_, icon) in STATUS_ICONS {
        let bare = icon.trim_end_matches('\u{FE0F}');
        for prefix in [*icon, bare] {
            if let Some(rest) = summary.strip_prefix(prefix) {
                return rest.trim_start();
            }
        }
    }
    summary
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Converts between todos and remote events.
///
/// Date-time intervals are sent with `tz` as their IANA zone.
#[derive(Debug, Clone, Copy)]
pub struct EventMapper {
    tz: Tz,
}

impl EventMapper {
    pub fn new(tz: Tz) -> Self {
        EventMapper { tz }
    }

    pub fn to_remote_event(&self, todo: &Todo) -> SyncResult<Event> {
        let (start, end) = self.interval(todo)?;

        Ok(Event {
            summary: Some(todo.content().to_string()),
            description: Some(EventMetadata::encode(todo)?),
            start: Some(start),
            end: Some(end),
            ..Default::default()
        })
    }

    fn interval(&self, todo: &Todo) -> SyncResult<(EventDateTime, EventDateTime)> {
        let parse = |value: Option<&str>, field: &str| -> SyncResult<Option<TodoDate>> {
            value
                .map(|v| {
                    TodoDate::parse(v).ok_or_else(|| {
                        SyncError::InvalidTodo(format!(
                            "'{}' has an unreadable {field} '{v}'",
                            todo.content()
                        ))
                    })
                })
                .transpose()
        };

        let start = parse(non_empty(&todo.start_date_time), "start date")?;
        let due = parse(non_empty(&todo.due_date_time), "due date")?;

        match (start, due) {
            (Some(TodoDate::DateTime(start)), Some(TodoDate::DateTime(due))) => {
                let zone = self.tz.name();
                Ok((
                    EventDateTime::date_time(start.to_rfc3339(), zone),
                    EventDateTime::date_time(due.to_rfc3339(), zone),
                ))
            }
            (Some(start), due) => {
                let end = due.unwrap_or(start);
                Ok((
                    EventDateTime::date(format_day(&start)),
                    EventDateTime::date(format_day(&end)),
                ))
            }
            (None, Some(due)) => Ok((
                EventDateTime::date(format_day(&due)),
                EventDateTime::date(format_day(&due)),
            )),
            (None, None) => Err(SyncError::InvalidTodo(format!(
                "'{}' has neither a start nor a due date",
                todo.content()
            ))),
        }
    }

    pub fn from_remote_event(&self, event: &Event) -> SyncResult<Todo> {
        let id = event.id.as_deref().unwrap_or("<unknown>");

        let start = event
            .start
            .as_ref()
            .ok_or_else(|| SyncError::MalformedEvent(format!("event {id} has no start")))?;
        let end = event
            .end
            .as_ref()
            .ok_or_else(|| SyncError::MalformedEvent(format!("event {id} has no end")))?;

        let metadata = event
            .description
            .as_deref()
            .map(EventMetadata::decode)
            .unwrap_or_default();

        let content = event.summary.as_deref().map(strip_status_icon).unwrap_or_default();

        let mut todo = Todo {
            content: Some(content.to_string()).filter(|c| !c.is_empty()),
            priority: metadata.priority,
            tags: Some(metadata.tags).filter(|t| !t.is_empty()),
            start_date_time: Some(read_event_time(start, id, "start")?),
            due_date_time: Some(read_event_time(end, id, "end")?),
            done_date_time: metadata.done_date_time,
            status: metadata.status,
            block_id: metadata.block_id,
            remote_id: event.id.clone(),
            remote_link: event.html_link.clone(),
            last_modified: event.updated.clone(),
            ..Default::default()
        };
        // A summary edited in the calendar may have lost tags the metadata still carries.
        todo.normalize_tags();
        Ok(todo)
    }

    /// Patch reflecting `todo`'s status on the remote event.
    ///
    /// The status is normalised first: absent or unrecognised becomes `x`.
    pub fn status_patch(&self, todo: &Todo) -> SyncResult<EventPatch> {
        let status = normalize_status(todo.status.as_deref());
        let normalized = Todo {
            status: Some(status.to_string()),
            ..todo.clone()
        };

        let summary = match status_icon(status) {
            Some(icon) => format!("{icon} {}", todo.content()),
            None => todo.content().to_string(),
        };

        Ok(EventPatch {
            summary: Some(summary),
            description: Some(EventMetadata::encode(&normalized)?),
        })
    }
}

fn format_day(date: &TodoDate) -> String {
    TodoDate::Date(date.date()).to_canonical()
}

fn read_event_time(time: &EventDateTime, id: &str, which: &str) -> SyncResult<String> {
    if let Some(date_time) = non_empty(&time.date_time) {
        return TodoDate::parse(date_time)
            .map(|d| d.to_canonical())
            .ok_or_else(|| {
                SyncError::MalformedEvent(format!("event {id} has an unreadable {which} '{date_time}'"))
            });
    }

    if let Some(date) = non_empty(&time.date) {
        return TodoDate::parse(date)
            .map(|d| TodoDate::Date(d.date()).to_canonical())
            .ok_or_else(|| {
                SyncError::MalformedEvent(format!("event {id} has an unreadable {which} '{date}'"))
            });
    }

    Err(SyncError::MalformedEvent(format!("event {id} has an empty {which}")))
}
