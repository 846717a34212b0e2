//! The JSON kept in an event's description for fields calendars cannot model.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{SyncError, SyncResult};
use crate::todo::{Priority, Todo};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventMetadataRef<'a> {
    status: &'a str,
    block_id: Option<&'a str>,
    priority: Priority,
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    done_date_time: Option<&'a str>,
}

/// Metadata recovered from a description. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventMetadata {
    pub status: Option<String>,
    pub block_id: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub done_date_time: Option<String>,
}

impl EventMetadata {
    /// Encode `todo`'s side-channel fields.
    pub fn encode(todo: &Todo) -> SyncResult<String> {
        let metadata = EventMetadataRef {
            status: todo.status(),
            block_id: todo.block_id.as_deref(),
            priority: todo.priority,
            tags: todo.tags.as_deref().unwrap_or_default(),
            done_date_time: todo.done_date_time.as_deref(),
        };
        serde_json::to_string(&metadata).map_err(|e| SyncError::Serialization(e.to_string()))
    }

    /// Decode a description, keeping whatever fields parse.
    ///
    /// A description that is not a JSON object yields empty metadata. A
    /// field of the wrong type is logged and skipped without affecting the
    /// others.
    pub fn decode(description: &str) -> Self {
        let map = match serde_json::from_str::<Value>(description) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                if !description.trim().is_empty() {
                    warn!("Event description is not metadata JSON, ignoring it");
                }
                return EventMetadata::default();
            }
        };

        EventMetadata {
            status: field::<String>(&map, "status"),
            block_id: field::<String>(&map, "blockId").filter(|id| !id.is_empty()),
            priority: field::<Priority>(&map, "priority").unwrap_or_default(),
            tags: field::<Vec<String>>(&map, "tags").unwrap_or_default(),
            done_date_time: field::<String>(&map, "doneDateTime"),
        }
    }
}

fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    let value = map.get(key)?;
    match serde_json::from_value::<Option<T>>(value.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(key, error = %e, "Ignoring malformed event metadata field");
            None
        }
    }
}
