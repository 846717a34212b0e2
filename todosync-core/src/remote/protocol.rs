//! JSON protocol spoken with provider binaries over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::event::{Event, EventPatch};

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListEvents,
    InsertEvent,
    PatchEvent,
    DeleteEvent,
}

/// Request sent to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent back by a provider.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

/// Single page of events starting at `from`, ordered by start time, with
/// recurring events expanded into single occurrences.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub from: String,
    pub max_results: u32,
}

impl ProviderCommand for ListEvents {
    type Response = Vec<Event>;
    fn command() -> Command {
        Command::ListEvents
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event: Event,
}

impl ProviderCommand for InsertEvent {
    type Response = Event;
    fn command() -> Command {
        Command::InsertEvent
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PatchEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event_id: String,
    pub patch: EventPatch,
}

impl ProviderCommand for PatchEvent {
    type Response = ();
    fn command() -> Command {
        Command::PatchEvent
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event_id: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}
