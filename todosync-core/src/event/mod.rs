//! Remote calendar event types and their mapping to todos.

mod mapper;
mod metadata;
mod types;

pub use mapper::EventMapper;
pub use metadata::EventMetadata;
pub use types::{Event, EventDateTime, EventPatch};
