//! Core of todosync: keeps todos in a markdown vault and events in a remote
//! calendar in agreement.
//!
//! - `codec` reads and writes single task lines
//! - `vault` finds, identifies and rewrites those lines on disk
//! - `event` and `remote` map todos to calendar events and talk to providers
//! - `reconcile` decides what moves in which direction

pub mod codec;
pub mod config;
pub mod date;
pub mod error;
pub mod event;
pub mod query;
pub mod queue;
pub mod reconcile;
pub mod remote;
pub mod status;
pub mod todo;
pub mod vault;

#[cfg(test)]
mod testing;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use query::Query;
pub use todo::{Priority, Todo};
