//! Classifying local and remote todos into mutations.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::date::{TodoDate, compare_dates};
use crate::error::SyncError;
use crate::reconcile::{DiffKind, TodoDiff};
use crate::todo::Todo;

/// Which side wins when local and remote statuses disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusAuthority {
    /// The calendar is the record of completion: a set remote status is
    /// pulled, and the local status is only pushed while the remote one is
    /// still open.
    #[default]
    Remote,
    /// A set local status is pushed; a remote status is only pulled while
    /// the local one is still open.
    Local,
}

impl FromStr for StatusAuthority {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remote" => Ok(StatusAuthority::Remote),
            "local" => Ok(StatusAuthority::Local),
            other => Err(SyncError::Config(format!(
                "status_authority must be 'remote' or 'local', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for StatusAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusAuthority::Remote => write!(f, "remote"),
            StatusAuthority::Local => write!(f, "local"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusFlow {
    Push,
    Pull,
}

fn status_flow(local: &Todo, remote: &Todo, authority: StatusAuthority) -> Option<StatusFlow> {
    if local.status() == remote.status() {
        return None;
    }

    match authority {
        StatusAuthority::Remote if !remote.has_default_status() => Some(StatusFlow::Pull),
        StatusAuthority::Remote if !local.has_default_status() => Some(StatusFlow::Push),
        StatusAuthority::Local if !local.has_default_status() => Some(StatusFlow::Push),
        StatusAuthority::Local if !remote.has_default_status() => Some(StatusFlow::Pull),
        _ => None,
    }
}

fn same_day_coarser(local: Option<&str>, remote: Option<&str>) -> bool {
    match (local.and_then(TodoDate::parse), remote.and_then(TodoDate::parse)) {
        (Some(TodoDate::DateTime(l)), Some(TodoDate::Date(r))) => l.date_naive() == r,
        _ => false,
    }
}

/// The part of `remote` a pull may write into `local`.
///
/// Identity fields never move, status only moves when the status flows
/// towards the vault, and interval artefacts of the calendar are dropped:
/// a due date mirrored from the start, or a bare date standing in for a
/// local date-time on the same day.
fn incoming(remote: &Todo, local: &Todo, pull_status: bool) -> Todo {
    let mut incoming = remote.clone();
    incoming.block_id = None;
    incoming.source_path = None;

    if !pull_status {
        incoming.status = None;
    }

    let local_has_due = local.due_date_time.as_deref().is_some_and(|d| !d.is_empty());
    if !local_has_due
        && compare_dates(remote.due_date_time.as_deref(), remote.start_date_time.as_deref())
            .is_eq()
    {
        incoming.due_date_time = None;
    }

    if same_day_coarser(local.start_date_time.as_deref(), incoming.start_date_time.as_deref()) {
        incoming.start_date_time = None;
    }
    if same_day_coarser(local.due_date_time.as_deref(), incoming.due_date_time.as_deref()) {
        incoming.due_date_time = None;
    }

    incoming
}

/// Everything one reconciliation pass intends to do.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// Inserts and status patches for the remote calendar.
    pub to_push: Vec<TodoDiff>,
    /// Line rewrites for the vault.
    pub to_pull: Vec<TodoDiff>,
    /// Remote todos with no block id.
    pub remote_created: Vec<Todo>,
    /// Remote todos that are not done or cancelled, linked to their note
    /// where one is known.
    pub active: Vec<Todo>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_push.is_empty() && self.to_pull.is_empty()
    }

    pub fn build(local: Vec<Todo>, remote: Vec<Todo>, authority: StatusAuthority) -> Self {
        let mut local_order: Vec<String> = Vec::new();
        let mut local_by_id: HashMap<String, Todo> = HashMap::new();
        for todo in local {
            let Some(id) = todo.block_id.clone() else {
                continue;
            };
            if local_by_id.contains_key(&id) {
                warn!(block_id = %id, content = todo.content(), "Duplicate local block id, keeping the first");
                continue;
            }
            local_order.push(id.clone());
            local_by_id.insert(id, todo);
        }

        let mut remote_by_id: HashMap<String, Todo> = HashMap::new();
        let mut remote_created = Vec::new();
        let mut active = Vec::new();
        for todo in remote {
            let mut annotated = todo.clone();

            match todo.block_id.clone() {
                None => remote_created.push(todo),
                Some(id) => {
                    if let Some(local) = local_by_id.get(&id) {
                        annotated.source_path = local.source_path.clone();
                    }
                    if remote_by_id.contains_key(&id) {
                        warn!(block_id = %id, "Duplicate remote block id, keeping the first");
                    } else {
                        remote_by_id.insert(id, todo);
                    }
                }
            }

            if !annotated.is_terminal() {
                active.push(annotated);
            }
        }

        let mut to_push = Vec::new();
        let mut to_pull = Vec::new();

        for id in &local_order {
            let local = &local_by_id[id];

            let Some(remote) = remote_by_id.get(id) else {
                debug!(block_id = %id, content = local.content(), "Not on remote, inserting");
                to_push.push(TodoDiff::insert(local.clone()));
                continue;
            };

            let flow = status_flow(local, remote, authority);
            if flow == Some(StatusFlow::Push) {
                debug!(block_id = %id, status = local.status(), "Pushing local status");
                let mut patched = local.clone();
                patched.remote_id = remote.remote_id.clone();
                to_push.push(TodoDiff::patch(patched, remote.clone()));
            }

            let mut merged = local.clone();
            merged.update_from(&incoming(remote, local, flow == Some(StatusFlow::Pull)));
            merged.normalize_tags();
            if !merged.details_identical(local) {
                debug!(block_id = %id, content = merged.content(), "Pulling remote changes");
                to_pull.push(TodoDiff::pull(merged, local.clone()));
            }
        }

        let by_start = |a: &TodoDiff, b: &TodoDiff| {
            compare_dates(
                a.todo.start_date_time.as_deref(),
                b.todo.start_date_time.as_deref(),
            )
        };
        to_push.sort_by(by_start);
        to_pull.sort_by(by_start);

        ReconcilePlan {
            to_push,
            to_pull,
            remote_created,
            active,
        }
    }

    pub fn count(&self, kind: DiffKind) -> usize {
        self.to_push
            .iter()
            .chain(&self.to_pull)
            .filter(|d| d.kind == kind)
            .count()
    }
}
