use std::fmt;

use crate::reconcile::DiffKind;
use crate::todo::Todo;

/// One planned mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoDiff {
    pub kind: DiffKind,
    /// The todo as it should end up on the target side.
    pub todo: Todo,
    /// The target side's current version, if it has one.
    pub previous: Option<Todo>,
}

impl TodoDiff {
    pub fn insert(todo: Todo) -> Self {
        TodoDiff {
            kind: DiffKind::Insert,
            todo,
            previous: None,
        }
    }

    pub fn patch(todo: Todo, remote: Todo) -> Self {
        TodoDiff {
            kind: DiffKind::Patch,
            todo,
            previous: Some(remote),
        }
    }

    pub fn pull(merged: Todo, local: Todo) -> Self {
        TodoDiff {
            kind: DiffKind::Pull,
            todo: merged,
            previous: Some(local),
        }
    }

    pub fn block_id(&self) -> Option<&str> {
        self.todo.block_id.as_deref()
    }
}

impl fmt::Display for TodoDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.todo)
    }
}
