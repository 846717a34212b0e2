//! Line rewrites applied to a note under the store lock.

use crate::codec::{TaskLine, TodoSerializer};
use crate::error::{SyncError, SyncResult};
use crate::todo::Todo;

/// Produces the new lines of a note given the line that holds a todo.
pub trait LineRewrite: Send + Sync {
    fn rewrite(&self, lines: Vec<String>, index: usize) -> SyncResult<Vec<String>>;
}

fn task_line<'a>(lines: &'a [String], index: usize) -> SyncResult<TaskLine<'a>> {
    let line = lines
        .get(index)
        .ok_or_else(|| SyncError::InvalidReference(format!("line {index} is out of range")))?;
    TaskLine::parse(line)
        .ok_or_else(|| SyncError::InvalidReference(format!("line {index} is not a task: {line}")))
}

/// Removes the todo's line.
pub struct DeleteLine;

impl LineRewrite for DeleteLine {
    fn rewrite(&self, mut lines: Vec<String>, index: usize) -> SyncResult<Vec<String>> {
        if index < lines.len() {
            lines.remove(index);
        }
        Ok(lines)
    }
}

/// Replaces the checkbox state and leaves the rest of the line alone.
pub struct SetStatus(pub char);

/// `- [ ]` -> `- [x]`.
pub const MARK_DONE: SetStatus = SetStatus('x');

impl LineRewrite for SetStatus {
    fn rewrite(&self, mut lines: Vec<String>, index: usize) -> SyncResult<Vec<String>> {
        let updated = task_line(&lines, index)?.with_status(self.0);
        lines[index] = updated;
        Ok(lines)
    }
}

/// Re-renders everything after the checkbox from the todo's fields.
///
/// The checkbox takes the todo's status.
pub struct Resync<'a> {
    pub todo: &'a Todo,
    pub serializer: &'a dyn TodoSerializer,
}

impl LineRewrite for Resync<'_> {
    fn rewrite(&self, mut lines: Vec<String>, index: usize) -> SyncResult<Vec<String>> {
        let status = self.todo.status().chars().next().unwrap_or(' ');
        let body = self.serializer.serialize(self.todo);
        let updated = task_line(&lines, index)?.with_body(status, &body);
        lines[index] = updated;
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DefaultTodoSerializer;

    fn lines(text: &str) -> Vec<String> {
        text.split('\n').map(str::to_string).collect()
    }

    #[test]
    fn test_delete_line() {
        let result = DeleteLine
            .rewrite(lines("# Today\n- [ ] a ^A1\n- [ ] b ^B2"), 1)
            .unwrap();
        assert_eq!(result, lines("# Today\n- [ ] b ^B2"));
    }

    #[test]
    fn test_mark_done_only_touches_checkbox() {
        let result = MARK_DONE
            .rewrite(lines("  - [ ] Buy milk 🛫 2024-01-01 ^AB12CD34"), 0)
            .unwrap();
        assert_eq!(result, lines("  - [x] Buy milk 🛫 2024-01-01 ^AB12CD34"));
    }

    #[test]
    fn test_set_status_on_non_task_fails() {
        assert!(matches!(
            SetStatus('x').rewrite(lines("plain text ^AB12CD34"), 0),
            Err(SyncError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_resync_rewrites_body_and_checkbox() {
        let serializer = DefaultTodoSerializer::new(chrono_tz::Tz::UTC);
        let todo = Todo {
            content: Some("Buy oat milk".into()),
            start_date_time: Some("2024-01-01".into()),
            status: Some("x".into()),
            block_id: Some("AB12CD34".into()),
            ..Default::default()
        };
        let rewrite = Resync {
            todo: &todo,
            serializer: &serializer,
        };

        let result = rewrite
            .rewrite(lines("> * [ ] Buy milk 🛫 2024-01-01 ^AB12CD34\nnext"), 0)
            .unwrap();
        assert_eq!(
            result,
            lines("> * [x] Buy oat milk 🛫 2024-01-01 ^AB12CD34\nnext")
        );
    }
}
