//! Conversion between a todo and the text of a note line.

mod default;
mod line;
mod symbols;

pub use default::{DefaultTodoSerializer, MAX_RUNS};
pub use line::TaskLine;
pub use symbols::{SYMBOLS, Symbols};

use crate::todo::{Priority, Todo};

/// Fields of a [`Todo`] that can be read from the text after the checkbox.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoDetails {
    pub content: String,
    pub block_id: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub start_date_time: Option<String>,
    pub scheduled_date_time: Option<String>,
    pub due_date_time: Option<String>,
    pub done_date_time: Option<String>,
}

impl From<TodoDetails> for Todo {
    fn from(details: TodoDetails) -> Self {
        Todo {
            content: Some(details.content).filter(|c| !c.is_empty()),
            priority: details.priority,
            tags: Some(details.tags).filter(|t| !t.is_empty()),
            start_date_time: details.start_date_time,
            scheduled_date_time: details.scheduled_date_time,
            due_date_time: details.due_date_time,
            done_date_time: details.done_date_time,
            block_id: details.block_id,
            ..Default::default()
        }
    }
}

pub trait TodoSerializer: Send + Sync {
    /// Render the text that follows the checkbox.
    fn serialize(&self, todo: &Todo) -> String;

    /// Parse the text that follows the checkbox. Never fails; anything
    /// unrecognised stays in `content`.
    fn deserialize(&self, line: &str) -> TodoDetails;
}

/// Every hash-tag in `content`, in order of first appearance.
pub fn collect_tags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for caps in SYMBOLS.any_tag.captures_iter(content) {
        let tag = caps[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_tags_dedups_in_order() {
        assert_eq!(
            collect_tags("#b plan #a and #b again"),
            vec!["#b".to_string(), "#a".to_string()]
        );
        assert!(collect_tags("no tags, issue#12").is_empty());
    }

    #[test]
    fn test_details_into_todo_drops_empty_fields() {
        let todo = Todo::from(TodoDetails::default());
        assert_eq!(todo.content, None);
        assert_eq!(todo.tags, None);
        assert_eq!(todo.priority, Priority::None);
    }
}
