//! The canonical todo record.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::collect_tags;
use crate::date::{TodoDate, compare_dates};

/// Checkbox state of an open todo.
pub const DEFAULT_STATUS: &str = " ";

/// Task priority, written on a note line as a single emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn symbol(&self) -> &'static str {
        match self {
            Priority::None => "",
            Priority::Low => "🔽",
            Priority::Medium => "🔼",
            Priority::High => "⏫",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "🔽" => Some(Priority::Low),
            "🔼" => Some(Priority::Medium),
            "⏫" => Some(Priority::High),
            _ => None,
        }
    }

    /// Sort rank, highest priority first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
            Priority::None => 3,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Priority::None
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// The side-channel JSON stores the symbol, or null when unset.
impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Priority::None => serializer.serialize_none(),
            other => serializer.serialize_str(other.symbol()),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = Option::<String>::deserialize(deserializer)?;
        Ok(symbol
            .as_deref()
            .and_then(Priority::from_symbol)
            .unwrap_or_default())
    }
}

/// A task living in a note line and/or a remote calendar event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub content: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub tags: Option<Vec<String>>,
    pub start_date_time: Option<String>,
    pub scheduled_date_time: Option<String>,
    pub due_date_time: Option<String>,
    pub done_date_time: Option<String>,
    pub status: Option<String>,
    pub block_id: Option<String>,
    pub remote_id: Option<String>,
    pub remote_link: Option<String>,
    pub source_path: Option<PathBuf>,
    pub last_modified: Option<String>,
    pub children: Option<Vec<Todo>>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

fn overwrite<T: Clone>(target: &mut Option<T>, source: &Option<T>, keep: impl Fn(&T) -> bool) {
    if let Some(value) = source.as_ref().filter(|v| keep(v)) {
        *target = Some(value.clone());
    }
}

impl Todo {
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Status character, `" "` when unset.
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or(DEFAULT_STATUS)
    }

    pub fn has_default_status(&self) -> bool {
        self.status() == DEFAULT_STATUS
    }

    /// Done (`x`, `X`) or cancelled (`-`).
    pub fn is_terminal(&self) -> bool {
        matches!(self.status(), "x" | "X" | "-")
    }

    /// Additive merge: copies every field that is present on `other`.
    pub fn update_from(&mut self, other: &Todo) {
        let non_empty = |s: &String| !s.is_empty();

        overwrite(&mut self.content, &other.content, non_empty);
        if !other.priority.is_none() {
            self.priority = other.priority;
        }
        overwrite(&mut self.tags, &other.tags, |t: &Vec<String>| !t.is_empty());
        overwrite(&mut self.start_date_time, &other.start_date_time, non_empty);
        overwrite(&mut self.scheduled_date_time, &other.scheduled_date_time, non_empty);
        overwrite(&mut self.due_date_time, &other.due_date_time, non_empty);
        overwrite(&mut self.done_date_time, &other.done_date_time, non_empty);
        overwrite(&mut self.status, &other.status, non_empty);
        overwrite(&mut self.block_id, &other.block_id, non_empty);
        overwrite(&mut self.remote_id, &other.remote_id, non_empty);
        overwrite(&mut self.remote_link, &other.remote_link, non_empty);
        overwrite(&mut self.source_path, &other.source_path, |p: &PathBuf| {
            !p.as_os_str().is_empty()
        });
        overwrite(&mut self.last_modified, &other.last_modified, non_empty);
        overwrite(&mut self.children, &other.children, |c: &Vec<Todo>| !c.is_empty());
    }

    fn dates_identical(&self, other: &Todo) -> bool {
        [
            (&self.start_date_time, &other.start_date_time),
            (&self.scheduled_date_time, &other.scheduled_date_time),
            (&self.due_date_time, &other.due_date_time),
        ]
        .into_iter()
        .all(|(a, b)| compare_dates(a.as_deref(), b.as_deref()).is_eq())
    }

    /// Content-identical: same identity, payload and dates.
    pub fn identical_to(&self, other: &Todo) -> bool {
        self.content == other.content
            && self.priority == other.priority
            && self.tags == other.tags
            && self.remote_id == other.remote_id
            && self.source_path == other.source_path
            && self.block_id == other.block_id
            && self.last_modified == other.last_modified
            && self.dates_identical(other)
    }

    /// Whether the user-visible fields that a pull would write back agree.
    ///
    /// Unlike [`Todo::identical_to`] this ignores store-specific metadata
    /// (remote id, file path, modification time) and includes status.
    pub fn details_identical(&self, other: &Todo) -> bool {
        self.content == other.content
            && self.priority == other.priority
            && self.tags.as_deref().unwrap_or_default() == other.tags.as_deref().unwrap_or_default()
            && self.dates_identical(other)
            && compare_dates(self.done_date_time.as_deref(), other.done_date_time.as_deref())
                .is_eq()
            && self.status() == other.status()
    }

    /// Whether the todo is due strictly before `reference`.
    ///
    /// A bare due date is compared against the start of `reference`'s day.
    pub fn is_overdue<Tz: TimeZone>(&self, reference: &DateTime<Tz>) -> bool {
        if !present(&self.due_date_time) {
            return false;
        }

        match self.due_date_time.as_deref().and_then(TodoDate::parse) {
            Some(TodoDate::DateTime(due)) => due < reference.fixed_offset(),
            Some(TodoDate::Date(due)) => due < reference.date_naive(),
            None => false,
        }
    }

    /// Bring tags into their canonical place: every tag is written in
    /// `content`, and `tags` lists the tags of `content` in order.
    ///
    /// Tags missing from `content` are appended to it. Entries of `tags`
    /// that are not hash-tags are dropped.
    pub fn normalize_tags(&mut self) {
        let mut content = self.content().to_string();
        let mut embedded = collect_tags(&content);

        for tag in self.tags.iter().flatten() {
            let is_tag = collect_tags(tag).first() == Some(tag);
            if is_tag && !embedded.contains(tag) {
                if !content.is_empty() {
                    content.push(' ');
                }
                content.push_str(tag);
                embedded.push(tag.clone());
            }
        }

        self.tags = Some(collect_tags(&content)).filter(|t| !t.is_empty());
        self.content = Some(content).filter(|c| !c.is_empty());
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status(), self.content())?;
        if let Some(id) = &self.block_id {
            write!(f, " ^{}", id)?;
        }
        Ok(())
    }
}
