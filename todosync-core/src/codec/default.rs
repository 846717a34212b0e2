//! The emoji line format used by the Obsidian Tasks plugin.

use chrono_tz::Tz;
use regex::Regex;

use crate::codec::symbols::{
    BLOCK_ID_PREFIX, DONE_MARKER, DUE_MARKER, SCHEDULED_MARKER, START_MARKER, SYMBOLS,
};
use crate::codec::{TodoDetails, TodoSerializer, collect_tags};
use crate::date::{self, TodoDate};
use crate::todo::{Priority, Todo};

/// Upper bound on token-stripping passes over one line.
pub const MAX_RUNS: usize = 20;

/// Serializer for `content #tags ⏫ 🛫 date ⌛ date 🗓 date ✅ date ^id` lines.
///
/// Date-times on a line carry no offset; they are read and written in `tz`.
#[derive(Debug, Clone, Copy)]
pub struct DefaultTodoSerializer {
    tz: Tz,
}

impl DefaultTodoSerializer {
    pub fn new(tz: Tz) -> Self {
        DefaultTodoSerializer { tz }
    }

    fn date_component(&self, marker: &str, value: &str) -> String {
        if date::is_date_time(value) {
            if let Some(formatted) = date::format_line_date_time(value, self.tz) {
                return format!("{marker} {formatted}");
            }
        }
        format!("{marker} {value}")
    }

    fn done_component(&self, value: &str) -> String {
        let day = match TodoDate::parse(value) {
            Some(TodoDate::DateTime(dt)) => dt
                .with_timezone(&self.tz)
                .format(date::DATE_FORMAT)
                .to_string(),
            _ => value.to_string(),
        };
        format!("{DONE_MARKER} {day}")
    }
}

/// Remove the token `pattern` matches at the end of `line`.
///
/// The token is only removed when `parse` accepts its captured value, so
/// unparseable tokens stay part of the content.
fn take_trailing<T>(
    line: &mut String,
    pattern: &Regex,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Option<T> {
    let caps = pattern.captures(line)?;
    let value = parse(caps.get(1)?.as_str())?;
    let start = caps.get(0)?.start();

    line.truncate(start);
    let trimmed = line.trim_end().len();
    line.truncate(trimmed);

    Some(value)
}

impl TodoSerializer for DefaultTodoSerializer {
    fn serialize(&self, todo: &Todo) -> String {
        let mut components: Vec<String> = Vec::new();

        let content = todo.content();
        if !content.is_empty() {
            components.push(content.to_string());
        }

        let embedded = collect_tags(content);
        for tag in todo.tags.iter().flatten() {
            if !embedded.contains(tag) && !components.contains(tag) {
                components.push(tag.clone());
            }
        }

        if !todo.priority.is_none() {
            components.push(todo.priority.symbol().to_string());
        }

        let dates = [
            (START_MARKER, &todo.start_date_time),
            (SCHEDULED_MARKER, &todo.scheduled_date_time),
            (DUE_MARKER, &todo.due_date_time),
        ];
        for (marker, value) in dates {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                components.push(self.date_component(marker, value));
            }
        }

        if let Some(done) = todo.done_date_time.as_deref().filter(|v| !v.is_empty()) {
            components.push(self.done_component(done));
        }

        if let Some(id) = todo.block_id.as_deref().filter(|v| !v.is_empty()) {
            components.push(format!("{BLOCK_ID_PREFIX}{id}"));
        }

        components.join(" ")
    }

    fn deserialize(&self, line: &str) -> TodoDetails {
        let tz = self.tz;
        let mut line = line.trim().to_string();
        let mut details = TodoDetails::default();
        let mut trailing_tags: Vec<String> = Vec::new();

        // Tokens may appear in any order; keep peeling until a pass removes nothing.
        for _ in 0..MAX_RUNS {
            let mut matched = false;

            if let Some(priority) = take_trailing(&mut line, &SYMBOLS.priority, Priority::from_symbol) {
                details.priority = priority;
                matched = true;
            }

            if let Some(id) = take_trailing(&mut line, &SYMBOLS.block_id, |s| Some(s.to_string())) {
                details.block_id = Some(id);
                matched = true;
            }

            if let Some(start) = take_trailing(&mut line, &SYMBOLS.start_date, date::parse_line_date) {
                details.start_date_time = Some(start);
                matched = true;
            }

            if let Some(start) = take_trailing(&mut line, &SYMBOLS.start_date_time, |s| {
                date::parse_line_date_time(s, tz)
            }) {
                details.start_date_time = Some(start);
                matched = true;
            }

            if let Some(due) = take_trailing(&mut line, &SYMBOLS.due_date, date::parse_line_date) {
                details.due_date_time = Some(due);
                matched = true;
            }

            if let Some(due) = take_trailing(&mut line, &SYMBOLS.due_date_time, |s| {
                date::parse_line_date_time(s, tz)
            }) {
                details.due_date_time = Some(due);
                matched = true;
            }

            if let Some(done) = take_trailing(&mut line, &SYMBOLS.done_date, date::parse_line_date) {
                details.done_date_time = Some(done);
                matched = true;
            }

            if let Some(scheduled) =
                take_trailing(&mut line, &SYMBOLS.scheduled_date, date::parse_line_date)
            {
                details.scheduled_date_time = Some(scheduled);
                matched = true;
            }

            if let Some(scheduled) = take_trailing(&mut line, &SYMBOLS.scheduled_date_time, |s| {
                date::parse_line_date_time(s, tz)
            }) {
                details.scheduled_date_time = Some(scheduled);
                matched = true;
            }

            if let Some(tag) = take_trailing(&mut line, &SYMBOLS.trailing_tag, |s| Some(s.to_string())) {
                // Peeled right to left.
                trailing_tags.insert(0, tag);
                matched = true;
            }

            if !matched {
                break;
            }
        }

        if !trailing_tags.is_empty() {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&trailing_tags.join(" "));
        }

        details.tags = collect_tags(&line);
        details.content = line;
        details
    }
}
