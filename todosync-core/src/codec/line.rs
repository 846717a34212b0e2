//! Markdown task line structure: `<indent><marker> [<status>] <body>`.

use std::sync::LazyLock;

use regex::Regex;

static TASK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\s\t>]*)([-*]|[0-9]+\.) +\[(.)\] *(.*)$").unwrap());

/// A parsed markdown checkbox line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLine<'a> {
    pub indent: &'a str,
    pub marker: &'a str,
    pub status: char,
    pub body: &'a str,
}

impl<'a> TaskLine<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let caps = TASK_LINE.captures(line)?;
        let status = caps.get(3)?.as_str().chars().next()?;

        Some(TaskLine {
            indent: caps.get(1).map_or("", |m| m.as_str()),
            marker: caps.get(2)?.as_str(),
            status,
            body: caps.get(4).map_or("", |m| m.as_str()),
        })
    }

    fn render(&self, status: char, body: &str) -> String {
        if body.is_empty() {
            format!("{}{} [{}]", self.indent, self.marker, status)
        } else {
            format!("{}{} [{}] {}", self.indent, self.marker, status, body)
        }
    }

    /// The same line with a different checkbox state.
    pub fn with_status(&self, status: char) -> String {
        self.render(status, self.body)
    }

    /// The same prefix followed by a new body.
    pub fn with_body(&self, status: char, body: &str) -> String {
        self.render(status, body)
    }
}
