//! Colored terminal rendering for todosync-core types.

use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;
use todosync_core::reconcile::{DiffKind, ReconcilePlan, ReconcileReport, TodoDiff};
use todosync_core::todo::Todo;

pub trait Render {
    fn render(&self) -> String;
}

fn colorize_diff(kind: DiffKind, text: &str) -> String {
    match kind {
        DiffKind::Insert => text.green().to_string(),
        DiffKind::Patch => text.yellow().to_string(),
        DiffKind::Pull => text.cyan().to_string(),
    }
}

impl Render for DiffKind {
    fn render(&self) -> String {
        colorize_diff(*self, &self.to_string())
    }
}

impl Render for TodoDiff {
    fn render(&self) -> String {
        let todo = &self.todo;
        let mut line = format!(
            "{} {}",
            self.kind.render(),
            colorize_diff(self.kind, todo.content())
        );

        let status_changed = self
            .previous
            .as_ref()
            .is_some_and(|p| p.status() != todo.status());
        if status_changed {
            let from = self.previous.as_ref().map(|p| p.status()).unwrap_or(" ");
            line.push_str(&format!(" [{}] → [{}]", from, todo.status()).dimmed().to_string());
        }
        if let Some(start) = &todo.start_date_time {
            line.push_str(&format!(" {}", start.dimmed()));
        }
        line
    }
}

impl Render for Todo {
    fn render(&self) -> String {
        let checkbox = format!("[{}]", self.status());
        let content = if self.is_overdue(&Local::now()) {
            self.content().red().to_string()
        } else {
            self.content().to_string()
        };

        let mut line = format!("{} {}", checkbox.dimmed(), content);
        if !self.priority.is_none() {
            line.push_str(&format!(" {}", self.priority.symbol()));
        }
        if let Some(due) = &self.due_date_time {
            line.push_str(&format!(" {}", format!("due {}", due).dimmed()));
        }
        if let Some(id) = &self.block_id {
            line.push_str(&format!(" {}", format!("^{}", id).dimmed()));
        }
        line
    }
}

fn render_diff_list(title: &str, diffs: &[TodoDiff], lines: &mut Vec<String>) {
    if diffs.is_empty() {
        return;
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!("   {}", title.dimmed()));
    for diff in diffs {
        lines.push(format!("   {}", diff.render()));
    }
}

impl Render for ReconcilePlan {
    fn render(&self) -> String {
        if self.is_empty() {
            return "   Everything in sync".dimmed().to_string();
        }

        let mut lines = Vec::new();
        render_diff_list("Local changes (to push):", &self.to_push, &mut lines);
        render_diff_list("Remote changes (to pull):", &self.to_pull, &mut lines);
        lines.join("\n")
    }
}

impl Render for ReconcileReport {
    fn render(&self) -> String {
        let summary = self.to_string();
        let mut lines = vec![if self.is_clean() {
            summary.green().to_string()
        } else {
            summary.yellow().to_string()
        }];
        for error in &self.errors {
            lines.push(format!("   {}", error.red()));
        }
        lines.join("\n")
    }
}

/// Heading for a group of todos sharing a start day.
pub fn render_day(day: Option<NaiveDate>) -> String {
    match day {
        Some(day) => format!("📅 {}", day.format("%a %Y-%m-%d")).bold().to_string(),
        None => "📅 No date".bold().to_string(),
    }
}
