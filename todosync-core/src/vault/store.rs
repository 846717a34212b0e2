//! Reading and editing todos inside vault notes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, RwLock};

use chrono::{DateTime, FixedOffset, NaiveDate};
use regex::Regex;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::codec::{TaskLine, TodoSerializer};
use crate::date;
use crate::error::{SyncError, SyncResult};
use crate::todo::Todo;
use crate::vault::block_id::{line_has_block_id, unique_block_id};
use crate::vault::rewrite::{DeleteLine, LineRewrite, MARK_DONE, Resync};
use crate::vault::VaultStore;

static START_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"🛫+\x{FE0F}? *([0-9]{4}-[0-9]{2}-[0-9]{2})").unwrap());

/// Who asked for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    /// Periodic scan; leaves the line being edited alone.
    #[default]
    Auto,
    /// Explicitly requested by the user.
    Manual,
}

/// The line a human is currently editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCursor {
    pub path: PathBuf,
    pub line: usize,
}

/// Adapter over a [`VaultStore`] that finds and rewrites todo lines.
///
/// Every read-modify-write of a note happens under one store-wide lock.
pub struct LocalStore {
    vault: Arc<dyn VaultStore>,
    serializer: Arc<dyn TodoSerializer>,
    lock: Mutex<()>,
    cursor: RwLock<Option<EditorCursor>>,
}

fn split_lines(content: &str) -> Vec<String> {
    content.split('\n').map(str::to_string).collect()
}

fn start_day(body: &str) -> Option<NaiveDate> {
    let caps = START_DATE.captures(body)?;
    NaiveDate::parse_from_str(&caps[1], date::DATE_FORMAT).ok()
}

impl LocalStore {
    pub fn new(vault: Arc<dyn VaultStore>, serializer: Arc<dyn TodoSerializer>) -> Self {
        LocalStore {
            vault,
            serializer,
            lock: Mutex::new(()),
            cursor: RwLock::new(None),
        }
    }

    /// Record where the user is typing, so [`ListMode::Auto`] scans skip it.
    pub fn set_cursor(&self, cursor: Option<EditorCursor>) {
        if let Ok(mut current) = self.cursor.write() {
            *current = cursor;
        }
    }

    fn is_under_cursor(&self, path: &Path, line: usize) -> bool {
        self.cursor
            .read()
            .ok()
            .and_then(|c| c.as_ref().map(|c| c.path == path && c.line == line))
            .unwrap_or(false)
    }

    /// Todos whose start date is on or after the day of `window_start`.
    ///
    /// Task lines without an identifier get one written back first.
    pub async fn list_tasks(
        &self,
        window_start: DateTime<FixedOffset>,
        mode: ListMode,
    ) -> SyncResult<Vec<Todo>> {
        let window_day = window_start.date_naive();
        let mut todos = Vec::new();

        for path in self.vault.list().await? {
            match self.scan_file(&path, window_day, mode).await {
                Ok(found) => todos.extend(found),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to scan note"),
            }
        }

        debug!(count = todos.len(), "Listed local todos");
        Ok(todos)
    }

    async fn scan_file(
        &self,
        path: &Path,
        window_day: NaiveDate,
        mode: ListMode,
    ) -> SyncResult<Vec<Todo>> {
        let _guard = self.lock.lock().await;

        let mut lines = split_lines(&self.vault.read(path).await?);
        let mut todos = Vec::new();
        let mut dirty = false;

        for index in 0..lines.len() {
            let Some(task) = TaskLine::parse(&lines[index]) else {
                continue;
            };
            if !start_day(task.body).is_some_and(|day| day >= window_day) {
                continue;
            }

            let status = task.status.to_string();
            let mut details = self.serializer.deserialize(task.body);

            if details.block_id.is_none() {
                if mode == ListMode::Auto && self.is_under_cursor(path, index) {
                    debug!(path = %path.display(), line = index, "Task is being edited, skipping");
                    continue;
                }

                let id = unique_block_id(task.body, |candidate| {
                    lines.iter().any(|l| line_has_block_id(l, candidate))
                });
                debug!(path = %path.display(), block_id = %id, "Assigning block id");

                let tagged = format!("{} ^{}", lines[index].trim_end(), id);
                lines[index] = tagged;
                details.block_id = Some(id);
                dirty = true;
            }

            let mut todo = Todo::from(details);
            todo.status = Some(status);
            todo.source_path = Some(path.to_path_buf());
            todos.push(todo);
        }

        if dirty {
            self.vault.write(path, &lines.join("\n")).await?;
        }

        Ok(todos)
    }

    /// Apply `rewrite` to the line holding `todo`'s block id.
    ///
    /// Returns `Ok(false)` when no such line exists any more.
    pub async fn locate_and_update(
        &self,
        todo: &Todo,
        rewrite: &dyn LineRewrite,
    ) -> SyncResult<bool> {
        let (Some(path), Some(block_id)) = (todo.source_path.as_deref(), todo.block_id.as_deref())
        else {
            return Err(SyncError::InvalidReference(format!(
                "'{}' has no source path or block id",
                todo.content()
            )));
        };

        let _guard = self.lock.lock().await;

        let lines = split_lines(&self.vault.read(path).await?);
        let Some(index) = lines.iter().rposition(|l| line_has_block_id(l, block_id)) else {
            warn!(
                content = todo.content(),
                path = %path.display(),
                block_id,
                "Line for todo not found, leaving note unchanged"
            );
            return Ok(false);
        };

        let updated = rewrite.rewrite(lines, index)?;
        self.vault.write(path, &updated.join("\n")).await?;
        Ok(true)
    }

    pub async fn delete(&self, todo: &Todo) -> SyncResult<bool> {
        self.locate_and_update(todo, &DeleteLine).await
    }

    pub async fn patch(&self, todo: &Todo, rewrite: &dyn LineRewrite) -> SyncResult<bool> {
        self.locate_and_update(todo, rewrite).await
    }

    /// Rewrite the todo's line from its current fields.
    pub async fn update(&self, todo: &Todo) -> SyncResult<bool> {
        let rewrite = Resync {
            todo,
            serializer: self.serializer.as_ref(),
        };
        self.locate_and_update(todo, &rewrite).await
    }

    pub async fn mark_done(&self, todo: &Todo) -> SyncResult<bool> {
        self.locate_and_update(todo, &MARK_DONE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DefaultTodoSerializer;
    use crate::testing::MemoryVault;
    use crate::vault::block_id::block_id_for;
    use chrono::TimeZone;

    fn store(vault: Arc<MemoryVault>) -> LocalStore {
        LocalStore::new(vault, Arc::new(DefaultTodoSerializer::new(chrono_tz::Tz::UTC)))
    }

    fn window() -> DateTime<FixedOffset> {
        chrono::Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap()
            .fixed_offset()
    }

    #[tokio::test]
    async fn test_list_tasks_reads_window_and_status() {
        let vault = Arc::new(MemoryVault::with_files(&[(
            "daily.md",
            "# Tasks\n- [ ] Buy milk 🛫 2024-01-01 ^AB12CD34\n- [x] Old 🛫 2023-12-01 ^OLD1\n- [/] No start ^NS1\n  - [/] Paint 🛫 2024-02-01 ^PT1",
        )]));
        let todos = store(vault.clone()).list_tasks(window(), ListMode::Manual).await.unwrap();

        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].content(), "Buy milk");
        assert_eq!(todos[0].status(), " ");
        assert_eq!(todos[0].block_id.as_deref(), Some("AB12CD34"));
        assert_eq!(todos[0].source_path, Some(PathBuf::from("daily.md")));
        assert_eq!(todos[1].status(), "/");
        assert_eq!(vault.writes(), 0, "nothing to assign, nothing written");
    }

    #[tokio::test]
    async fn test_block_id_assignment_is_idempotent() {
        let vault = Arc::new(MemoryVault::with_files(&[(
            "daily.md",
            "- [ ] Buy milk 🛫 2024-01-01\n",
        )]));
        let store = store(vault.clone());

        let first = store.list_tasks(window(), ListMode::Manual).await.unwrap();
        let after_first = vault.content("daily.md");
        let second = store.list_tasks(window(), ListMode::Manual).await.unwrap();

        let expected = block_id_for("Buy milk 🛫 2024-01-01");
        assert_eq!(first[0].block_id.as_deref(), Some(expected.as_str()));
        assert_eq!(second[0].block_id, first[0].block_id);
        assert_eq!(after_first, format!("- [ ] Buy milk 🛫 2024-01-01 ^{expected}\n"));
        assert_eq!(vault.content("daily.md"), after_first);
        assert_eq!(vault.writes(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_lines_get_distinct_ids() {
        let vault = Arc::new(MemoryVault::with_files(&[(
            "daily.md",
            "- [ ] Stretch 🛫 2024-01-02\n- [ ] Stretch 🛫 2024-01-02",
        )]));
        let todos = store(vault).list_tasks(window(), ListMode::Manual).await.unwrap();
        assert_eq!(todos.len(), 2);
        assert_ne!(todos[0].block_id, todos[1].block_id);
    }

    #[tokio::test]
    async fn test_auto_mode_skips_line_under_cursor() {
        let vault = Arc::new(MemoryVault::with_files(&[(
            "daily.md",
            "- [ ] Typing 🛫 2024-01-02\n- [ ] Done typing 🛫 2024-01-02",
        )]));
        let store = store(vault.clone());
        store.set_cursor(Some(EditorCursor {
            path: PathBuf::from("daily.md"),
            line: 0,
        }));

        let auto = store.list_tasks(window(), ListMode::Auto).await.unwrap();
        assert_eq!(auto.len(), 1);
        assert_eq!(auto[0].content(), "Done typing");
        assert!(vault.content("daily.md").starts_with("- [ ] Typing 🛫 2024-01-02\n"));

        let manual = store.list_tasks(window(), ListMode::Manual).await.unwrap();
        assert_eq!(manual.len(), 2);
    }

    #[tokio::test]
    async fn test_locate_and_update_requires_reference() {
        let store = store(Arc::new(MemoryVault::default()));
        let todo = Todo {
            content: Some("orphan".into()),
            block_id: Some("AB12".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.mark_done(&todo).await,
            Err(SyncError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_line_is_not_an_error() {
        let vault = Arc::new(MemoryVault::with_files(&[("daily.md", "- [ ] other ^ZZ9")]));
        let store = store(vault.clone());
        let todo = Todo {
            block_id: Some("AB12".into()),
            source_path: Some(PathBuf::from("daily.md")),
            ..Default::default()
        };
        assert!(!store.mark_done(&todo).await.unwrap());
        assert_eq!(vault.content("daily.md"), "- [ ] other ^ZZ9");
        assert_eq!(vault.writes(), 0);
    }

    #[tokio::test]
    async fn test_mark_done_update_and_delete() {
        let vault = Arc::new(MemoryVault::with_files(&[(
            "daily.md",
            "intro\n- [ ] Buy milk 🛫 2024-01-01 ^AB12CD34\noutro",
        )]));
        let store = store(vault.clone());
        let mut todo = Todo {
            content: Some("Buy milk".into()),
            start_date_time: Some("2024-01-01".into()),
            block_id: Some("AB12CD34".into()),
            source_path: Some(PathBuf::from("daily.md")),
            ..Default::default()
        };

        assert!(store.mark_done(&todo).await.unwrap());
        assert_eq!(
            vault.content("daily.md"),
            "intro\n- [x] Buy milk 🛫 2024-01-01 ^AB12CD34\noutro"
        );

        todo.content = Some("Buy oat milk".into());
        todo.status = Some("x".into());
        assert!(store.update(&todo).await.unwrap());
        assert_eq!(
            vault.content("daily.md"),
            "intro\n- [x] Buy oat milk 🛫 2024-01-01 ^AB12CD34\noutro"
        );

        assert!(store.delete(&todo).await.unwrap());
        assert_eq!(vault.content("daily.md"), "intro\noutro");
    }

    /// Adds an indented note under the todo's line.
    struct AppendNote(&'static str);

    impl LineRewrite for AppendNote {
        fn rewrite(&self, mut lines: Vec<String>, index: usize) -> SyncResult<Vec<String>> {
            lines.insert(index + 1, format!("    - {}", self.0));
            Ok(lines)
        }
    }

    #[tokio::test]
    async fn test_patch_applies_custom_rewrite() {
        let vault = Arc::new(MemoryVault::with_files(&[(
            "daily.md",
            "- [ ] Buy milk 🛫 2024-01-01 ^AB12CD34
- [ ] Call Bob ^XY9",
        )]));
        let store = store(vault.clone());
        let todo = Todo {
            block_id: Some("AB12CD34".into()),
            source_path: Some(PathBuf::from("daily.md")),
            ..Default::default()
        };

        assert!(store.patch(&todo, &AppendNote("oat, not dairy")).await.unwrap());
        assert_eq!(
            vault.content("daily.md"),
            "- [ ] Buy milk 🛫 2024-01-01 ^AB12CD34
    - oat, not dairy
- [ ] Call Bob ^XY9"
        );
        assert_eq!(vault.writes(), 1);

        let gone = Todo {
            block_id: Some("GONE".into()),
            ..todo
        };
        assert!(!store.patch(&gone, &AppendNote("lost")).await.unwrap());
        assert_eq!(vault.writes(), 1);
    }

    #[tokio::test]
    async fn test_failed_rewrite_releases_lock() {
        let vault = Arc::new(MemoryVault::with_files(&[("daily.md", "not a task ^AB12")]));
        let store = store(vault.clone());
        let todo = Todo {
            block_id: Some("AB12".into()),
            source_path: Some(PathBuf::from("daily.md")),
            ..Default::default()
        };

        assert!(store.mark_done(&todo).await.is_err());
        // A second call would hang if the guard leaked.
        assert!(store.delete(&todo).await.unwrap());
        assert_eq!(vault.content("daily.md"), "");
    }

    #[tokio::test]
    async fn test_concurrent_edits_do_not_lose_updates() {
        let vault = Arc::new(MemoryVault::with_files(&[(
            "daily.md",
            "- [ ] One 🛫 2024-01-02 ^ONE\n- [ ] Two 🛫 2024-01-02 ^TWO\n- [ ] New 🛫 2024-01-02",
        )]));
        vault.set_yield_on_io(true);
        let store = store(vault.clone());
        let reference = |id: &str| Todo {
            block_id: Some(id.into()),
            source_path: Some(PathBuf::from("daily.md")),
            ..Default::default()
        };
        let one = reference("ONE");
        let two = reference("TWO");

        let (a, b, listed) = tokio::join!(
            store.mark_done(&one),
            store.mark_done(&two),
            store.list_tasks(window(), ListMode::Manual),
        );
        assert!(a.unwrap() && b.unwrap());
        assert_eq!(listed.unwrap().len(), 3);

        let content = vault.content("daily.md");
        assert!(content.contains("- [x] One"), "{content}");
        assert!(content.contains("- [x] Two"), "{content}");
        assert!(content.contains(&format!("^{}", block_id_for("New 🛫 2024-01-02"))));
    }
}
