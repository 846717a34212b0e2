//! Display queries: YAML documents that select, sort and group todos.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::date::{TodoDate, compare_dates};
use crate::error::{SyncError, SyncResult};
use crate::todo::Todo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    DateDesc,
    Priority,
    PriorityDesc,
}

impl FromStr for SortKey {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortKey::Date),
            "dateDESC" => Ok(SortKey::DateDesc),
            "priority" => Ok(SortKey::Priority),
            "priorityDESC" => Ok(SortKey::PriorityDesc),
            other => Err(SyncError::Query(format!(
                "sorting: unknown option '{other}' (expected date, dateDESC, priority or priorityDESC)"
            ))),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortKey::Date => "date",
            SortKey::DateDesc => "dateDESC",
            SortKey::Priority => "priority",
            SortKey::PriorityDesc => "priorityDESC",
        };
        write!(f, "{}", s)
    }
}

impl SortKey {
    fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        match self {
            SortKey::Date => by_start(a, b),
            SortKey::DateDesc => by_start(a, b).reverse(),
            SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortKey::PriorityDesc => a.priority.rank().cmp(&b.priority.rank()).reverse(),
        }
    }
}

fn by_start(a: &Todo, b: &Todo) -> Ordering {
    compare_dates(a.start_date_time.as_deref(), b.start_date_time.as_deref())
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawQuery {
    name: Option<String>,
    filter: Option<String>,
    time_min: Option<String>,
    time_max: Option<String>,
    max_events: Option<usize>,
    group: Option<bool>,
    sorting: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub name: Option<String>,
    pub filter: Option<String>,
    pub time_min: Option<TodoDate>,
    pub time_max: Option<TodoDate>,
    pub max_events: Option<usize>,
    pub group: bool,
    pub sorting: Vec<SortKey>,
}

fn bound(key: &str, value: Option<String>) -> SyncResult<Option<TodoDate>> {
    value
        .map(|v| {
            TodoDate::parse(&v)
                .ok_or_else(|| SyncError::Query(format!("{key}: '{v}' is not a valid date")))
        })
        .transpose()
}

impl Query {
    pub fn parse(yaml: &str) -> SyncResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Query::default());
        }

        let raw: RawQuery = serde_yaml::from_str::<Option<RawQuery>>(yaml)
            .map_err(|e| SyncError::Query(e.to_string()))?
            .unwrap_or_default();

        let sorting = raw
            .sorting
            .unwrap_or_default()
            .iter()
            .map(|s| s.parse())
            .collect::<SyncResult<Vec<SortKey>>>()?;

        Ok(Query {
            name: raw.name,
            filter: raw.filter.filter(|f| !f.is_empty()),
            time_min: bound("timeMin", raw.time_min)?,
            time_max: bound("timeMax", raw.time_max)?,
            max_events: raw.max_events,
            group: raw.group.unwrap_or(false),
            sorting,
        })
    }

    /// Every query held in a ```` ```todosync ```` fenced block of a note.
    pub fn from_note(note: &str) -> SyncResult<Vec<Self>> {
        let mut queries = Vec::new();
        let mut block: Option<Vec<&str>> = None;

        for line in note.lines() {
            let fence = line.trim_start();
            match block.as_mut() {
                None if fence.trim_end() == "```todosync" => block = Some(Vec::new()),
                None => {}
                Some(lines) if fence.trim_end() == "```" => {
                    queries.push(Query::parse(&lines.join("\n"))?);
                    block = None;
                }
                Some(lines) => lines.push(line),
            }
        }
        Ok(queries)
    }

    fn in_range(&self, todo: &Todo) -> bool {
        if self.time_min.is_none() && self.time_max.is_none() {
            return true;
        }
        let Some(start) = todo.start_date_time.as_deref().and_then(TodoDate::parse) else {
            return false;
        };

        let after_min = self
            .time_min
            .as_ref()
            .is_none_or(|min| start.cmp_instant(min) != Ordering::Less);
        // A bare upper date includes its whole day.
        let before_max = match &self.time_max {
            None => true,
            Some(TodoDate::Date(max)) => start.date() <= *max,
            Some(max) => start.cmp_instant(max) != Ordering::Greater,
        };
        after_min && before_max
    }

    fn matches(&self, todo: &Todo) -> bool {
        let filtered = match &self.filter {
            Some(filter) => todo
                .content()
                .to_lowercase()
                .contains(&filter.to_lowercase()),
            None => true,
        };
        filtered && self.in_range(todo)
    }

    /// Select, sort and truncate.
    pub fn apply(&self, todos: Vec<Todo>) -> Vec<Todo> {
        let mut selected: Vec<Todo> = todos.into_iter().filter(|t| self.matches(t)).collect();

        selected.sort_by(|a, b| {
            self.sorting
                .iter()
                .map(|key| key.compare(a, b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        if let Some(max) = self.max_events {
            selected.truncate(max);
        }
        selected
    }

    /// Split `todos` by start day, keeping their order. Without `group`,
    /// everything lands in a single unlabelled group.
    pub fn groups(&self, todos: Vec<Todo>) -> Vec<(Option<NaiveDate>, Vec<Todo>)> {
        if !self.group {
            return vec![(None, todos)];
        }

        let mut groups: Vec<(Option<NaiveDate>, Vec<Todo>)> = Vec::new();
        for todo in todos {
            let day = todo
                .start_date_time
                .as_deref()
                .and_then(TodoDate::parse)
                .map(|d| d.date());

            match groups.iter_mut().find(|(d, _)| *d == day) {
                Some((_, members)) => members.push(todo),
                None => groups.push((day, vec![todo])),
            }
        }
        groups
    }
}
