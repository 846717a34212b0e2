//! Emoji markers and the trailing-token patterns built from them.

use std::sync::LazyLock;

use regex::Regex;

pub const START_MARKER: &str = "🛫";
pub const SCHEDULED_MARKER: &str = "⌛";
pub const DUE_MARKER: &str = "🗓";
pub const DONE_MARKER: &str = "✅";
pub const BLOCK_ID_PREFIX: &str = "^";

const DATE: &str = r"([0-9]{4}-[0-9]{2}-[0-9]{2})";
const DATE_TIME: &str = r"([0-9]{4}-[0-9]{2}-[0-9]{2}@[0-9]+:[0-9]+)";
const TAG: &str = r#"#[^\s!@#$%^\&*(),.?":{}|<>]+"#;

/// Patterns recognised at the end of a task body.
///
/// Every pattern is anchored at `$` so tokens can be peeled off one at a time.
pub struct Symbols {
    pub priority: Regex,
    pub block_id: Regex,
    pub start_date: Regex,
    pub start_date_time: Regex,
    pub scheduled_date: Regex,
    pub scheduled_date_time: Regex,
    pub due_date: Regex,
    pub due_date_time: Regex,
    pub done_date: Regex,
    pub trailing_tag: Regex,
    pub any_tag: Regex,
}

fn marker(emojis: &str, value: &str) -> Regex {
    let pattern = format!(r"(?:{emojis})\x{{FE0F}}? *{value}$");
    Regex::new(&pattern).unwrap()
}

impl Symbols {
    fn new() -> Self {
        Symbols {
            priority: Regex::new(r"([⏫🔼🔽])$").unwrap(),
            block_id: Regex::new(r"\^([0-9a-zA-Z]+)$").unwrap(),
            start_date: marker("🛫", DATE),
            start_date_time: marker("🛫", DATE_TIME),
            scheduled_date: marker("⏳|⌛", DATE),
            scheduled_date_time: marker("⏳|⌛", DATE_TIME),
            due_date: marker("📅|📆|🗓", DATE),
            due_date_time: marker("📅|📆|🗓", DATE_TIME),
            done_date: marker("✅", DATE),
            trailing_tag: Regex::new(&format!(r"(?:^|\s)({TAG})$")).unwrap(),
            any_tag: Regex::new(&format!(r"(?:^|\s)({TAG})")).unwrap(),
        }
    }
}

pub static SYMBOLS: LazyLock<Symbols> = LazyLock::new(Symbols::new);
