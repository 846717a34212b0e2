//! Date handling for todo fields.
//!
//! Todo dates are kept as strings in one of two canonical forms: a bare date
//! (`2024-01-01`) or a date-time with offset (`2024-01-01T09:30:00+0100`).
//! Note lines use `2024-01-01@09:30` for the latter, read in the configured
//! time zone.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta,
    TimeZone,
};
use chrono_tz::Tz;
use regex::Regex;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";
pub const LINE_DATE_TIME_FORMAT: &str = "%Y-%m-%d@%H:%M";

static DATE_TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T").unwrap());

/// A parsed todo date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoDate {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl TodoDate {
    /// Parse either canonical form. Returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if is_date_time(value) {
            DateTime::parse_from_rfc3339(value)
                .or_else(|_| DateTime::parse_from_str(value, DATE_TIME_FORMAT))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                        .ok()
                        .map(|dt| dt.and_utc().fixed_offset())
                })
                .map(TodoDate::DateTime)
        } else {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .map(TodoDate::Date)
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            TodoDate::Date(d) => *d,
            TodoDate::DateTime(dt) => dt.date_naive(),
        }
    }

    pub fn is_date_time(&self) -> bool {
        matches!(self, TodoDate::DateTime(_))
    }

    /// Format in the canonical internal form.
    pub fn to_canonical(&self) -> String {
        match self {
            TodoDate::Date(d) => d.format(DATE_FORMAT).to_string(),
            TodoDate::DateTime(dt) => dt.format(DATE_TIME_FORMAT).to_string(),
        }
    }

    /// Compare two dates by the instant they denote.
    ///
    /// A bare date stands for the start of its day in the other side's offset.
    pub fn cmp_instant(&self, other: &TodoDate) -> Ordering {
        match (self, other) {
            (TodoDate::Date(a), TodoDate::Date(b)) => a.cmp(b),
            (TodoDate::DateTime(a), TodoDate::DateTime(b)) => a.cmp(b),
            (TodoDate::Date(a), TodoDate::DateTime(b)) => start_of_day(*a, *b.offset()).cmp(b),
            (TodoDate::DateTime(a), TodoDate::Date(b)) => a.cmp(&start_of_day(*b, *a.offset())),
        }
    }
}

/// Whether `value` looks like a date-time (`YYYY-MM-DDT...`).
pub fn is_date_time(value: &str) -> bool {
    DATE_TIME_PATTERN.is_match(value.trim())
}

/// Null-safe, invalid-safe ordering of two optional date strings.
///
/// Absent sorts before invalid, invalid sorts before valid. Two invalid
/// values fall back to plain string ordering.
pub fn compare_dates(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.filter(|s| !s.trim().is_empty());
    let b = b.filter(|s| !s.trim().is_empty());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (TodoDate::parse(a), TodoDate::parse(b)) {
            (None, None) => a.cmp(b),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp_instant(&b),
        },
    }
}

/// Parse a line date (`YYYY-MM-DD`) into the canonical form.
pub fn parse_line_date(value: &str) -> Option<String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .ok()
        .map(|d| d.format(DATE_FORMAT).to_string())
}

/// Parse a line date-time (`YYYY-MM-DD@HH:mm`) in `tz` into the canonical form.
///
/// Local times that do not exist in `tz` (DST gaps) are rejected.
pub fn parse_line_date_time(value: &str, tz: Tz) -> Option<String> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), LINE_DATE_TIME_FORMAT).ok()?;
    let local = tz.from_local_datetime(&naive).earliest()?;
    Some(local.fixed_offset().format(DATE_TIME_FORMAT).to_string())
}

/// Format a canonical date-time for a note line, in `tz`.
pub fn format_line_date_time(value: &str, tz: Tz) -> Option<String> {
    match TodoDate::parse(value)? {
        TodoDate::DateTime(dt) => Some(dt.with_timezone(&tz).format(LINE_DATE_TIME_FORMAT).to_string()),
        TodoDate::Date(_) => None,
    }
}

/// The process's local IANA zone, falling back to UTC.
pub fn local_time_zone() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC)
}

/// Start of the reconciliation window: `weeks` before `now`, at start of day.
pub fn window_start(now: DateTime<Tz>, weeks: u32) -> DateTime<FixedOffset> {
    let day = (now - Duration::weeks(weeks.into())).date_naive();
    let tz = now.timezone();
    let start = tz
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.fixed_offset());

    start.unwrap_or_else(|| start_of_day(day, now.offset().fix()))
}

fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<FixedOffset> {
    let local = date.and_time(NaiveTime::MIN);
    let utc = local - TimeDelta::seconds(offset.local_minus_utc().into());
    DateTime::from_naive_utc_and_offset(utc, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_canonical_forms() {
        assert_eq!(
            TodoDate::parse("2024-01-01"),
            Some(TodoDate::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
        );

        let dt = TodoDate::parse("2024-01-01T09:30:00+0100").unwrap();
        assert!(dt.is_date_time());
        assert_eq!(dt.to_canonical(), "2024-01-01T09:30:00+0100");

        let rfc = TodoDate::parse("2024-01-01T09:30:00+01:00").unwrap();
        assert_eq!(rfc, dt);
    }

    #[test]
    fn test_parse_rejects_invalid_dates() {
        assert_eq!(TodoDate::parse("2024-13-45"), None);
        assert_eq!(TodoDate::parse("tomorrow"), None);
        assert_eq!(TodoDate::parse("2024-01-01Tnope"), None);
    }

    #[test]
    fn test_compare_dates_orders_absent_and_invalid_first() {
        assert_eq!(compare_dates(None, None), Ordering::Equal);
        assert_eq!(compare_dates(None, Some("2024-01-01")), Ordering::Less);
        assert_eq!(compare_dates(Some("garbage"), Some("2024-01-01")), Ordering::Less);
        assert_eq!(compare_dates(Some("2024-01-02"), Some("garbage")), Ordering::Greater);
        assert_eq!(compare_dates(Some(""), None), Ordering::Equal);
    }

    #[test]
    fn test_compare_dates_is_instant_aware() {
        assert_eq!(
            compare_dates(
                Some("2024-01-01T10:00:00+0100"),
                Some("2024-01-01T09:00:00+0000")
            ),
            Ordering::Equal
        );
        assert_eq!(
            compare_dates(Some("2024-01-01"), Some("2024-01-01T00:00:00+0000")),
            Ordering::Equal
        );
        assert_eq!(
            compare_dates(Some("2024-01-01"), Some("2024-01-01T08:00:00+0000")),
            Ordering::Less
        );
    }

    #[test]
    fn test_line_date_time_roundtrip_in_zone() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let canonical = parse_line_date_time("2024-01-01@09:30", tz).unwrap();
        assert_eq!(canonical, "2024-01-01T09:30:00+0100");
        assert_eq!(
            format_line_date_time(&canonical, tz).as_deref(),
            Some("2024-01-01@09:30")
        );
    }

    #[test]
    fn test_line_date_time_accepts_single_digit_hour() {
        assert_eq!(
            parse_line_date_time("2024-06-01@9:05", Tz::UTC).as_deref(),
            Some("2024-06-01T09:05:00+0000")
        );
    }

    #[test]
    fn test_window_start_is_start_of_day() {
        let now = Tz::UTC.with_ymd_and_hms(2024, 3, 29, 15, 45, 0).unwrap();
        let start = window_start(now, 4);
        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(*start.offset(), FixedOffset::east_opt(0).unwrap());
    }
}
