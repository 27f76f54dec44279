use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse the date forms users and the database produce: `YYYY-MM-DD`,
/// RFC 3339, and SQLite's `YYYY-MM-DD HH:MM:SS`. Offsets are folded to UTC.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.naive_utc());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(at);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `YYYY-MM-DD`, or `-` when the value is missing or not a date.
pub fn format_date(value: Option<&str>) -> String {
    value
        .and_then(parse_date)
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into())
}

/// Whole days from `start` to `end` as `"<n>d"`; `-` when either is missing
/// or the span is negative.
pub fn calculate_days(start: Option<&str>, end: Option<&str>) -> String {
    let (Some(start), Some(end)) = (start.and_then(parse_date), end.and_then(parse_date)) else {
        return "-".into();
    };
    let days = (end - start).num_seconds().div_euclid(86_400);
    if days >= 0 {
        format!("{days}d")
    } else {
        "-".into()
    }
}

pub fn format_relative_time(value: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(at) = value.and_then(parse_date) else {
        return String::new();
    };
    let seconds = (now.naive_utc() - at).num_seconds();

    match seconds {
        s if s < 60 => "just now".into(),
        s if s < 3_600 => format!("{} min ago", s / 60),
        s if s < 86_400 => format!("{} hours ago", s / 3_600),
        s if s < 604_800 => format!("{} days ago", s / 86_400),
        s if s < 2_592_000 => format!("{} weeks ago", s / 604_800),
        s if s < 31_536_000 => format!("{} months ago", s / 2_592_000),
        s => format!("{} years ago", s / 31_536_000),
    }
}
