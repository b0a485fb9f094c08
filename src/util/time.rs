use chrono::{DateTime, Utc};

/// Short calendar date for a record ("Mar 5, 2024"), or "No date".
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => "No date".to_string(),
    }
}

/// Relative age of `then` as seen from `now` ("just now", "5 minutes ago").
///
/// Times in the future read as "just now".
pub fn format_distance(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();

    fn plural(n: i64, unit: &str) -> String {
        if n == 1 {
            format!("1 {unit} ago")
        } else {
            format!("{n} {unit}s ago")
        }
    }

    match secs {
        s if s < 5 => "just now".to_string(),
        s if s < 60 => format!("{s} seconds ago"),
        s if s < 3600 => plural(s / 60, "minute"),
        s if s < 86_400 => plural(s / 3600, "hour"),
        s => plural(s / 86_400, "day"),
    }
}

/// [`format_distance`] against the current time.
pub fn format_distance_to_now(then: DateTime<Utc>) -> String {
    format_distance(then, Utc::now())
}
