use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::csv::parse_row;
use super::types::FeedRecord;

/// Column positions resolved from a header row.
///
/// Each field holds the index of the first header containing the keyword
/// (case-insensitive substring match), or `None` when no header matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub title: Option<usize>,
    pub description: Option<usize>,
    pub link: Option<usize>,
    pub date: Option<usize>,
}

impl ColumnMap {
    pub fn from_header(headers: &[String]) -> Self {
        let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let find = |keyword: &str| lowered.iter().position(|h| h.contains(keyword));

        Self {
            title: find("title"),
            description: find("description"),
            link: find("link"),
            date: find("date"),
        }
    }

    /// Minimum number of fields a row needs so every resolved column exists.
    ///
    /// Zero when no column was resolved.
    pub fn required_len(&self) -> usize {
        [self.title, self.description, self.link, self.date]
            .into_iter()
            .flatten()
            .max()
            .map_or(0, |max| max + 1)
    }
}

/// Outcome of parsing a CSV export.
///
/// Dropped rows are counted for diagnostics only; they never make the parse
/// fail.
#[derive(Debug, Default)]
pub struct ParseResult {
    pub records: Vec<FeedRecord>,
    /// Rows with fewer fields than the resolved columns require.
    pub short_rows: usize,
    /// Rows whose title field was empty.
    pub untitled_rows: usize,
}

/// Parse an exported sheet into feed records, in file order.
///
/// The first line is the header. Blank lines are ignored, short rows and rows
/// without a title are dropped, and a missing or unparsable date falls back
/// to `now`.
pub fn parse_records(csv_text: &str, now: DateTime<Utc>) -> ParseResult {
    let mut lines = csv_text.lines();
    let mut result = ParseResult::default();

    let Some(header_line) = lines.next() else {
        return result;
    };
    let columns = ColumnMap::from_header(&parse_row(header_line));
    let required = columns.required_len();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let fields = parse_row(line);
        if fields.len() < required {
            result.short_rows += 1;
            continue;
        }

        let field = |idx: Option<usize>| idx.and_then(|i| fields.get(i));

        let title = field(columns.title).cloned().unwrap_or_default();
        if title.is_empty() {
            result.untitled_rows += 1;
            continue;
        }

        let published_at = field(columns.date)
            .and_then(|d| parse_published(d))
            .unwrap_or(now);

        result.records.push(FeedRecord {
            title,
            description: field(columns.description).cloned().unwrap_or_default(),
            link: field(columns.link).cloned().unwrap_or_default(),
            published_at: Some(published_at),
        });
    }

    result
}

/// Datetime layouts seen in spreadsheet exports, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Parse a date cell. Values without an offset are taken as UTC.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}
