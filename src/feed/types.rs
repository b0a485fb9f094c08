use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

// ============================================================================
// Feed Records
// ============================================================================

/// One normalized entry derived from a single spreadsheet row.
///
/// Records are never mutated after construction. Filtering and sorting hand
/// out references to the records held by the refresh controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRecord {
    pub title: String,
    /// Empty when the sheet has no description column.
    pub description: String,
    /// External reference; empty when the sheet has no link column.
    pub link: String,
    /// `None` sorts before every dated record.
    pub published_at: Option<DateTime<Utc>>,
}

/// Records from one successful fetch, stamped with the time they arrived.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    pub records: Vec<FeedRecord>,
    pub fetched_at: DateTime<Utc>,
}

// ============================================================================
// Source Key
// ============================================================================

/// Identifies which spreadsheet, and which sheet within it, to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub spreadsheet_id: String,
    /// The sheet's `gid` as shown in the spreadsheet URL.
    pub sheet_id: String,
}

impl SourceKey {
    pub fn new(spreadsheet_id: impl Into<String>, sheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_id: sheet_id.into(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#gid={}", self.spreadsheet_id, self.sheet_id)
    }
}

// ============================================================================
// Sort Mode
// ============================================================================

/// Display order for the derived feed list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Newest,
    Oldest,
    Alphabetical,
}

impl SortMode {
    /// Human-readable label used by the dashboard.
    pub fn label(self) -> &'static str {
        match self {
            SortMode::Newest => "Newest First",
            SortMode::Oldest => "Oldest First",
            SortMode::Alphabetical => "Alphabetical",
        }
    }

    /// Next mode in the dashboard's cycle order.
    pub fn next(self) -> Self {
        match self {
            SortMode::Newest => SortMode::Oldest,
            SortMode::Oldest => SortMode::Alphabetical,
            SortMode::Alphabetical => SortMode::Newest,
        }
    }
}
