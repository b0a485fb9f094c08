//! Spreadsheet feed ingestion and display derivation.
//!
//! This module turns a published spreadsheet into a list of feed records:
//!
//! - **Fetching**: HTTP retrieval of a sheet's CSV export, always bypassing caches
//! - **Parsing**: Quote-aware row splitting and header-driven column mapping
//! - **Viewing**: Filtering by free-text query and sorting for display
//!
//! # Architecture
//!
//! - [`csv`] - Single-line CSV splitting
//! - [`parser`] - Header resolution and row-to-record conversion
//! - [`fetcher`] - HTTP client, error taxonomy, and the never-failing [`fetch_feed`]
//! - [`view`] - The pure filter/sort step run on every render
//!
//! # Example
//!
//! ```ignore
//! use sheetfeed::feed::{derive_view, fetch_feed, SheetsClient, SortMode, SourceKey};
//!
//! let client = SheetsClient::new(SheetsClient::DEFAULT_BASE_URL, Duration::from_secs(30))?;
//! let records = fetch_feed(&client, &SourceKey::new("spreadsheet-id", "0")).await;
//! let visible = derive_view(&records, "cardio", SortMode::Newest);
//! ```

mod csv;
mod fetcher;
mod parser;
mod types;
mod view;

pub use csv::parse_row;
pub use fetcher::{fetch_feed, FeedSource, FetchError, SheetsClient};
pub use parser::{parse_published, parse_records, ColumnMap, ParseResult};
pub use types::{FeedRecord, FetchedFeed, SortMode, SourceKey};
pub use view::derive_view;
