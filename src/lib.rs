//! Spreadsheet-backed alert feeds.
//!
//! Fetches a published spreadsheet's CSV export, turns its rows into
//! [`feed::FeedRecord`]s, keeps them fresh with a
//! [`refresh::RefreshController`], and derives the filtered, sorted list a
//! dashboard displays with [`feed::derive_view`].

pub mod config;
pub mod feed;
pub mod refresh;
pub mod util;
