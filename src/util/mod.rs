//! Utility functions for the dashboard.
//!
//! - **Text**: Unicode-aware width calculation, truncation, and control
//!   character stripping for untrusted sheet cells
//! - **Time**: Calendar and relative ("5 minutes ago") formatting
//! - **Links**: Validation before handing a record's link to the browser

mod text;
mod time;
mod url_validator;

pub use text::{display_width, strip_control_chars, truncate_to_width};
pub use time::{format_date, format_distance, format_distance_to_now};
pub use url_validator::{validate_link, LinkValidationError};

/// Maximum search query length accepted from the search box.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
