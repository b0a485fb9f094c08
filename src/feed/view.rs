use std::cmp::Ordering;

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use super::types::{FeedRecord, SortMode};

/// Derive the display list from fetched records.
///
/// Keeps records whose title or description contains `query`
/// (case-insensitive; an empty query keeps everything), then sorts them
/// stably by `sort_mode`. The input is left untouched and the result borrows
/// from it, so calling this on every render is cheap enough for sheet-sized
/// feeds.
pub fn derive_view<'a>(
    records: &'a [FeedRecord],
    query: &str,
    sort_mode: SortMode,
) -> Vec<&'a FeedRecord> {
    let needle = query.to_lowercase();

    let mut view: Vec<&FeedRecord> = records
        .iter()
        .filter(|r| needle.is_empty() || matches_query(r, &needle))
        .collect();

    match sort_mode {
        SortMode::Alphabetical => view.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortMode::Newest => view.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
        SortMode::Oldest => view.sort_by(|a, b| a.published_at.cmp(&b.published_at)),
    }

    view
}

/// `needle` must already be lowercased.
fn matches_query(record: &FeedRecord, needle: &str) -> bool {
    record.title.to_lowercase().contains(needle)
        || record.description.to_lowercase().contains(needle)
}

/// Title order close to a locale collation: base letters first (accents and
/// case ignored), then accents, then the raw text so that "apple" and "Apple"
/// still have a deterministic order.
fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Lowercased base letters: NFD-decomposed with combining marks dropped.
fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
