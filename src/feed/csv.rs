//! Single-line CSV splitting.
//!
//! Spreadsheet exports quote fields that contain commas. Quote characters
//! toggle the "inside quotes" state and are dropped from the output. A doubled
//! quote (`""`) is two toggles, so it yields no literal `"` character.

/// Split one CSV line into its fields.
///
/// Never fails: every input, including the empty string, produces at least
/// one (possibly empty) field. An unterminated quote swallows the rest of the
/// line into the current field.
///
/// # Examples
///
/// ```
/// use sheetfeed::feed::parse_row;
///
/// assert_eq!(parse_row("a,\"b,c\",d"), vec!["a", "b,c", "d"]);
/// assert_eq!(parse_row(""), vec![""]);
/// ```
pub fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    fields.push(current);
    fields
}
