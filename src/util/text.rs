use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Display width of a string in terminal columns (CJK and emoji count as 2).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate `s` to at most `max_width` terminal columns, appending "..." when
/// something was cut.
///
/// Widths of 3 or less have no room for an ellipsis, so the text is simply
/// clipped. Borrows when nothing needs to change.
///
/// # Examples
///
/// ```
/// use sheetfeed::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    if max_width <= ELLIPSIS_WIDTH {
        return Cow::Owned(take_columns(s, max_width).to_string());
    }

    let kept = take_columns(s, max_width - ELLIPSIS_WIDTH);
    Cow::Owned(format!("{kept}{ELLIPSIS}"))
}

/// Longest prefix of `s` that fits in `columns`.
fn take_columns(s: &str, columns: usize) -> &str {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > columns {
            return &s[..idx];
        }
        used += w;
    }
    s
}

/// Remove terminal control characters and ANSI escape sequences.
///
/// Sheet cells are untrusted and rendered straight into the terminal.
/// Tabs and newlines are kept; CSI (`ESC [ ... final`) and OSC
/// (`ESC ] ... BEL` or `ESC ] ... ESC \`) sequences are dropped whole.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_control = |c: char| c == '\x7f' || (c < ' ' && c != '\t' && c != '\n' && c != '\r');
    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            if !is_control(c) {
                out.push(c);
            }
            continue;
        }

        match chars.peek() {
            Some('[') => {
                chars.next();
                // Parameters and intermediates until the final byte.
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_truncation() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Short", 10), "Short");
        assert_eq!(truncate_to_width("Exactly", 7), "Exactly");
    }

    #[test]
    fn test_cjk_truncation() {
        // 2 columns per character: "日本" (4) + "..." (3) = 7
        assert_eq!(truncate_to_width("日本語です", 7), "日本...");
    }

    #[test]
    fn test_narrow_widths() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "T");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
    }

    #[test]
    fn test_fitting_text_is_borrowed() {
        assert!(matches!(truncate_to_width("fits", 10), Cow::Borrowed(_)));
        assert!(matches!(strip_control_chars("clean\ttext\n"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_csi_and_osc() {
        assert_eq!(strip_control_chars("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(strip_control_chars("a\x1b]0;title\x07b"), "ab");
        assert_eq!(strip_control_chars("a\x1b]8;;x\x1b\\b"), "ab");
    }

    #[test]
    fn test_strip_bare_controls() {
        assert_eq!(strip_control_chars("a\x00b\x08c\x7fd"), "abcd");
        assert_eq!(strip_control_chars("keep\ttabs\r\n"), "keep\ttabs\r\n");
    }
}
