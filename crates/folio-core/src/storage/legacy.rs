//! The pre-1.7 `bookmarks.txt` format
//!
//! Three lines per bookmark, no header:
//!
//! ```text
//! 0001f30d 1600000000.0 gemini://example.org/
//! Example
//! news user-icon
//! ```
//!
//! The first line is an 8-digit hex icon, a separator, fractional creation
//! seconds and the URL. The file carries no ids, parents or order.

use crate::links;
use crate::models::Bookmark;

use super::ini::timestamp_from_secs;

/// Width of the icon field including its trailing separator
const ICON_FIELD_WIDTH: usize = 9;

/// Split a leading run of characters matching `accept`
fn split_prefix(s: &str, accept: impl Fn(char) -> bool) -> (&str, &str) {
    let end = s.find(|c: char| !accept(c)).unwrap_or(s.len());
    s.split_at(end)
}

/// Read the `<icon><sep><seconds> <url>` line
fn parse_record_line(line: &str) -> Bookmark {
    let mut bm = Bookmark::new();

    let hex = line.trim_start();
    let hex = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    let (digits, _) = split_prefix(hex, |c| c.is_ascii_hexdigit());
    bm.icon = u32::from_str_radix(digits, 16).unwrap_or(0);

    let rest = line.get(ICON_FIELD_WIDTH..).unwrap_or("").trim_start();
    let (number, rest) = split_prefix(rest, |c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    bm.created_at = timestamp_from_secs(number.parse().unwrap_or(0.0));
    bm.url = links::canonical(rest.trim_start());
    bm
}

/// Parse a legacy bookmark file
///
/// Returned records have no ids yet; the store assigns them in file order.
pub fn parse(text: &str) -> Vec<Bookmark> {
    let mut bookmarks = Vec::new();
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }
        let mut bm = parse_record_line(line);
        bm.title = lines.next().unwrap_or("").to_string();
        bm.tags = lines.next().unwrap_or("").to_string();
        bookmarks.push(bm);
    }
    bookmarks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records() {
        let text = "0001f30d 1600000000.25 gemini://example.org\n\
                    Example\n\
                    news user-icon\n\
                    \n\
                    00000000 1500000000 gemini://Other.example:1965/page.gmi\n\
                    Other\n\
                    \n";
        let bookmarks = parse(text);
        assert_eq!(bookmarks.len(), 2);

        let first = &bookmarks[0];
        assert_eq!(first.icon, 0x1f30d);
        assert_eq!(first.created_at.timestamp(), 1_600_000_000);
        assert_eq!(first.url, "gemini://example.org/");
        assert_eq!(first.title, "Example");
        assert_eq!(first.tags, "news user-icon");

        let second = &bookmarks[1];
        assert_eq!(second.icon, 0);
        assert_eq!(second.url, "gemini://other.example/page.gmi");
        assert_eq!(second.title, "Other");
        assert!(second.tags.is_empty());
        assert_eq!(second.id, 0);
    }

    #[test]
    fn test_parse_truncated_file() {
        let bookmarks = parse("00002913 1600000000 gemini://example.org/");
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].icon, 0x2913);
        assert!(bookmarks[0].title.is_empty());
    }

    #[test]
    fn test_parse_short_line() {
        let bookmarks = parse("zz\nTitle\n");
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].icon, 0);
        assert!(bookmarks[0].url.is_empty());
        assert_eq!(bookmarks[0].title, "Title");
    }
}
