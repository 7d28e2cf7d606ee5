//! The `bookmarks.ini` format
//!
//! A small TOML subset: an optional top-level `recentfolder = <id>` followed
//! by one `[<id>]` table per bookmark holding `url`, `title`, `tags` (strings)
//! and `icon`, `created`, `parent`, `order` (integers).
//!
//! ```text
//! recentfolder = 0
//!
//! [1]
//! url = "gemini://example.org/"
//! title = "Example"
//! tags = "user-icon"
//! icon = 0x1f30d
//! created = 1700000000  # 2023-11-14
//! order = 3
//! ```
//!
//! The parser works line by line. A line that cannot be read is reported as
//! a [`ParseIssue`] and skipped; everything else still loads.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use thiserror::Error;
use toml::Value;
use tracing::debug;

use crate::models::{Bookmark, BookmarkId};

/// A line of the bookmark file that could not be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseIssue {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

impl ParseIssue {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Everything read from a bookmark file
#[derive(Debug, Default)]
pub struct IniDocument {
    /// Records in file order, each carrying its persisted id
    pub bookmarks: Vec<Bookmark>,
    pub recent_folder: BookmarkId,
    pub issues: Vec<ParseIssue>,
}

/// Where the parser currently is
enum Section {
    /// Before the first table
    Top,
    Record(Bookmark),
    /// Inside a table whose header was rejected
    Skipped,
}

/// Convert fractional epoch seconds to a timestamp
pub(crate) fn timestamp_from_secs(secs: f64) -> DateTime<Utc> {
    if !secs.is_finite() {
        return DateTime::<Utc>::UNIX_EPOCH;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(whole as i64, nanos).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Parse the contents of a bookmark file
pub fn parse(text: &str) -> IniDocument {
    let mut doc = IniDocument::default();
    let mut section = Section::Top;

    for (index, raw) in text.lines().enumerate() {
        let number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            if let Section::Record(bm) = std::mem::replace(&mut section, Section::Skipped) {
                doc.bookmarks.push(bm);
            }
            match parse_header(header) {
                Ok(id) => {
                    section = Section::Record(Bookmark {
                        id,
                        ..Bookmark::default()
                    });
                }
                Err(message) => doc.issues.push(ParseIssue::new(number, message)),
            }
            continue;
        }

        let table: toml::Table = match toml::from_str(line) {
            Ok(table) => table,
            Err(e) => {
                let message = e.message().to_string();
                doc.issues.push(ParseIssue::new(number, message));
                continue;
            }
        };

        for (key, value) in table {
            let result = match &mut section {
                Section::Record(bm) => apply_field(bm, &key, &value),
                Section::Top if key == "recentfolder" => {
                    to_id(&value).map(|id| doc.recent_folder = id)
                }
                Section::Top | Section::Skipped => Ok(()),
            };
            if let Err(message) = result {
                doc.issues.push(ParseIssue::new(number, format!("{}: {}", key, message)));
            }
        }
    }

    if let Section::Record(bm) = section {
        doc.bookmarks.push(bm);
    }
    doc
}

/// Parse the inside of a `[<id>]` header
fn parse_header(header: &str) -> Result<BookmarkId, String> {
    let Some(end) = header.find(']') else {
        return Err("unterminated table header".to_string());
    };
    let name = header[..end].trim();
    match name.parse::<BookmarkId>() {
        Ok(0) => Err("bookmark id 0 is reserved for the root".to_string()),
        Ok(id) => Ok(id),
        Err(_) => Err(format!("table name '{}' is not a bookmark id", name)),
    }
}

fn to_id(value: &Value) -> Result<BookmarkId, String> {
    match value {
        Value::Integer(i) => BookmarkId::try_from(*i).map_err(|_| format!("{} is out of range", i)),
        other => Err(format!("expected an integer, found {}", other.type_str())),
    }
}

/// Store one `key = value` pair in `bm`
///
/// Unknown keys are ignored so newer files still load.
fn apply_field(bm: &mut Bookmark, key: &str, value: &Value) -> Result<(), String> {
    match (key, value) {
        ("url", Value::String(s)) => bm.url = s.clone(),
        ("title", Value::String(s)) => bm.title = s.clone(),
        ("tags", Value::String(s)) => bm.tags = s.clone(),
        ("icon", Value::Integer(i)) => {
            bm.icon = u32::try_from(*i).map_err(|_| format!("{} is not a code point", i))?;
        }
        ("created", Value::Integer(i)) => bm.created_at = timestamp_from_secs(*i as f64),
        ("created", Value::Float(f)) => bm.created_at = timestamp_from_secs(*f),
        ("parent", value) => bm.parent_id = to_id(value)?,
        ("order", Value::Integer(i)) => {
            bm.order = i32::try_from(*i).map_err(|_| format!("{} is out of range", i))?;
        }
        ("url" | "title" | "tags" | "icon" | "created" | "order", other) => {
            return Err(format!("unexpected {} value", other.type_str()));
        }
        _ => debug!("Ignoring unknown bookmark key '{}'", key),
    }
    Ok(())
}

/// Quote a string as a TOML basic string
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                // Writing into a String cannot fail
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Serialize bookmarks to the file format
///
/// Records are written by ascending id. Remote bookmarks are skipped: they
/// are fetched again on the next sync.
pub fn write<'a, I>(bookmarks: I, recent_folder: BookmarkId) -> String
where
    I: IntoIterator<Item = &'a Bookmark>,
{
    let mut records: Vec<&Bookmark> = bookmarks.into_iter().filter(|bm| !bm.is_remote()).collect();
    records.sort_by_key(|bm| bm.id);

    // Writes into a String cannot fail
    let mut out = String::new();
    let _ = write!(out, "recentfolder = {}\n\n", recent_folder);
    for bm in records {
        let _ = writeln!(out, "[{}]", bm.id);
        let _ = writeln!(out, "url = {}", quote(&bm.url));
        let _ = writeln!(out, "title = {}", quote(&bm.title));
        let _ = writeln!(out, "tags = {}", quote(&bm.tags));
        let _ = writeln!(out, "icon = 0x{:x}", bm.icon);
        let _ = writeln!(
            out,
            "created = {}  # {}",
            bm.created_at.timestamp(),
            bm.created_at.format("%Y-%m-%d")
        );
        if bm.parent_id != 0 {
            let _ = writeln!(out, "parent = {}", bm.parent_id);
        }
        if bm.order != 0 {
            let _ = writeln!(out, "order = {}", bm.order);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"recentfolder = 2

[1]
url = "gemini://example.org/"
title = "Example \"quoted\""
tags = "user-icon news"
icon = 0x1f30d
created = 1700000000  # 2023-11-14
order = -3

[2]
url = ""
title = "Folder"
tags = ""
icon = 0x0
created = 1600000000  # 2020-09-13

[7]
url = "gemini://nested.example/"
title = "Nested"
tags = ""
icon = 0x0
created = 1650000000.5
parent = 2
order = 1
"#;

    #[test]
    fn test_parse_sample() {
        let doc = parse(SAMPLE);
        assert!(doc.issues.is_empty(), "{:?}", doc.issues);
        assert_eq!(doc.recent_folder, 2);
        assert_eq!(doc.bookmarks.len(), 3);

        let first = &doc.bookmarks[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.url, "gemini://example.org/");
        assert_eq!(first.title, "Example \"quoted\"");
        assert_eq!(first.tags, "user-icon news");
        assert_eq!(first.icon, 0x1f30d);
        assert_eq!(first.created_at.timestamp(), 1_700_000_000);
        assert_eq!(first.order, -3);
        assert_eq!(first.parent_id, 0);

        let folder = &doc.bookmarks[1];
        assert!(folder.is_folder());
        assert_eq!(folder.order, 0);

        let nested = &doc.bookmarks[2];
        assert_eq!(nested.id, 7);
        assert_eq!(nested.parent_id, 2);
        assert_eq!(nested.created_at.timestamp(), 1_650_000_000);
    }

    #[test]
    fn test_parse_skips_bad_lines() {
        let text = "[1]\nurl = \"gemini://a.example/\"\ntitle = \"unterminated\nicon = 0x41\n";
        let doc = parse(text);
        assert_eq!(doc.bookmarks.len(), 1);
        assert_eq!(doc.bookmarks[0].url, "gemini://a.example/");
        assert_eq!(doc.bookmarks[0].icon, 0x41);
        assert_eq!(doc.issues.len(), 1);
        assert_eq!(doc.issues[0].line, 3);
    }

    #[test]
    fn test_parse_rejects_bad_headers() {
        let text = "[abc]\nurl = \"gemini://ignored.example/\"\n[0]\n[5]\ntitle = \"Kept\"\n";
        let doc = parse(text);
        assert_eq!(doc.bookmarks.len(), 1);
        assert_eq!(doc.bookmarks[0].id, 5);
        assert_eq!(doc.bookmarks[0].title, "Kept");
        assert_eq!(doc.issues.len(), 2);
        assert!(doc.issues[0].to_string().starts_with("line 1:"));
    }

    #[test]
    fn test_parse_type_mismatch_is_reported() {
        let doc = parse("[3]\nicon = \"not a number\"\norder = 99999999999\nfuture = 1\n");
        assert_eq!(doc.bookmarks.len(), 1);
        assert_eq!(doc.bookmarks[0].icon, 0);
        assert_eq!(doc.issues.len(), 2);
    }

    #[test]
    fn test_recentfolder_only_at_top_level() {
        let doc = parse("[4]\nrecentfolder = 9\n");
        assert_eq!(doc.recent_folder, 0);
        assert!(doc.issues.is_empty());
    }

    #[test]
    fn test_write_format() {
        let bm = Bookmark {
            id: 3,
            url: "gemini://example.org/".to_string(),
            title: "Say \"hi\"\\".to_string(),
            tags: "news".to_string(),
            icon: 0x41,
            created_at: timestamp_from_secs(1_700_000_000.0),
            parent_id: 0,
            order: 0,
        };
        let text = write([&bm], 0);
        assert_eq!(
            text,
            "recentfolder = 0\n\n\
             [3]\n\
             url = \"gemini://example.org/\"\n\
             title = \"Say \\\"hi\\\"\\\\\"\n\
             tags = \"news\"\n\
             icon = 0x41\n\
             created = 1700000000  # 2023-11-14\n\n"
        );
    }

    #[test]
    fn test_write_skips_remote_and_keeps_nonzero_keys() {
        let kept = Bookmark {
            id: 2,
            url: "gemini://kept.example/".to_string(),
            parent_id: 1,
            order: -4,
            ..Bookmark::default()
        };
        let remote = Bookmark {
            id: 1,
            url: "gemini://fetched.example/".to_string(),
            tags: "remote".to_string(),
            ..Bookmark::default()
        };
        let text = write([&remote, &kept], 1);
        assert!(!text.contains("fetched.example"));
        assert!(text.contains("parent = 1\n"));
        assert!(text.contains("order = -4\n"));
        assert!(text.starts_with("recentfolder = 1\n"));
    }

    #[test]
    fn test_write_then_parse_preserves_fields() {
        let original = parse(SAMPLE);
        let text = write(&original.bookmarks, original.recent_folder);
        let reparsed = parse(&text);

        assert!(reparsed.issues.is_empty());
        assert_eq!(reparsed.recent_folder, 2);
        for (a, b) in original.bookmarks.iter().zip(&reparsed.bookmarks) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.url, b.url);
            assert_eq!(a.title, b.title);
            assert_eq!(a.tags, b.tags);
            assert_eq!(a.icon, b.icon);
            assert_eq!(a.created_at.timestamp(), b.created_at.timestamp());
            assert_eq!(a.parent_id, b.parent_id);
            assert_eq!(a.order, b.order);
        }
    }

    #[test]
    fn test_quote_control_characters() {
        assert_eq!(quote("a\tb\nc"), "\"a\\tb\\nc\"");
        assert_eq!(quote("\u{1}"), "\"\\u0001\"");
        let table: toml::Table = toml::from_str(&format!("v = {}", quote("x\u{7f}\"y"))).unwrap();
        assert_eq!(table["v"].as_str(), Some("x\u{7f}\"y"));
    }
}
