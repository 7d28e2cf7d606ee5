//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use folio_core::models::{HOMEPAGE_TAG, SUBSCRIBED_TAG};
use folio_core::Bookmark;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single bookmark
    pub fn print_bookmark(&self, bm: &Bookmark) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", bm.id);
                println!("Title:       {}", bm.title);
                if bm.is_folder() {
                    println!("Kind:        folder");
                } else {
                    println!("URL:         {}", bm.url);
                }
                if let Some(icon) = bm.icon_char() {
                    println!("Icon:        {}", icon);
                }
                if !bm.tags.is_empty() {
                    println!("Tags:        {}", bm.tag_list().collect::<Vec<_>>().join(", "));
                }
                if bm.parent_id != 0 {
                    println!("Folder:      {}", bm.parent_id);
                }
                println!("Order:       {}", bm.order);
                println!("Created:     {}", bm.created_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(bm),
            OutputFormat::Quiet => {
                println!("{}", bm.id);
            }
        }
    }

    /// Print a list of bookmarks
    ///
    /// `depth` gives the indentation level of each entry in human output.
    pub fn print_bookmarks(&self, bookmarks: &[Bookmark], depth: impl Fn(&Bookmark) -> usize) {
        match self.format {
            OutputFormat::Human => {
                if bookmarks.is_empty() {
                    println!("No bookmarks found.");
                    return;
                }
                for bm in bookmarks {
                    println!("{}", summary_line(bm, depth(bm)));
                }
                let count = bookmarks.iter().filter(|bm| !bm.is_folder()).count();
                println!("\n{} bookmark(s)", count);
            }
            OutputFormat::Json => print_json(bookmarks),
            OutputFormat::Quiet => {
                for bm in bookmarks {
                    println!("{}", bm.id);
                }
            }
        }
    }

    /// Print a list of tags
    pub fn print_tags(&self, tags: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json_tags);
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warn(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode JSON: {}", e),
    }
}

/// One-line listing entry: `  12 | ★ Title | url`
fn summary_line(bm: &Bookmark, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    let icon = bm.icon_char().unwrap_or(' ');
    if bm.is_folder() {
        return format!("{:>4} | {}▸ {}/", bm.id, indent, truncate(&bm.title, 40));
    }
    let mut marks = String::new();
    if bm.has_tag(HOMEPAGE_TAG) {
        marks.push_str(" [home]");
    }
    if bm.has_tag(SUBSCRIBED_TAG) {
        marks.push_str(" [feed]");
    }
    format!(
        "{:>4} | {}{} {}{} | {}",
        bm.id,
        indent,
        icon,
        truncate(&bm.title, 35),
        marks,
        truncate(&bm.url, 45)
    )
}

/// Truncate a string to max length in characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        // Counts characters, not bytes
        assert_eq!(truncate("ääääääääääää", 6), "äää...");
    }

    #[test]
    fn test_summary_line() {
        let bm = Bookmark {
            id: 7,
            url: "gemini://example.org/".to_string(),
            title: "Example".to_string(),
            tags: "homepage".to_string(),
            icon: 0x41,
            ..Bookmark::default()
        };
        assert_eq!(
            summary_line(&bm, 1),
            "   7 |   A Example [home] | gemini://example.org/"
        );

        let folder = Bookmark {
            id: 12,
            title: "Reading".to_string(),
            ..Bookmark::default()
        };
        assert_eq!(summary_line(&folder, 0), "  12 | ▸ Reading/");
    }
}
