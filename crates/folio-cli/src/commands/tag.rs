//! Tag command handlers

use anyhow::{bail, Result};

use folio_core::models::REMOTE_TAG;
use folio_core::{BookmarkId, Bookmarks};

use crate::output::Output;

/// List all tags with usage counts
pub fn list(store: &Bookmarks, output: &Output) -> Result<()> {
    output.print_tags(&store.tags());
    Ok(())
}

/// Add a tag to a bookmark
pub fn add(store: &Bookmarks, id: BookmarkId, tag: String, output: &Output) -> Result<()> {
    let tag = tag.trim();
    if tag.is_empty() || tag.contains(char::is_whitespace) {
        bail!("Tags are single words: '{}'", tag);
    }
    // Fetched bookmarks are thrown away on every sync
    if tag == REMOTE_TAG {
        bail!("The '{}' tag is reserved for fetched bookmarks", REMOTE_TAG);
    }
    if !store.update(id, |bm| bm.add_tag(tag)) {
        bail!("Bookmark not found: {}", id);
    }
    output.success(&format!("Tagged {} with '{}'", id, tag));
    Ok(())
}

/// Remove a tag from a bookmark
pub fn remove(store: &Bookmarks, id: BookmarkId, tag: String, output: &Output) -> Result<()> {
    let mut had_tag = false;
    let found = store.update(id, |bm| {
        had_tag = bm.has_tag(&tag);
        bm.remove_tag(&tag);
    });
    if !found {
        bail!("Bookmark not found: {}", id);
    }
    if had_tag {
        output.success(&format!("Removed '{}' from {}", tag, id));
    } else {
        output.message(&format!("{} is not tagged '{}'", id, tag));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    #[test]
    fn test_add_and_remove() {
        let output = Output::new(OutputFormat::Quiet);
        let store = Bookmarks::new();
        let id = store.add("gemini://a.example/", "A", "rss", 0);

        add(&store, id, " feed ".to_string(), &output).unwrap();
        assert_eq!(store.get(id).unwrap().tags, "rss feed");

        remove(&store, id, "rss".to_string(), &output).unwrap();
        assert_eq!(store.get(id).unwrap().tags, "feed");

        // Removing a missing tag is not an error
        remove(&store, id, "rss".to_string(), &output).unwrap();
    }

    #[test]
    fn test_add_rejects_bad_tags() {
        let output = Output::new(OutputFormat::Quiet);
        let store = Bookmarks::new();
        let id = store.add("gemini://a.example/", "A", "", 0);

        assert!(add(&store, id, "two words".to_string(), &output).is_err());
        assert!(add(&store, id, "remote".to_string(), &output).is_err());
        assert!(add(&store, 99, "fine".to_string(), &output).is_err());
        assert!(store.get(id).unwrap().tags.is_empty());
    }
}
