//! Data models for folio
//!
//! Defines the bookmark record. Folders are ordinary records referenced by
//! other records' `parent_id`; see [`Bookmark::is_folder`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dense bookmark identifier. Zero is never allocated.
pub type BookmarkId = u32;

/// Fetched from a remote link list; regenerated on every sync, never saved.
pub const REMOTE_TAG: &str = "remote";
/// Marks a bookmark whose URL is a link list to fetch remote bookmarks from.
pub const REMOTE_SOURCE_TAG: &str = "remote-source";
/// The icon was picked by the user and must not be replaced automatically.
pub const USER_ICON_TAG: &str = "user-icon";
/// Shown on the new tab page.
pub const HOMEPAGE_TAG: &str = "homepage";
/// Checked for new entries by the feed reader.
pub const SUBSCRIBED_TAG: &str = "subscribed";

/// A saved bookmark or folder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    /// Unique identifier, assigned by the store
    pub id: BookmarkId,
    /// Canonical URL; empty for folders
    pub url: String,
    /// Display title
    pub title: String,
    /// Space-separated tag tokens
    pub tags: String,
    /// Icon code point (0 = unset)
    pub icon: u32,
    /// When this bookmark was created
    pub created_at: DateTime<Utc>,
    /// Containing folder (0 = root level)
    pub parent_id: BookmarkId,
    /// Relative position among siblings
    pub order: i32,
}

impl Default for Bookmark {
    fn default() -> Self {
        Self {
            id: 0,
            url: String::new(),
            title: String::new(),
            tags: String::new(),
            icon: 0,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            parent_id: 0,
            order: 0,
        }
    }
}

impl Bookmark {
    /// Create an empty bookmark with a zeroed timestamp
    pub fn new() -> Self {
        Self::default()
    }

    /// A folder is a record without a URL.
    pub fn is_folder(&self) -> bool {
        self.url.is_empty()
    }

    /// Check whether this bookmark sits directly inside `parent`
    pub fn has_parent(&self, parent: BookmarkId) -> bool {
        self.parent_id == parent
    }

    /// The icon as a character, if one is set and valid
    pub fn icon_char(&self) -> Option<char> {
        if self.icon == 0 {
            None
        } else {
            char::from_u32(self.icon)
        }
    }

    /// Iterate over the tag tokens in display order
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags.split_whitespace()
    }

    /// Whole-token, case-sensitive tag test
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_list().any(|t| t == tag)
    }

    /// Append a tag, separated by a single space
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() || self.has_tag(tag) {
            return;
        }
        if !self.tags.is_empty() {
            self.tags.push(' ');
        }
        self.tags.push_str(tag);
    }

    /// Remove every token equal to `tag`
    ///
    /// Tokens that merely contain `tag` (e.g. `rssfeed` for `rss`) are kept.
    pub fn remove_tag(&mut self, tag: &str) {
        if !self.has_tag(tag) {
            return;
        }
        self.tags = self
            .tag_list()
            .filter(|t| *t != tag)
            .collect::<Vec<_>>()
            .join(" ");
    }

    /// Remote bookmarks are ephemeral copies of a fetched link list
    pub fn is_remote(&self) -> bool {
        self.has_tag(REMOTE_TAG)
    }
}
