//! Storage layer
//!
//! Reads and writes the bookmark set as plain text files in the data
//! directory.
//!
//! ## Files
//!
//! - **bookmarks.ini**: Current format, written on every save
//! - **bookmarks.txt**: Legacy format, imported once if no `.ini` exists
//!
//! Remote bookmarks are never written; they are fetched again on sync.

pub mod error;
pub mod ini;
pub mod legacy;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use ini::ParseIssue;
pub use persistence::{BookmarkPersistence, LoadReport, LoadedFormat};

/// File name of the current bookmark format
pub const BOOKMARKS_FILE: &str = "bookmarks.ini";

/// File name of the legacy bookmark format
pub const LEGACY_BOOKMARKS_FILE: &str = "bookmarks.txt";
