//! Folio Core Library
//!
//! This crate provides the core functionality for folio, a hierarchical
//! bookmark store for Gemini and the web with folders, tags and remote
//! link lists.
//!
//! # Architecture
//!
//! - **Store**: every bookmark lives in memory behind a single mutex
//! - **Storage**: the set is loaded from and saved to plain text files
//! - **Remote**: link lists fetched concurrently and merged as ephemeral
//!   bookmarks
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let bookmarks = Bookmarks::with_add_to_bottom(config.add_to_bottom);
//! let persistence = BookmarkPersistence::new(&config);
//! persistence.load(&bookmarks)?;
//!
//! let id = bookmarks.add("gemini://example.org", "Example", "news", 0);
//! persistence.save(&bookmarks)?;
//! ```
//!
//! # Modules
//!
//! - `store`: The thread-safe bookmark set (main entry point)
//! - `models`: The bookmark record and reserved tags
//! - `links`: URL normalization and Gemini link lines
//! - `storage`: File formats and persistence
//! - `export`: Bookmark list pages
//! - `remote`: Remote link list sync
//! - `config`: Application configuration

pub mod config;
pub mod export;
pub mod links;
pub mod models;
pub mod remote;
pub mod storage;
pub mod store;

pub use config::Config;
pub use export::{bookmark_list_page, ExportKind};
pub use models::{Bookmark, BookmarkId};
pub use remote::{BookmarkEvent, FetchError, HttpTransport, RemoteSync, Transport};
pub use storage::{BookmarkPersistence, LoadReport, LoadedFormat, ParseIssue, StorageError};
pub use store::{Bookmarks, SortBy};
