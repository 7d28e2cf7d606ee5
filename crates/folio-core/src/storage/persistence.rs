//! Bookmark file persistence
//!
//! Loads the bookmark set from the data directory and writes it back as a
//! whole. Saves use atomic writes (write to temp file, then rename) so a
//! crash never leaves a half-written file behind.
//!
//! Files:
//! - `bookmarks.ini` - current format (see [`ini`](super::ini))
//! - `bookmarks.txt` - legacy format, read only when no `.ini` exists

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::error::{StorageError, StorageResult};
use super::{ini, legacy};
use crate::config::Config;
use crate::store::{Bookmarks, SortBy};

/// Which file a load read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadedFormat {
    /// `bookmarks.ini`
    Current,
    /// `bookmarks.txt`
    Legacy,
    /// Neither file exists
    Empty,
}

/// Outcome of [`BookmarkPersistence::load`]
#[derive(Debug)]
pub struct LoadReport {
    pub format: LoadedFormat,
    /// Number of records loaded
    pub count: usize,
    /// Lines of the file that were skipped
    pub issues: Vec<ini::ParseIssue>,
}

/// Persistence layer for the bookmark set
pub struct BookmarkPersistence {
    bookmarks_path: PathBuf,
    legacy_path: PathBuf,
}

impl BookmarkPersistence {
    /// Create a persistence handler for the configured data directory
    pub fn new(config: &Config) -> Self {
        Self {
            bookmarks_path: config.bookmarks_path(),
            legacy_path: config.legacy_bookmarks_path(),
        }
    }

    /// Create a persistence handler for an arbitrary directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            bookmarks_path: dir.join(super::BOOKMARKS_FILE),
            legacy_path: dir.join(super::LEGACY_BOOKMARKS_FILE),
        }
    }

    /// Path of the current-format file
    pub fn path(&self) -> &Path {
        &self.bookmarks_path
    }

    /// Replace the contents of `store` with what is on disk
    ///
    /// The store lock is held for the whole read. Lines that cannot be parsed
    /// are logged and returned in the report; they never fail the load.
    pub fn load(&self, store: &Bookmarks) -> StorageResult<LoadReport> {
        let mut inner = store.lock();
        inner.clear();

        if let Some(text) = read_text(&self.bookmarks_path)? {
            let doc = ini::parse(&text);
            for issue in &doc.issues {
                warn!("Skipped {:?} {}", self.bookmarks_path, issue);
            }
            let count = doc.bookmarks.len();
            for bm in doc.bookmarks {
                inner.insert_with_id(bm);
            }
            inner.recent_folder = doc.recent_folder;
            info!("Loaded {} bookmarks from {:?}", count, self.bookmarks_path);
            return Ok(LoadReport {
                format: LoadedFormat::Current,
                count,
                issues: doc.issues,
            });
        }

        if let Some(text) = read_text(&self.legacy_path)? {
            let bookmarks = legacy::parse(&text);
            let count = bookmarks.len();
            for mut bm in bookmarks {
                bm.id = inner.last_id + 1;
                inner.insert_with_id(bm);
            }
            // The old format has an implicit alphabetical order
            inner.sort_children(0, SortBy::TitleAscending);
            info!("Imported {} legacy bookmarks from {:?}", count, self.legacy_path);
            return Ok(LoadReport {
                format: LoadedFormat::Legacy,
                count,
                issues: Vec::new(),
            });
        }

        Ok(LoadReport {
            format: LoadedFormat::Empty,
            count: 0,
            issues: Vec::new(),
        })
    }

    /// Write `store` to disk, skipping remote bookmarks
    ///
    /// The store lock is held until the file is in place.
    pub fn save(&self, store: &Bookmarks) -> StorageResult<()> {
        let inner = store.lock();
        let text = ini::write(inner.records.values(), inner.recent_folder);
        atomic_write(&self.bookmarks_path, text.as_bytes())?;
        info!("Saved {} records to {:?}", inner.records.len(), self.bookmarks_path);
        Ok(())
    }
}

/// Read a UTF-8 file, or `None` if it does not exist
fn read_text(path: &Path) -> StorageResult<Option<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::from_read(e, path.to_path_buf())),
    };
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|source| StorageError::InvalidEncoding {
            path: path.to_path_buf(),
            source,
        })
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Same directory, so the rename stays on one filesystem
    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
