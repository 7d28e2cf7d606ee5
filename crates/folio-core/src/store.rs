//! The bookmark store
//!
//! `Bookmarks` holds every record in memory, keyed by id. A single mutex
//! guards the record map, the id allocator and the recent-folder scalar.
//! Critical sections are short and never hand out references: reads return
//! cloned snapshots that can be used after the lock is released.
//!
//! ## Usage
//!
//! ```ignore
//! let bookmarks = Arc::new(Bookmarks::new());
//!
//! let id = bookmarks.add("gemini://example.org", "Example", "", 0);
//! let newest_first = bookmarks.list(|_| true, SortBy::CreatedDescending);
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::debug;

use crate::links;
use crate::models::{Bookmark, BookmarkId, REMOTE_SOURCE_TAG, REMOTE_TAG, USER_ICON_TAG};

/// Comparison function for [`SortBy::Custom`]
pub type CompareFn = fn(&Bookmark, &Bookmark) -> Ordering;

/// How to order a listing
#[derive(Clone, Copy, Default)]
pub enum SortBy {
    /// Newest first
    #[default]
    CreatedDescending,
    /// By title, ignoring case
    TitleAscending,
    /// By the `order` field
    Order,
    /// Depth-first through the folder tree, siblings by `order`
    Tree,
    /// Caller-supplied comparison
    Custom(CompareFn),
}

/// Newest first; ties broken by id so listings are deterministic
pub fn cmp_created_descending(a: &Bookmark, b: &Bookmark) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Title, case-insensitive
pub fn cmp_title_ascending(a: &Bookmark, b: &Bookmark) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

/// Sibling order
pub fn cmp_order(a: &Bookmark, b: &Bookmark) -> Ordering {
    a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id))
}

/// State guarded by the store mutex
#[derive(Debug, Default)]
pub(crate) struct Inner {
    pub(crate) records: HashMap<BookmarkId, Bookmark>,
    /// Highest id handed out so far
    pub(crate) last_id: BookmarkId,
    pub(crate) recent_folder: BookmarkId,
}

impl Inner {
    fn allocate_id(&mut self) -> BookmarkId {
        self.last_id += 1;
        self.last_id
    }

    /// Insert a record under an id read from disk
    pub(crate) fn insert_with_id(&mut self, bookmark: Bookmark) {
        self.last_id = self.last_id.max(bookmark.id);
        self.records.insert(bookmark.id, bookmark);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.last_id = 0;
        self.recent_folder = 0;
    }

    /// Order value for a new record: one past either end of the current range
    fn next_order(&self, to_bottom: bool) -> i32 {
        let mut range: Option<(i32, i32)> = None;
        for bm in self.records.values() {
            range = Some(match range {
                None => (bm.order, bm.order.saturating_add(1)),
                Some((start, end)) => (start.min(bm.order), end.max(bm.order.saturating_add(1))),
            });
        }
        let (start, end) = range.unwrap_or((0, 0));
        // Orders pile up at the ends of the range rather than wrapping
        if to_bottom {
            end
        } else {
            start.saturating_sub(1)
        }
    }

    fn insert_new(&mut self, mut bookmark: Bookmark, to_bottom: bool) -> BookmarkId {
        bookmark.created_at = Utc::now();
        bookmark.order = self.next_order(to_bottom);
        bookmark.id = self.allocate_id();
        let id = bookmark.id;
        self.records.insert(id, bookmark);
        id
    }

    pub(crate) fn find_url(&self, url: &str) -> Option<BookmarkId> {
        let url = links::canonical(url);
        self.records
            .values()
            .filter(|bm| links::eq_case(&bm.url, &url))
            .map(|bm| bm.id)
            .min()
    }

    /// Number of parent hops from `id` up to the root
    ///
    /// Bounded by the record count, so a parent cycle ends the walk instead
    /// of looping.
    pub(crate) fn depth(&self, id: BookmarkId) -> usize {
        let mut depth = 0;
        let mut current = self.records.get(&id).map(|bm| bm.parent_id).unwrap_or(0);
        while current != 0 && depth < self.records.len() {
            depth += 1;
            current = self.records.get(&current).map(|bm| bm.parent_id).unwrap_or(0);
        }
        depth
    }

    /// Ancestry chain from the outermost folder down to `bm` itself
    ///
    /// Comparing these chains lexicographically gives depth-first order with
    /// every folder directly ahead of its contents.
    fn tree_key(&self, bm: &Bookmark) -> Vec<(i32, BookmarkId)> {
        let mut key = vec![(bm.order, bm.id)];
        let mut current = bm.parent_id;
        while current != 0 && key.len() <= self.records.len() {
            match self.records.get(&current) {
                Some(parent) => {
                    key.push((parent.order, parent.id));
                    current = parent.parent_id;
                }
                None => break,
            }
        }
        key.reverse();
        key
    }

    /// Filtered snapshot, sorted
    pub(crate) fn list<F>(&self, filter: F, sort: SortBy) -> Vec<Bookmark>
    where
        F: Fn(&Bookmark) -> bool,
    {
        let selected = self.records.values().filter(|bm| filter(*bm));
        match sort {
            SortBy::Tree => {
                let mut keyed: Vec<_> = selected.map(|bm| (self.tree_key(bm), bm.clone())).collect();
                keyed.sort_by(|a, b| a.0.cmp(&b.0));
                keyed.into_iter().map(|(_, bm)| bm).collect()
            }
            other => {
                let cmp: CompareFn = match other {
                    SortBy::CreatedDescending | SortBy::Tree => cmp_created_descending,
                    SortBy::TitleAscending => cmp_title_ascending,
                    SortBy::Order => cmp_order,
                    SortBy::Custom(f) => f,
                };
                let mut list: Vec<Bookmark> = selected.cloned().collect();
                list.sort_by(cmp);
                list
            }
        }
    }

    /// Rewrite the `order` of `parent`'s direct children to their 1-based
    /// rank under `sort`
    pub(crate) fn sort_children(&mut self, parent: BookmarkId, sort: SortBy) {
        let ranked: Vec<BookmarkId> = self
            .list(|bm| bm.has_parent(parent), sort)
            .iter()
            .map(|bm| bm.id)
            .collect();
        for (rank, id) in ranked.into_iter().enumerate() {
            if let Some(bm) = self.records.get_mut(&id) {
                bm.order = rank as i32 + 1;
            }
        }
    }
}

/// Thread-safe, in-memory bookmark set
#[derive(Debug, Default)]
pub struct Bookmarks {
    inner: Mutex<Inner>,
    /// Place new bookmarks after existing ones instead of before
    add_to_bottom: AtomicBool,
}

impl Bookmarks {
    /// Create an empty store that puts new bookmarks first
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given placement preference
    pub fn with_add_to_bottom(add_to_bottom: bool) -> Self {
        let store = Self::new();
        store.set_add_to_bottom(add_to_bottom);
        store
    }

    /// Change where [`add`](Self::add) places new bookmarks
    pub fn set_add_to_bottom(&self, add_to_bottom: bool) {
        self.add_to_bottom.store(add_to_bottom, AtomicOrdering::Relaxed);
    }

    fn to_bottom(&self) -> bool {
        self.add_to_bottom.load(AtomicOrdering::Relaxed)
    }

    /// Acquire the store lock
    ///
    /// The guarded data is plain values, so a panic on another thread cannot
    /// leave it half-updated; a poisoned lock is simply taken over.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Mutation ====================

    /// Add a bookmark and return its new id
    ///
    /// The URL is canonicalized; an empty URL makes the record a folder.
    pub fn add(&self, url: &str, title: &str, tags: &str, icon: u32) -> BookmarkId {
        let bookmark = Bookmark {
            url: links::canonical(url),
            title: title.to_string(),
            tags: tags.to_string(),
            icon,
            ..Bookmark::default()
        };
        let to_bottom = self.to_bottom();
        let id = self.lock().insert_new(bookmark, to_bottom);
        debug!("Added bookmark {}", id);
        id
    }

    /// Add a folder inside `parent` (0 for the root level)
    pub fn add_folder(&self, title: &str, parent: BookmarkId) -> BookmarkId {
        let bookmark = Bookmark {
            title: title.to_string(),
            parent_id: parent,
            ..Bookmark::default()
        };
        let to_bottom = self.to_bottom();
        self.lock().insert_new(bookmark, to_bottom)
    }

    /// Add a fetched bookmark under `parent` unless its URL is already stored
    ///
    /// The lookup and the insert happen in one critical section, so two
    /// completions racing on the same URL produce a single record.
    pub fn insert_remote(
        &self,
        url: &str,
        title: &str,
        parent: BookmarkId,
        icon: u32,
    ) -> Option<BookmarkId> {
        let url = links::canonical(url);
        let to_bottom = self.to_bottom();
        let mut inner = self.lock();
        if inner.find_url(&url).is_some() {
            return None;
        }
        let bookmark = Bookmark {
            url,
            title: title.to_string(),
            tags: REMOTE_TAG.to_string(),
            icon,
            parent_id: parent,
            ..Bookmark::default()
        };
        Some(inner.insert_new(bookmark, to_bottom))
    }

    /// Remove a bookmark and the records directly inside it
    ///
    /// Only one level is removed: anything nested deeper is left in place
    /// with a dangling parent.
    pub fn remove(&self, id: BookmarkId) -> bool {
        let mut inner = self.lock();
        if inner.records.remove(&id).is_none() {
            return false;
        }
        inner.records.retain(|_, bm| bm.parent_id != id);
        if inner.recent_folder == id {
            inner.recent_folder = 0;
        }
        debug!("Removed bookmark {}", id);
        true
    }

    /// Remove every bookmark matching `filter`; returns how many went
    pub fn remove_where<F>(&self, filter: F) -> usize
    where
        F: Fn(&Bookmark) -> bool,
    {
        let mut inner = self.lock();
        let before = inner.records.len();
        inner.records.retain(|_, bm| !filter(&*bm));
        before - inner.records.len()
    }

    /// Drop every record and restart id allocation
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Apply `edit` to one record; false if the id is unknown
    ///
    /// The id is restored afterwards, it cannot be changed this way.
    pub fn update<F>(&self, id: BookmarkId, edit: F) -> bool
    where
        F: FnOnce(&mut Bookmark),
    {
        let mut inner = self.lock();
        match inner.records.get_mut(&id) {
            Some(bm) => {
                edit(bm);
                bm.id = id;
                true
            }
            None => false,
        }
    }

    /// Move a bookmark into another folder
    pub fn set_parent(&self, id: BookmarkId, parent: BookmarkId) -> bool {
        self.update(id, |bm| bm.parent_id = parent)
    }

    /// Replace the icon of the bookmark at `url`
    ///
    /// Remote bookmarks and user-chosen icons are left alone. Returns whether
    /// anything changed.
    pub fn update_icon(&self, url: &str, icon: u32) -> bool {
        let mut inner = self.lock();
        let Some(id) = inner.find_url(url) else {
            return false;
        };
        let Some(bm) = inner.records.get_mut(&id) else {
            return false;
        };
        if bm.has_tag(REMOTE_TAG) || bm.has_tag(USER_ICON_TAG) || bm.icon == icon {
            return false;
        }
        bm.icon = icon;
        true
    }

    /// Give `id` the order `new_order`, shifting every other record at or
    /// after that position up by one
    pub fn reorder(&self, id: BookmarkId, new_order: i32) {
        debug_assert!(id != 0, "bookmark id 0 is never allocated");
        let mut inner = self.lock();
        if !inner.records.contains_key(&id) {
            return;
        }
        for bm in inner.records.values_mut() {
            if bm.id == id {
                bm.order = new_order;
            } else if bm.order >= new_order {
                bm.order = bm.order.saturating_add(1);
            }
        }
    }

    /// Persist a sorted order for the direct children of `parent`
    pub fn sort(&self, parent: BookmarkId, sort: SortBy) {
        self.lock().sort_children(parent, sort);
    }

    /// Remember the last folder the user worked with
    ///
    /// Anything that is not an existing folder resets it to the root.
    pub fn set_recent_folder(&self, id: BookmarkId) {
        let mut inner = self.lock();
        let is_folder = inner.records.get(&id).is_some_and(Bookmark::is_folder);
        inner.recent_folder = if is_folder { id } else { 0 };
    }

    // ==================== Queries ====================

    /// Snapshot of one record
    pub fn get(&self, id: BookmarkId) -> Option<Bookmark> {
        self.lock().records.get(&id).cloned()
    }

    /// Check whether a record exists
    pub fn contains(&self, id: BookmarkId) -> bool {
        self.lock().records.contains_key(&id)
    }

    /// Find the bookmark with this URL (compared canonically, ignoring case)
    ///
    /// Linear in the number of bookmarks.
    pub fn find_url(&self, url: &str) -> Option<BookmarkId> {
        self.lock().find_url(url)
    }

    /// Filtered, sorted snapshot
    pub fn list<F>(&self, filter: F, sort: SortBy) -> Vec<Bookmark>
    where
        F: Fn(&Bookmark) -> bool,
    {
        self.lock().list(filter, sort)
    }

    /// Every record, newest first
    pub fn all(&self) -> Vec<Bookmark> {
        self.list(|_| true, SortBy::CreatedDescending)
    }

    /// Direct children of `parent` in sibling order
    pub fn children(&self, parent: BookmarkId) -> Vec<Bookmark> {
        self.list(|bm| bm.has_parent(parent), SortBy::Order)
    }

    /// All folders, depth-first
    pub fn folders(&self) -> Vec<Bookmark> {
        self.list(Bookmark::is_folder, SortBy::Tree)
    }

    /// Bookmarks whose URLs are remote link lists
    pub fn remote_sources(&self) -> Vec<Bookmark> {
        self.list(|bm| bm.has_tag(REMOTE_SOURCE_TAG), SortBy::Order)
    }

    /// Number of bookmarks, not counting folders
    pub fn count(&self) -> usize {
        self.lock()
            .records
            .values()
            .filter(|bm| !bm.is_folder())
            .count()
    }

    /// Number of records, folders included
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Check whether the store holds no records at all
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Last folder the user worked with (0 for the root level)
    pub fn recent_folder(&self) -> BookmarkId {
        self.lock().recent_folder
    }

    /// Number of folders between `id` and the root
    pub fn depth(&self, id: BookmarkId) -> usize {
        self.lock().depth(id)
    }

    /// Every distinct tag with the number of records carrying it
    pub fn tags(&self) -> Vec<(String, usize)> {
        let inner = self.lock();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for bm in inner.records.values() {
            for tag in bm.tag_list() {
                *counts.entry(tag.to_string()).or_default() += 1;
            }
        }
        counts.into_iter().collect()
    }

    /// Icon of the user-iconed bookmark closest to the root of `url`'s site
    ///
    /// Among bookmarks tagged `user-icon` on the same scheme and host, the
    /// one with the shortest URL wins. Returns 0 when none matches.
    pub fn site_icon(&self, url: &str) -> u32 {
        if url.is_empty() {
            return 0;
        }
        let root = links::root(url);
        let inner = self.lock();
        inner
            .records
            .values()
            .filter(|bm| bm.icon != 0 && bm.has_tag(USER_ICON_TAG))
            .filter(|bm| links::eq_case(links::root(&bm.url), root))
            .min_by_key(|bm| (bm.url.len(), bm.id))
            .map(|bm| bm.icon)
            .unwrap_or(0)
    }
}
