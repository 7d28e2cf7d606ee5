//! Remote bookmark lists
//!
//! Bookmarks tagged `remote-source` point at Gemini documents full of link
//! lines. A sync cycle throws away the previously fetched `remote` bookmarks,
//! fetches every source concurrently and adds each link it finds as a child
//! of its source, skipping URLs that are already bookmarked.
//!
//! Fetches run as tokio tasks through a [`Transport`]. Only the final merge
//! takes the store lock. Listeners get [`BookmarkEvent::Changed`] when stale
//! bookmarks are purged and once more when the last fetch has finished.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::links;
use crate::models::{Bookmark, BookmarkId};
use crate::store::Bookmarks;

/// Icon given to fetched bookmarks (⤓)
pub const REMOTE_ICON: u32 = 0x2913;

/// Fetch timeout in seconds
const FETCH_TIMEOUT: u64 = 10;

/// Identifies one outstanding fetch
pub type RequestId = u64;

/// Why a remote list could not be fetched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Fetches the body of a remote link list
pub trait Transport: Send + Sync {
    fn fetch(&self, url: String) -> BoxFuture<'static, Result<String, FetchError>>;
}

/// Transport for `http` and `https` sources
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT))
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: String) -> BoxFuture<'static, Result<String, FetchError>> {
        let client = self.client.clone();
        async move {
            let scheme = url.split(':').next().unwrap_or_default().to_ascii_lowercase();
            if scheme != "http" && scheme != "https" {
                return Err(FetchError::UnsupportedScheme(scheme));
            }

            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            if !response.status().is_success() {
                return Err(FetchError::Status(response.status().as_u16()));
            }
            response
                .text()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))
        }
        .boxed()
    }
}

/// Notifications for whoever displays the bookmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkEvent {
    /// The bookmark set changed and views should refresh
    Changed,
}

/// An outstanding fetch
struct Request {
    /// The `remote-source` bookmark being fetched
    source: BookmarkId,
    url: String,
    handle: JoinHandle<()>,
}

struct Shared {
    bookmarks: Arc<Bookmarks>,
    transport: Arc<dyn Transport>,
    requests: Mutex<HashMap<RequestId, Request>>,
    next_request: AtomicU64,
    event_tx: mpsc::UnboundedSender<BookmarkEvent>,
}

impl Shared {
    fn requests(&self) -> MutexGuard<'_, HashMap<RequestId, Request>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        // Nobody listening is fine
        let _ = self.event_tx.send(BookmarkEvent::Changed);
    }

    /// Merge the outcome of one fetch into the store
    ///
    /// The request stays outstanding until its links are merged, so the
    /// batch only counts as drained once every merge is done.
    fn request_finished(&self, id: RequestId, result: Result<String, FetchError>) {
        let Some((source, url)) = self
            .requests()
            .get(&id)
            .map(|request| (request.source, request.url.clone()))
        else {
            debug!("Ignoring unknown remote request {}", id);
            return;
        };

        match result {
            Ok(body) => {
                let added = merge_links(&self.bookmarks, source, &url, &body);
                info!("Fetched {} new bookmarks from {}", added, url);
            }
            Err(e) => warn!("Failed to fetch {}: {}", url, e),
        }

        // A cancelled batch has already been drained and must not notify
        let drained = {
            let mut requests = self.requests();
            requests.remove(&id).is_some() && requests.is_empty()
        };
        if drained {
            self.notify();
        }
    }
}

/// Add every link of a fetched document that is not bookmarked yet
///
/// Returns how many bookmarks were added.
fn merge_links(bookmarks: &Bookmarks, source: BookmarkId, base: &str, body: &str) -> usize {
    let mut added = 0;
    for line in body.lines() {
        let Some(link) = links::parse_link_line(line) else {
            continue;
        };
        let url = links::canonical(&links::absolute(base, link.url));
        let title = if link.label.is_empty() {
            links::host(&url).unwrap_or_default()
        } else {
            link.label.to_string()
        };
        if bookmarks
            .insert_remote(&url, &title, source, REMOTE_ICON)
            .is_some()
        {
            added += 1;
        }
    }
    added
}

/// Runs sync cycles for the remote sources of a bookmark store
///
/// Dropping it cancels every fetch still in flight.
pub struct RemoteSync {
    shared: Arc<Shared>,
    /// Event receiver
    event_rx: Option<mpsc::UnboundedReceiver<BookmarkEvent>>,
}

impl RemoteSync {
    pub fn new(bookmarks: Arc<Bookmarks>, transport: Arc<dyn Transport>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                bookmarks,
                transport,
                requests: Mutex::new(HashMap::new()),
                next_request: AtomicU64::new(1),
                event_tx,
            }),
            event_rx: Some(event_rx),
        }
    }

    /// Take the event receiver (can only be called once)
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<BookmarkEvent>> {
        self.event_rx.take()
    }

    /// Number of fetches still outstanding
    pub fn pending(&self) -> usize {
        self.shared.requests().len()
    }

    /// Check whether no sync cycle is running
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Start a sync cycle
    ///
    /// Does nothing while a previous cycle still has fetches outstanding.
    /// Must be called from within a tokio runtime. Returns the number of
    /// fetches started.
    pub fn fetch_remote(&self) -> usize {
        let mut requests = self.shared.requests();
        if !requests.is_empty() {
            debug!("Remote sync already running");
            return 0;
        }

        let removed = self.shared.bookmarks.remove_where(Bookmark::is_remote);
        if removed > 0 {
            debug!("Purged {} remote bookmarks", removed);
            self.shared.notify();
        }

        let sources = self.shared.bookmarks.remote_sources();
        for source in &sources {
            let id = self.shared.next_request.fetch_add(1, Ordering::Relaxed);
            let fetch = self.shared.transport.fetch(source.url.clone());
            let shared = Arc::clone(&self.shared);
            let handle = tokio::spawn(async move {
                let result = fetch.await;
                shared.request_finished(id, result);
            });
            requests.insert(
                id,
                Request {
                    source: source.id,
                    url: source.url.clone(),
                    handle,
                },
            );
            debug!("Fetching remote bookmarks from {}", source.url);
        }
        sources.len()
    }

    /// Abort every outstanding fetch without merging anything
    pub fn cancel(&self) {
        let mut requests = self.shared.requests();
        for (_, request) in requests.drain() {
            request.handle.abort();
        }
    }
}

impl Drop for RemoteSync {
    fn drop(&mut self) {
        self.cancel();
    }
}
