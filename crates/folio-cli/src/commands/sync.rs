//! Sync command handler

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use folio_core::models::REMOTE_SOURCE_TAG;
use folio_core::{Bookmark, Bookmarks, HttpTransport, RemoteSync, SortBy, Transport};

use crate::output::Output;

/// Fetch every remote source and merge the links it lists
pub async fn sync(store: Arc<Bookmarks>, output: &Output) -> Result<()> {
    let transport = HttpTransport::new().context("Failed to set up HTTP client")?;
    sync_with(store, Arc::new(transport), output).await
}

/// Run one sync cycle over `transport` and wait until it has drained
pub async fn sync_with(
    store: Arc<Bookmarks>,
    transport: Arc<dyn Transport>,
    output: &Output,
) -> Result<()> {
    let sources = store.remote_sources();
    if sources.is_empty() {
        bail!(
            "No remote sources. Tag a bookmark whose page lists links with:\n  \
             folio tag add <id> {}",
            REMOTE_SOURCE_TAG
        );
    }

    let mut sync = RemoteSync::new(Arc::clone(&store), transport);
    let mut events = sync
        .take_events()
        .context("Sync event channel already taken")?;

    output.message(&format!("Fetching {} remote list(s)...", sources.len()));
    sync.fetch_remote();

    while !sync.is_idle() {
        if events.recv().await.is_none() {
            break;
        }
    }

    let fetched = store.list(Bookmark::is_remote, SortBy::Tree);
    output.success(&format!("Sync complete - {} remote bookmark(s)", fetched.len()));
    output.print_bookmarks(&fetched, |_| 0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use folio_core::FetchError;
    use futures_util::future::{BoxFuture, FutureExt};

    struct OnePage;

    impl Transport for OnePage {
        fn fetch(&self, _url: String) -> BoxFuture<'static, Result<String, FetchError>> {
            async { Ok("=> gemini://a.example/ A\n=> gemini://b.example/\n".to_string()) }.boxed()
        }
    }

    #[tokio::test]
    async fn test_sync_merges_links() {
        let store = Arc::new(Bookmarks::new());
        let source = store.add("gemini://lists.example/", "Lists", REMOTE_SOURCE_TAG, 0);

        let output = Output::new(OutputFormat::Quiet);
        sync_with(Arc::clone(&store), Arc::new(OnePage), &output)
            .await
            .unwrap();

        let fetched = store.list(Bookmark::is_remote, SortBy::Order);
        assert_eq!(fetched.len(), 2);
        assert!(fetched.iter().all(|bm| bm.parent_id == source));
    }

    #[tokio::test]
    async fn test_sync_without_sources_fails() {
        let output = Output::new(OutputFormat::Quiet);
        let result = sync_with(Arc::new(Bookmarks::new()), Arc::new(OnePage), &output).await;
        assert!(result.is_err());
    }
}
