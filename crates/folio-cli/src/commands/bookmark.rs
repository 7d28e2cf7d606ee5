//! Bookmark and folder command handlers

use anyhow::{bail, Result};

use folio_core::{links, Bookmark, BookmarkId, Bookmarks, SortBy};

use crate::output::Output;
use crate::prompt::confirm;

/// Add a bookmark
///
/// Without `--parent` the bookmark goes into the folder used most recently.
pub fn add(
    store: &Bookmarks,
    url: String,
    title: Option<String>,
    tags: Vec<String>,
    parent: Option<BookmarkId>,
    output: &Output,
) -> Result<BookmarkId> {
    let url = links::canonical(&url);
    if url.is_empty() {
        bail!("A bookmark needs a URL. Use `folio folder` to create a folder.");
    }
    if let Some(existing) = store.find_url(&url) {
        bail!("Already bookmarked as {}: {}", existing, url);
    }

    let parent = match parent {
        Some(id) => require_folder(store, id)?,
        None => store.recent_folder(),
    };
    let title = title.unwrap_or_else(|| links::host(&url).unwrap_or_else(|| url.clone()));
    let icon = store.site_icon(&url);

    let id = store.add(&url, &title, "", icon);
    store.update(id, |bm| {
        for tag in &tags {
            bm.add_tag(tag);
        }
        bm.parent_id = parent;
    });
    store.set_recent_folder(parent);

    output.success(&format!("Added bookmark: {}", id));
    if let Some(bm) = store.get(id) {
        output.print_bookmark(&bm);
    }
    Ok(id)
}

/// Create a folder
pub fn folder(
    store: &Bookmarks,
    title: String,
    parent: Option<BookmarkId>,
    output: &Output,
) -> Result<BookmarkId> {
    if title.trim().is_empty() {
        bail!("Folder title cannot be empty");
    }
    let parent = match parent {
        Some(id) => require_folder(store, id)?,
        None => 0,
    };
    let id = store.add_folder(title.trim(), parent);
    output.success(&format!("Created folder: {}", id));
    Ok(id)
}

/// Remove a bookmark, or a folder together with its direct contents
pub fn remove(store: &Bookmarks, id: BookmarkId, yes: bool, output: &Output) -> Result<()> {
    let bm = get(store, id)?;

    if !yes && output.should_prompt() {
        let contents = store.children(id).len();
        if bm.is_folder() && contents > 0 {
            println!("Delete folder: {} ({} item(s) inside)", bm.title, contents);
        } else {
            println!("Delete: {} - {}", bm.id, bm.title);
        }
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.remove(id);
    output.success(&format!("Deleted: {}", id));
    Ok(())
}

/// Which listing order to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ListOrder {
    Created,
    Title,
    Order,
    Tree,
}

impl From<ListOrder> for SortBy {
    fn from(order: ListOrder) -> Self {
        match order {
            ListOrder::Created => SortBy::CreatedDescending,
            ListOrder::Title => SortBy::TitleAscending,
            ListOrder::Order => SortBy::Order,
            ListOrder::Tree => SortBy::Tree,
        }
    }
}

/// List bookmarks, optionally filtered by tag and folder
pub fn list(
    store: &Bookmarks,
    tag: Option<String>,
    parent: Option<BookmarkId>,
    order: ListOrder,
    output: &Output,
) -> Result<()> {
    let bookmarks = store.list(
        |bm| {
            tag.as_deref().map_or(true, |t| bm.has_tag(t))
                && parent.map_or(true, |p| bm.has_parent(p))
        },
        order.into(),
    );

    if order == ListOrder::Tree {
        output.print_bookmarks(&bookmarks, |bm| store.depth(bm.id));
    } else {
        output.print_bookmarks(&bookmarks, |_| 0);
    }
    Ok(())
}

/// Show a single bookmark
pub fn show(store: &Bookmarks, id: BookmarkId, output: &Output) -> Result<()> {
    let bm = get(store, id)?;
    output.print_bookmark(&bm);
    Ok(())
}

/// Look a bookmark up by URL
pub fn find(store: &Bookmarks, url: String, output: &Output) -> Result<()> {
    let Some(id) = store.find_url(&url) else {
        bail!("No bookmark for {}", links::canonical(&url));
    };
    show(store, id, output)
}

/// Move a bookmark to a new position among its siblings
pub fn reorder(store: &Bookmarks, id: BookmarkId, order: i32, output: &Output) -> Result<()> {
    get(store, id)?;
    store.reorder(id, order);
    output.success(&format!("Moved {} to position {}", id, order));
    Ok(())
}

/// Sort the contents of a folder permanently
pub fn sort(store: &Bookmarks, parent: BookmarkId, by: ListOrder, output: &Output) -> Result<()> {
    if parent != 0 {
        require_folder(store, parent)?;
    }
    if matches!(by, ListOrder::Order | ListOrder::Tree) {
        bail!("A folder can only be sorted by title or created");
    }
    store.sort(parent, by.into());
    output.success(&format!("Sorted {} item(s)", store.children(parent).len()));
    Ok(())
}

/// Show or change the folder new bookmarks go into
pub fn recent(store: &Bookmarks, id: Option<BookmarkId>, output: &Output) -> Result<()> {
    if let Some(id) = id {
        if id != 0 {
            require_folder(store, id)?;
        }
        store.set_recent_folder(id);
    }

    let recent = store.recent_folder();
    if output.is_json() {
        println!("{}", serde_json::json!({ "recent_folder": recent }));
    } else if output.is_quiet() {
        println!("{}", recent);
    } else if recent == 0 {
        println!("New bookmarks go to the top level.");
    } else {
        let title = store.get(recent).map(|bm| bm.title).unwrap_or_default();
        println!("New bookmarks go to folder {} ({}).", recent, title);
    }
    Ok(())
}

fn get(store: &Bookmarks, id: BookmarkId) -> Result<Bookmark> {
    store
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Bookmark not found: {}", id))
}

fn require_folder(store: &Bookmarks, id: BookmarkId) -> Result<BookmarkId> {
    let bm = get(store, id)?;
    if !bm.is_folder() {
        bail!("{} is not a folder: {}", id, bm.title);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_add_defaults() {
        let store = Bookmarks::new();
        let id = add(
            &store,
            "example.org".to_string(),
            None,
            vec!["news".to_string(), "news".to_string()],
            None,
            &quiet(),
        )
        .unwrap();

        let bm = store.get(id).unwrap();
        assert_eq!(bm.url, "gemini://example.org/");
        assert_eq!(bm.title, "example.org");
        assert_eq!(bm.tags, "news");
        assert_eq!(bm.parent_id, 0);
    }

    #[test]
    fn test_add_into_folder_becomes_recent() {
        let store = Bookmarks::new();
        let folder_id = folder(&store, "Reading".to_string(), None, &quiet()).unwrap();

        let first = add(
            &store,
            "gemini://a.example/".to_string(),
            Some("A".to_string()),
            vec![],
            Some(folder_id),
            &quiet(),
        )
        .unwrap();
        let second = add(
            &store,
            "gemini://b.example/".to_string(),
            Some("B".to_string()),
            vec![],
            None,
            &quiet(),
        )
        .unwrap();

        assert_eq!(store.recent_folder(), folder_id);
        assert_eq!(store.get(first).unwrap().parent_id, folder_id);
        assert_eq!(store.get(second).unwrap().parent_id, folder_id);
    }

    #[test]
    fn test_add_rejects_duplicates_and_bad_parents() {
        let store = Bookmarks::new();
        let link = store.add("gemini://a.example/", "A", "", 0);

        assert!(add(&store, "gemini://A.example:1965".to_string(), None, vec![], None, &quiet()).is_err());
        assert!(add(&store, "gemini://b.example/".to_string(), None, vec![], Some(link), &quiet()).is_err());
        assert!(add(&store, "gemini://b.example/".to_string(), None, vec![], Some(99), &quiet()).is_err());
        assert!(add(&store, "  ".to_string(), None, vec![], None, &quiet()).is_err());
    }

    #[test]
    fn test_add_inherits_site_icon() {
        let store = Bookmarks::new();
        store.add("gemini://a.example/", "A", "user-icon", 0x1f600);

        let id = add(&store, "gemini://a.example/page".to_string(), None, vec![], None, &quiet()).unwrap();
        assert_eq!(store.get(id).unwrap().icon, 0x1f600);
    }

    #[test]
    fn test_remove_with_yes() {
        let store = Bookmarks::new();
        let id = store.add("gemini://a.example/", "A", "", 0);
        remove(&store, id, true, &quiet()).unwrap();
        assert!(!store.contains(id));
        assert!(remove(&store, id, true, &quiet()).is_err());
    }

    #[test]
    fn test_sort_rejects_non_persistent_orders() {
        let store = Bookmarks::new();
        assert!(sort(&store, 0, ListOrder::Tree, &quiet()).is_err());
        assert!(sort(&store, 0, ListOrder::Title, &quiet()).is_ok());
    }

    #[test]
    fn test_recent_requires_folder() {
        let store = Bookmarks::new();
        let link = store.add("gemini://a.example/", "A", "", 0);
        assert!(recent(&store, Some(link), &quiet()).is_err());

        let folder_id = store.add_folder("F", 0);
        recent(&store, Some(folder_id), &quiet()).unwrap();
        assert_eq!(store.recent_folder(), folder_id);
        recent(&store, Some(0), &quiet()).unwrap();
        assert_eq!(store.recent_folder(), 0);
    }
}
