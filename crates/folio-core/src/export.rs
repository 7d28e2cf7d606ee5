//! Bookmark list pages
//!
//! Renders the whole bookmark set as a Gemini document of link lines, either
//! grouped by folder, grouped by tag, or as a dated list. The page is built
//! under the store lock so it reflects a single consistent state.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::Bookmark;
use crate::store::{Bookmarks, SortBy};

/// Grouping of an exported bookmark page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportKind {
    #[default]
    ByFolder,
    ByTag,
    ByCreationTime,
}

fn push_link(out: &mut String, bm: &Bookmark) {
    let _ = writeln!(out, "=> {} {}", bm.url, bm.title);
}

/// Render the bookmark page for `kind`
pub fn bookmark_list_page(store: &Bookmarks, kind: ExportKind) -> String {
    let inner = store.lock();
    let mut out = String::new();

    let sort = match kind {
        ExportKind::ByFolder => SortBy::Tree,
        ExportKind::ByTag => SortBy::TitleAscending,
        ExportKind::ByCreationTime => SortBy::CreatedDescending,
    };
    let list = inner.list(|_| true, sort);

    match kind {
        ExportKind::ByFolder => {
            let count = list.iter().filter(|bm| !bm.is_folder()).count();
            out.push_str("# Bookmarks\n\n");
            let _ = write!(
                out,
                "You have {} bookmark{}.\n\nSave this page to export them.\n\n",
                count,
                if count == 1 { "" } else { "s" }
            );
            for bm in list.iter().filter(|bm| !bm.is_folder() && bm.parent_id == 0) {
                push_link(&mut out, bm);
            }
            for bm in &list {
                if bm.is_folder() {
                    let heading = if inner.depth(bm.id) == 0 { "##" } else { "###" };
                    let _ = write!(out, "\n{} {}\n", heading, bm.title);
                } else if bm.parent_id != 0 {
                    push_link(&mut out, bm);
                }
            }
            out.push_str(
                "\nLink lines are bookmarks. Headings are folders. \
                 Other lines are ignored on import.\n",
            );
        }
        ExportKind::ByTag => {
            out.push_str("# Bookmarks by tag\n\n");
            out.push_str("Each heading is a tag followed by the bookmarks carrying it.\n\n");
            let tags: BTreeSet<&str> = list
                .iter()
                .filter(|bm| !bm.is_folder())
                .flat_map(|bm| bm.tag_list())
                .collect();
            for tag in tags {
                let _ = write!(out, "\n## {}\n", tag);
                for bm in list.iter().filter(|bm| !bm.is_folder() && bm.has_tag(tag)) {
                    push_link(&mut out, bm);
                }
            }
            out.push_str(
                "\nLink lines are bookmarks. Headings are tags. \
                 Other lines are ignored on import.\n",
            );
        }
        ExportKind::ByCreationTime => {
            out.push_str("# Bookmarks by creation time\n\n");
            for bm in list.iter().filter(|bm| !bm.is_folder()) {
                let _ = writeln!(
                    out,
                    "=> {} {} - {}",
                    bm.url,
                    bm.created_at.format("%Y-%m-%d"),
                    bm.title
                );
            }
            out.push_str("\nThis page is formatted as a Gemini link list.\n");
        }
    }
    out
}
