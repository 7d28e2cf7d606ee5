//! Export command handler

use anyhow::Result;

use folio_core::{bookmark_list_page, Bookmarks, ExportKind};

use crate::output::{Output, OutputFormat};

/// How to group the exported page
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportBy {
    Folder,
    Tag,
    Time,
}

impl From<ExportBy> for ExportKind {
    fn from(by: ExportBy) -> Self {
        match by {
            ExportBy::Folder => ExportKind::ByFolder,
            ExportBy::Tag => ExportKind::ByTag,
            ExportBy::Time => ExportKind::ByCreationTime,
        }
    }
}

/// Print the bookmark list page
///
/// The page itself is printed even in quiet mode; it is the command's data.
pub fn export(store: &Bookmarks, by: ExportBy, output: &Output) -> Result<()> {
    let kind = ExportKind::from(by);
    let page = bookmark_list_page(store, kind);
    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "kind": kind, "page": page }));
        }
        OutputFormat::Human | OutputFormat::Quiet => print!("{}", page),
    }
    Ok(())
}
