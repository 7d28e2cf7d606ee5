//! Folio CLI
//!
//! Command-line interface for folio - hierarchical bookmarks with remote
//! link lists.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio_core::{
    BookmarkId, BookmarkPersistence, Bookmarks, Config, LoadedFormat, StorageError,
};

mod commands;
mod output;
mod prompt;

use commands::bookmark::ListOrder;
use commands::export::ExportBy;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "folio - Hierarchical bookmarks with remote link lists")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a bookmark
    Add {
        /// URL to save (gemini:// is assumed without a scheme)
        url: String,
        /// Title (defaults to the host name)
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Tags to add
        #[arg(short, long)]
        tag: Vec<String>,
        /// Folder to put it in (defaults to the most recent folder)
        #[arg(short, long)]
        parent: Option<BookmarkId>,
    },
    /// Create a folder
    Folder {
        /// Folder title
        title: String,
        /// Containing folder (defaults to the top level)
        #[arg(short, long)]
        parent: Option<BookmarkId>,
    },
    /// Delete a bookmark, or a folder and what is directly inside it
    #[command(name = "rm", alias = "remove")]
    Remove {
        /// Bookmark ID
        id: BookmarkId,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// List bookmarks
    #[command(name = "ls", alias = "list")]
    List {
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Only direct children of this folder (0 for the top level)
        #[arg(short, long)]
        parent: Option<BookmarkId>,
        /// Sort order
        #[arg(short, long, value_enum, default_value = "created")]
        sort: ListOrder,
    },
    /// Show bookmark details
    Show {
        /// Bookmark ID
        id: BookmarkId,
    },
    /// Find the bookmark for a URL
    Find {
        /// URL to look up
        url: String,
    },
    /// Add or remove tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// List all tags
    Tags,
    /// Move a bookmark to a position among its siblings
    Reorder {
        /// Bookmark ID
        id: BookmarkId,
        /// New position
        #[arg(allow_negative_numbers = true)]
        order: i32,
    },
    /// Sort the contents of a folder permanently
    Sort {
        /// Folder ID (0 for the top level)
        parent: BookmarkId,
        /// Sort key
        #[arg(short, long, value_enum, default_value = "title")]
        by: ListOrder,
    },
    /// Show or set the folder new bookmarks go into
    Recent {
        /// Folder ID (0 for the top level)
        id: Option<BookmarkId>,
    },
    /// Print all bookmarks as a Gemini page
    Export {
        /// Grouping
        #[arg(short, long, value_enum, default_value = "folder")]
        by: ExportBy,
    },
    /// Fetch remote link lists
    Sync,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// Add a tag to a bookmark
    Add {
        /// Bookmark ID
        id: BookmarkId,
        /// Tag to add
        tag: String,
    },
    /// Remove a tag from a bookmark
    #[command(alias = "remove")]
    Rm {
        /// Bookmark ID
        id: BookmarkId,
        /// Tag to remove
        tag: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, add_to_bottom, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_deref();

    // Config commands don't need the bookmarks
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let store = Arc::new(Bookmarks::with_add_to_bottom(config.add_to_bottom));
    let persistence = BookmarkPersistence::new(&config);
    let report = persistence
        .load(&store)
        .map_err(|e| storage_failure(&output, "load", e))?;
    if !report.issues.is_empty() {
        output.warn(&format!(
            "Skipped {} unreadable line(s) in {}",
            report.issues.len(),
            persistence.path().display()
        ));
    }
    if report.format == LoadedFormat::Legacy {
        output.warn(&format!(
            "Imported {} bookmarks from the old format; they will be saved to {}",
            report.count,
            persistence.path().display()
        ));
    }

    let is_write = !matches!(
        &cli.command,
        Commands::List { .. }
            | Commands::Show { .. }
            | Commands::Find { .. }
            | Commands::Tags
            | Commands::Export { .. }
            | Commands::Recent { id: None }
    );

    let result = match cli.command {
        Commands::Add {
            url,
            title,
            tag,
            parent,
        } => commands::bookmark::add(&store, url, title, tag, parent, &output).map(|_| ()),
        Commands::Folder { title, parent } => {
            commands::bookmark::folder(&store, title, parent, &output).map(|_| ())
        }
        Commands::Remove { id, yes } => commands::bookmark::remove(&store, id, yes, &output),
        Commands::List { tag, parent, sort } => {
            commands::bookmark::list(&store, tag, parent, sort, &output)
        }
        Commands::Show { id } => commands::bookmark::show(&store, id, &output),
        Commands::Find { url } => commands::bookmark::find(&store, url, &output),
        Commands::Tag { command } => match command {
            TagCommands::Add { id, tag } => commands::tag::add(&store, id, tag, &output),
            TagCommands::Rm { id, tag } => commands::tag::remove(&store, id, tag, &output),
        },
        Commands::Tags => commands::tag::list(&store, &output),
        Commands::Reorder { id, order } => {
            commands::bookmark::reorder(&store, id, order, &output)
        }
        Commands::Sort { parent, by } => commands::bookmark::sort(&store, parent, by, &output),
        Commands::Recent { id } => commands::bookmark::recent(&store, id, &output),
        Commands::Export { by } => commands::export::export(&store, by, &output),
        Commands::Sync => commands::sync::sync(Arc::clone(&store), &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    };

    if result.is_ok() && is_write {
        persistence
            .save(&store)
            .map_err(|e| storage_failure(&output, "save", e))?;
    }

    result
}

/// Turn a storage error into the command's failure, showing how to fix it
fn storage_failure(output: &Output, action: &str, err: StorageError) -> anyhow::Error {
    if let Some(hint) = err.recovery_suggestion() {
        output.warn(hint);
    }
    anyhow::Error::new(err).context(format!("Failed to {} bookmarks", action))
}

/// Initialize logging
///
/// Only initializes if FOLIO_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log).
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("FOLIO_LOG") else {
        return;
    };

    let log_path = config.log_path();
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!("folio_core={},folio={}", log_level, log_level));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_storage_failure_keeps_cause() {
        let output = Output::new(OutputFormat::Quiet);
        let err = StorageError::from_io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            PathBuf::from("/data/bookmarks.ini"),
        );

        let err = storage_failure(&output, "save", err);
        assert_eq!(err.to_string(), "Failed to save bookmarks");
        let cause = err.downcast_ref::<StorageError>().unwrap();
        assert!(matches!(cause, StorageError::PermissionDenied { .. }));
        assert!(cause.recovery_suggestion().is_some());
    }
}
