//! Config command handlers

use std::path::Path;

use anyhow::{bail, Context, Result};

use folio_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "add_to_bottom": config.add_to_bottom,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:      {}", config.data_dir.display());
            println!("  add_to_bottom: {}", config.add_to_bottom);
            println!(
                "  log_file:      {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file:    {}", effective_path.display());
            println!("Bookmarks file: {}", config.bookmarks_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, config_path: Option<&Path>, output: &Output) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match key.as_str() {
        "data_dir" => {
            config.data_dir = value.clone().into();
        }
        "add_to_bottom" => {
            config.add_to_bottom = value
                .parse()
                .context("Invalid value for add_to_bottom. Use 'true' or 'false'.")?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.clone().into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, add_to_bottom, log_file",
                key
            );
        }
    }

    // Save to the CLI-specified path or default
    let save_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Config file pointing at a data directory inside `temp_dir`
    fn write_config(temp_dir: &TempDir) -> std::path::PathBuf {
        let path = temp_dir.path().join("config.toml");
        let data_dir = temp_dir.path().join("data");
        std::fs::write(&path, format!("data_dir = {:?}\n", data_dir.display().to_string())).unwrap();
        path
    }

    #[test]
    fn test_set_writes_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir);
        let output = Output::new(OutputFormat::Quiet);

        set("add_to_bottom".to_string(), "true".to_string(), Some(path.as_path()), &output).unwrap();
        set("log_file".to_string(), "/tmp/folio.log".to_string(), Some(path.as_path()), &output).unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert!(config.add_to_bottom);
        assert_eq!(config.log_file, Some(std::path::PathBuf::from("/tmp/folio.log")));

        set("log_file".to_string(), "none".to_string(), Some(path.as_path()), &output).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("log_file"));
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir);
        let before = std::fs::read_to_string(&path).unwrap();
        let output = Output::new(OutputFormat::Quiet);

        assert!(set("colour".to_string(), "red".to_string(), Some(path.as_path()), &output).is_err());
        assert!(set("add_to_bottom".to_string(), "maybe".to_string(), Some(path.as_path()), &output).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}
