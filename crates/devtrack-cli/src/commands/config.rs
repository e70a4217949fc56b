//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use devtrack_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => output.print_json(&config),
        OutputFormat::Quiet => {
            println!("{}", config.backend_url);
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:             {}", config.data_dir.display());
            println!("  backend_url:          {}", config.backend_url);
            println!("  poll_interval_secs:   {}", config.poll_interval_secs);
            println!("  request_timeout_secs: {}", config.request_timeout_secs);
            println!(
                "  log_file:             {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(stderr)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;
    config.validate()?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "backend_url" => {
            config.backend_url = value.trim().trim_end_matches('/').to_string();
        }
        "poll_interval_secs" => {
            config.poll_interval_secs = value
                .parse()
                .context("Invalid value for poll_interval_secs. Use a whole number of seconds.")?;
        }
        "request_timeout_secs" => {
            config.request_timeout_secs = value.parse().context(
                "Invalid value for request_timeout_secs. Use a whole number of seconds.",
            )?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, backend_url, poll_interval_secs, request_timeout_secs, log_file",
                key
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "backend_url", "https://tracker.example.com/").unwrap();
        apply(&mut config, "poll_interval_secs", "30").unwrap();
        apply(&mut config, "log_file", "/tmp/devtrack.log").unwrap();

        assert_eq!(config.backend_url, "https://tracker.example.com");
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/devtrack.log")));

        apply(&mut config, "log_file", "none").unwrap();
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut config = Config::default();
        assert!(apply(&mut config, "poll_interval_secs", "soon").is_err());
        assert!(apply(&mut config, "sync_url", "x").is_err());
    }

    #[test]
    fn test_set_writes_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        set(
            "request_timeout_secs".to_string(),
            "3".to_string(),
            Some(&path),
            &output,
        )
        .unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("request_timeout_secs = 3"));
    }

    #[test]
    fn test_set_refuses_invalid_value() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        let result = set(
            "backend_url".to_string(),
            "localhost:8080".to_string(),
            Some(&path),
            &output,
        );
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
