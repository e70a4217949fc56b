//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/devtrack/config.toml)
//! 3. Environment variables (DEVTRACK_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "DEVTRACK";

/// Backend address of a locally run server
const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Directory for local state (credential token)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Base URL of the device backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Seconds between device polls in watch mode
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Per-request timeout for backend calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log file path (defaults to stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend_url: default_backend_url(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (DEVTRACK_DATA_DIR, DEVTRACK_BACKEND_URL, ...)
    /// 2. Config file (~/.config/devtrack/config.toml or DEVTRACK_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring an explicit `--config` path when given
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_BACKEND_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.backend_url = val;
            }
        }

        // Unparseable numbers are ignored rather than failing startup
        if let Ok(val) = std::env::var(format!("{}_POLL_INTERVAL", ENV_PREFIX)) {
            if let Ok(secs) = val.trim().parse() {
                self.poll_interval_secs = secs;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_REQUEST_TIMEOUT", ENV_PREFIX)) {
            if let Ok(secs) = val.trim().parse() {
                self.request_timeout_secs = secs;
            }
        }
    }

    fn normalize(&mut self) {
        let trimmed = self.backend_url.trim().trim_end_matches('/');
        self.backend_url = trimmed.to_string();
    }

    /// Reject values the poller and HTTP client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.backend_url.is_empty() {
            bail!("backend_url must not be empty");
        }
        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            bail!(
                "backend_url must start with http:// or https:// (got '{}')",
                self.backend_url
            );
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with DEVTRACK_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("devtrack")
            .join("config.toml")
    }

    /// Path of the persisted bearer token
    pub fn token_path(&self) -> PathBuf {
        self.data_dir.join("token")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("devtrack")
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "DEVTRACK_DATA_DIR",
        "DEVTRACK_BACKEND_URL",
        "DEVTRACK_POLL_INTERVAL",
        "DEVTRACK_REQUEST_TIMEOUT",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend_url, "http://localhost:8080");
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.data_dir.ends_with("devtrack"));
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_token_path() {
        let config = Config::default();
        assert!(config.token_path().ends_with("token"));
        assert!(config.token_path().starts_with(&config.data_dir));
    }

    #[test]
    fn test_env_override_backend_url() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("DEVTRACK_BACKEND_URL", "https://tracker.example.com/");
        config.apply_env_overrides();
        config.normalize();
        assert_eq!(config.backend_url, "https://tracker.example.com");

        // Empty string keeps the current value
        env::set_var("DEVTRACK_BACKEND_URL", "");
        config.apply_env_overrides();
        assert_eq!(config.backend_url, "https://tracker.example.com");
    }

    #[test]
    fn test_env_override_intervals() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("DEVTRACK_POLL_INTERVAL", "30");
        env::set_var("DEVTRACK_REQUEST_TIMEOUT", "not-a-number");
        config.apply_env_overrides();

        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("DEVTRACK_DATA_DIR", "/tmp/devtrack-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/devtrack-test"));
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            backend_url = "http://10.0.0.5:8080/"
            poll_interval_secs = 15
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.backend_url, "http://10.0.0.5:8080");
        assert_eq!(config.poll_interval_secs, 15);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let _guard = EnvGuard::new(ENV_VARS);

        let err = Config::load_from_str("poll_interval_secs = 0").unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn test_backend_url_scheme_rejected() {
        let _guard = EnvGuard::new(ENV_VARS);

        let err = Config::load_from_str(r#"backend_url = "localhost:8080""#).unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: PathBuf::from("/data/devtrack"),
            backend_url: "https://gps.example.com".to_string(),
            poll_interval_secs: 20,
            request_timeout_secs: 3,
            log_file: Some(PathBuf::from("/tmp/devtrack.log")),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.backend_url, "http://localhost:8080");
        assert_eq!(config.poll_interval_secs, 5);
    }
}
