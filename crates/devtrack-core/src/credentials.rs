//! Credential stores
//!
//! - [`MemoryCredentials`]: token held in process memory only
//! - [`TokenFile`]: token kept in `{data_dir}/token` so separate CLI runs
//!   share one login
//!
//! The token file is read once on open and cached; reads never touch disk.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::debug;

use crate::session::{CredentialStore, SessionOracle};

/// In-memory token slot
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    token: RwLock<Option<String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl SessionOracle for MemoryCredentials {
    fn current_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

impl CredentialStore for MemoryCredentials {
    fn store(&self, token: &str) -> Result<()> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.write() = None;
        Ok(())
    }
}

/// Token persisted as a plain file
#[derive(Debug)]
pub struct TokenFile {
    path: PathBuf,
    cached: RwLock<Option<String>>,
}

impl TokenFile {
    /// Open the token file at `path`, loading any token already stored there
    ///
    /// A missing or blank file means anonymous.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cached = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read token from {:?}", path))?;
            let token = content.trim();
            (!token.is_empty()).then(|| token.to_string())
        } else {
            None
        };

        Ok(Self {
            path,
            cached: RwLock::new(cached),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionOracle for TokenFile {
    fn current_token(&self) -> Option<String> {
        self.cached.read().clone()
    }
}

impl CredentialStore for TokenFile {
    fn store(&self, token: &str) -> Result<()> {
        let token = token.trim();
        atomic_write(&self.path, token.as_bytes())
            .with_context(|| format!("Failed to save token to {:?}", self.path))?;
        *self.cached.write() = Some(token.to_string());
        debug!("Stored token at {:?}", self.path);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.cached.write() = None;
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to delete {:?}", self.path))?;
            debug!("Removed token at {:?}", self.path);
        }
        Ok(())
    }
}

/// Write data to a file atomically
///
/// Writes a sibling temp file, syncs it, then renames it over the target so
/// the target is never left partially written.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;

    file.write_all(data)
        .with_context(|| format!("Failed to write to temp file {:?}", temp_path))?;

    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {:?}", temp_path))?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_credentials() {
        let credentials = MemoryCredentials::new();
        assert!(!credentials.is_authenticated());

        credentials.store("t1").unwrap();
        assert_eq!(credentials.current_token().as_deref(), Some("t1"));

        credentials.clear().unwrap();
        assert!(credentials.current_token().is_none());
    }

    #[test]
    fn test_token_file_missing_is_anonymous() {
        let temp_dir = TempDir::new().unwrap();
        let tokens = TokenFile::open(temp_dir.path().join("token")).unwrap();
        assert!(!tokens.is_authenticated());
    }

    #[test]
    fn test_token_file_persists_across_opens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("token");

        {
            let tokens = TokenFile::open(&path).unwrap();
            tokens.store("  secret-token\n").unwrap();
            assert_eq!(tokens.current_token().as_deref(), Some("secret-token"));
        }

        let reopened = TokenFile::open(&path).unwrap();
        assert_eq!(reopened.current_token().as_deref(), Some("secret-token"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_token_file_clear_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token");
        let tokens = TokenFile::open(&path).unwrap();
        tokens.store("secret").unwrap();

        tokens.clear().unwrap();
        assert!(!path.exists());
        assert!(!tokens.is_authenticated());

        // Clearing twice is fine
        tokens.clear().unwrap();
    }

    #[test]
    fn test_blank_token_file_is_anonymous() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token");
        fs::write(&path, "\n").unwrap();

        let tokens = TokenFile::open(&path).unwrap();
        assert!(tokens.current_token().is_none());
    }
}
