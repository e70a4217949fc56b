//! Command handlers

pub mod config;
pub mod devices;
pub mod edit;
pub mod session;
pub mod status;
pub mod watch;

use anyhow::anyhow;

use devtrack_core::SyncError;

/// Turn a sync error into a CLI error carrying its recovery hint
pub fn with_hint(err: SyncError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(hint) => anyhow!("{}\n  {}", err, hint),
        None => anyhow::Error::new(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_hint() {
        let err = with_hint(SyncError::NotAuthenticated);
        assert!(err.to_string().contains("devtrack login"));

        let err = with_hint(SyncError::Http {
            endpoint: "/device-locations".to_string(),
            status: 404,
        });
        assert!(!err.to_string().contains('\n'));
    }
}
