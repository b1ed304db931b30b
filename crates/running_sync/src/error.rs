//! Error types for the sync pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Sync errors.
///
/// `Configuration` and `Authentication` abort the run; every other variant is
/// logged by the caller and the run carries on.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(#[source] garmin_connect_client::GarminError),

    #[error("Fetch error: {0}")]
    Fetch(#[source] garmin_connect_client::GarminError),

    #[error("Failed to persist {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read sync state: {0}")]
    StateRead(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl SyncError {
    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Persist {
            path: path.into(),
            source,
        }
    }

    /// Whether this error should end the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Configuration(_) | SyncError::Authentication(_)
        )
    }
}

impl From<garmin_connect_client::GarminError> for SyncError {
    fn from(err: garmin_connect_client::GarminError) -> Self {
        match err {
            garmin_connect_client::GarminError::Config(msg) => SyncError::Configuration(msg),
            other => SyncError::Fetch(other),
        }
    }
}

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
