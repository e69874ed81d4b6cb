use std::io;
use std::path::PathBuf;

use stowage_core::StowageError;
use stowage_storage::StorageError;

/// Transfer errors
///
/// Every variant except `InvalidRegion` means bytes failed to move; callers
/// decide whether that aborts the batch or is recorded and skipped.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Failed to stage {path} locally: {source}")]
    Staging {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read source file {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to prepare target file {path}: {source}")]
    Target {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TransferError {
    /// Whether the object was absent on download
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransferError::Storage(StorageError::NotFound(_)))
    }
}

impl From<StowageError> for TransferError {
    fn from(err: StowageError) -> Self {
        match err {
            StowageError::InvalidRegion(region) => TransferError::InvalidRegion(region),
            other => TransferError::Storage(StorageError::ConfigError(other.to_string())),
        }
    }
}

/// Result type for transfer operations
pub type TransferResult<T> = Result<T, TransferError>;
