//! Storage abstraction trait
//!
//! This module defines the narrow capability set the transfer engine needs from
//! an object-storage service.

use crate::metadata::ObjectMetadata;
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use std::pin::Pin;
use stowage_core::Region;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Reader handed to streaming uploads
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Result of storing an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectOutput {
    /// Integrity tag reported by the service (ETag equivalent, unquoted)
    pub e_tag: String,
}

/// Result of fetching an object into a local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetObjectOutput {
    pub e_tag: String,
    pub size_bytes: u64,
}

/// Storage client capability
///
/// Implementations must be safe to share between concurrent transfers that
/// address independent bucket/key pairs; the engine adds no locking of its own.
/// Every upload names its region, so no per-client region state exists.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store the local file at `source` under `bucket`/`key` in `region`
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        metadata: &ObjectMetadata,
        region: &Region,
    ) -> StorageResult<PutObjectOutput>;

    /// Whether `put_object_stream` is available.
    ///
    /// Backends that return `false` only ever receive uploads from local paths.
    fn supports_streaming(&self) -> bool {
        false
    }

    /// Store an object read from `reader` until EOF.
    ///
    /// When `metadata.content_length` is set, a reader yielding a different
    /// number of bytes fails the upload and nothing is stored.
    async fn put_object_stream(
        &self,
        bucket: &str,
        key: &str,
        _reader: ObjectReader,
        _metadata: &ObjectMetadata,
        _region: &Region,
    ) -> StorageResult<PutObjectOutput> {
        Err(StorageError::ConfigError(format!(
            "{} backend cannot upload {}/{} from a stream",
            self.backend_type(),
            bucket,
            key
        )))
    }

    /// Fetch `bucket`/`key` into the local file at `target`
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        target: &Path,
    ) -> StorageResult<GetObjectOutput>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
