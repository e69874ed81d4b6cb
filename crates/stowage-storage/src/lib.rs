//! Stowage Storage Library
//!
//! This crate provides the object-storage capability the transfer engine
//! depends on: the `ObjectStorage` trait and implementations for S3 and the
//! local filesystem.
//!
//! # Object addressing
//!
//! Every operation addresses an object by `(bucket, key)` as produced by the
//! destination resolver in `stowage-core`. Backends never rewrite keys.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod metadata;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use metadata::{ObjectMetadata, ServerSideEncryption};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use stowage_core::StorageBackend;
pub use traits::{
    GetObjectOutput, ObjectReader, ObjectStorage, PutObjectOutput, StorageError, StorageResult,
};
