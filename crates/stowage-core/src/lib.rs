//! Stowage Core Library
//!
//! This crate provides the domain types shared across all Stowage components:
//! destination naming, management modes, regions, storage classes, transfer
//! records, error types and configuration. Apart from loading configuration,
//! nothing in here performs I/O.

pub mod config;
pub mod error;
pub mod models;
pub mod region;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{StowageError, StowageResult};
pub use models::{
    ArtifactEntry, Destination, JobIdentity, ManagementMode, MetadataPair, StorageClass,
    TransferRecord,
};
pub use region::Region;
pub use storage_types::StorageBackend;
