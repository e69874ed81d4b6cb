//! Configuration module
//!
//! Process-wide settings for the storage backend, staging and the transfer
//! worker pool. Per-entry settings (bucket, region, storage class, ...) come
//! from `ArtifactEntry` instead.

use std::env;
use std::path::PathBuf;

use crate::region::Region;
use crate::storage_types::StorageBackend;

const DEFAULT_REGION: &str = "us-east-1";
const MAX_TRANSFER_CONCURRENCY: usize = 16;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: String,
    pub local_storage_path: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub transfer_concurrency: Option<usize>,
    pub project: Option<String>,
    pub build_id: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse()?,
            None => StorageBackend::S3,
        };

        let transfer_concurrency = var("TRANSFER_CONCURRENCY")
            .map(|s| {
                s.parse::<usize>()
                    .map_err(|_| anyhow::anyhow!("TRANSFER_CONCURRENCY must be a valid number"))
            })
            .transpose()?;

        let build_id = var("STOWAGE_BUILD_ID")
            .map(|s| {
                s.parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("STOWAGE_BUILD_ID must be a valid number"))
            })
            .transpose()?;

        let config = Config {
            storage_backend,
            s3_endpoint: var("S3_ENDPOINT").filter(|s| !s.is_empty()),
            aws_region: var("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            local_storage_path: var("LOCAL_STORAGE_PATH").map(PathBuf::from),
            staging_dir: var("STAGING_DIR").map(PathBuf::from),
            transfer_concurrency,
            project: var("STOWAGE_PROJECT"),
            build_id,
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_backend == StorageBackend::Local && self.local_storage_path.is_none() {
            return Err(anyhow::anyhow!(
                "STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH to be set"
            ));
        }

        if self.transfer_concurrency == Some(0) {
            return Err(anyhow::anyhow!("TRANSFER_CONCURRENCY must be at least 1"));
        }

        Region::resolve(&self.aws_region)
            .map_err(|e| anyhow::anyhow!("AWS_REGION is not usable: {}", e))?;

        Ok(())
    }

    /// Worker-pool size for `artifact_count` transfers.
    pub fn concurrency_for(&self, artifact_count: usize) -> usize {
        self.transfer_concurrency
            .unwrap_or_else(|| artifact_count.min(MAX_TRANSFER_CONCURRENCY))
            .max(1)
    }
}
