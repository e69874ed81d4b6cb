//! File-access capability
//!
//! The engine never touches artifacts directly; it goes through `ArtifactFile`
//! so files on this host and files held by a remote agent look the same.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use stowage_core::models::base_name;
use tokio::fs;
use tokio::io::AsyncWrite;

/// An artifact the engine can measure and copy.
#[async_trait]
pub trait ArtifactFile: Send + Sync {
    /// `false` when `full_path` is directly readable from this process
    fn is_remote(&self) -> bool;

    async fn length(&self) -> io::Result<u64>;

    async fn last_modified(&self) -> io::Result<DateTime<Utc>>;

    /// File name without any directory component
    fn base_name(&self) -> &str;

    /// Path of the file where it lives (on this host or on the agent)
    fn full_path(&self) -> &str;

    /// Copy every byte of the file into `writer`, returning the count
    async fn copy_to(&self, writer: &mut (dyn AsyncWrite + Send + Unpin)) -> io::Result<u64>;
}

/// A file on this host
#[derive(Debug, Clone)]
pub struct LocalArtifactFile {
    path: PathBuf,
    full_path: String,
    base_name: String,
    relayed: bool,
}

impl LocalArtifactFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let full_path = path.to_string_lossy().into_owned();
        let base_name = base_name(&full_path).to_string();
        Self {
            path,
            full_path,
            base_name,
            relayed: false,
        }
    }

    /// A file whose bytes must be relayed through this process instead of
    /// being uploaded from its path, as for an agent without storage access.
    pub fn relayed(path: impl Into<PathBuf>) -> Self {
        Self {
            relayed: true,
            ..Self::new(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ArtifactFile for LocalArtifactFile {
    fn is_remote(&self) -> bool {
        self.relayed
    }

    async fn length(&self) -> io::Result<u64> {
        Ok(fs::metadata(&self.path).await?.len())
    }

    async fn last_modified(&self) -> io::Result<DateTime<Utc>> {
        let modified = fs::metadata(&self.path).await?.modified()?;
        Ok(DateTime::<Utc>::from(modified))
    }

    fn base_name(&self) -> &str {
        &self.base_name
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }

    async fn copy_to(&self, writer: &mut (dyn AsyncWrite + Send + Unpin)) -> io::Result<u64> {
        let mut file = fs::File::open(&self.path).await?;
        tokio::io::copy(&mut file, writer).await
    }
}
