//! Transfer engine
//!
//! Uploads choose one of three paths: files on this host are handed to the
//! backend by path, remote files are piped straight into backends that accept
//! streams, and everything else is staged to a temporary local file first.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use stowage_core::{Destination, MetadataPair, Region, StorageClass, TransferRecord};
use stowage_storage::{ObjectMetadata, ObjectStorage, PutObjectOutput};
use tokio::io::AsyncWriteExt;

use crate::error::{TransferError, TransferResult};
use crate::file::ArtifactFile;
use crate::metadata::build_metadata;
use crate::staging::StagedFile;

const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Per-upload settings
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub metadata: Vec<MetadataPair>,
    pub storage_class: Option<StorageClass>,
    /// Region name, canonical (`us-west-2`) or legacy (`US_WEST_2`)
    pub region: String,
    pub server_side_encryption: bool,
    /// Recorded on the returned `TransferRecord`
    pub produced: bool,
}

impl UploadOptions {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Default::default()
        }
    }
}

/// Moves single artifacts to and from one storage client
#[derive(Clone)]
pub struct TransferEngine {
    storage: Arc<dyn ObjectStorage>,
    staging_dir: Option<PathBuf>,
}

impl TransferEngine {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            storage,
            staging_dir: None,
        }
    }

    /// Stage remote files in `dir` instead of the OS temp directory
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn storage(&self) -> &Arc<dyn ObjectStorage> {
        &self.storage
    }

    /// Upload `source` to `destination`.
    ///
    /// The region is resolved before any bytes move and sent with this upload
    /// only; an unknown region fails with `TransferError::InvalidRegion` and
    /// nothing is uploaded.
    pub async fn upload(
        &self,
        destination: &Destination,
        source: &dyn ArtifactFile,
        options: &UploadOptions,
    ) -> TransferResult<TransferRecord> {
        let start = Instant::now();

        let region = Region::resolve(&options.region)?;

        let metadata = build_metadata(
            source,
            &options.metadata,
            options.storage_class,
            options.server_side_encryption,
        )
        .await
        .map_err(|e| TransferError::Source {
            path: source.full_path().to_string(),
            source: e,
        })?;

        let bucket = destination.bucket_name();
        let key = destination.object_key();

        let result = if !source.is_remote() {
            self.storage
                .put_object(bucket, key, Path::new(source.full_path()), &metadata, &region)
                .await
                .map_err(TransferError::from)
        } else if self.storage.supports_streaming() {
            self.stream_upload(destination, source, &metadata, &region).await
        } else {
            self.staged_upload(destination, source, &metadata, &region).await
        };

        match result {
            Ok(output) => {
                tracing::info!(
                    source = %source.full_path(),
                    bucket = %bucket,
                    key = %key,
                    region = %region,
                    size_bytes = metadata.content_length.unwrap_or_default(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Uploaded artifact"
                );
                Ok(TransferRecord::new(options.produced, destination, output.e_tag))
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    source = %source.full_path(),
                    bucket = %bucket,
                    key = %key,
                    "Artifact upload failed"
                );
                Err(e)
            }
        }
    }

    async fn stream_upload(
        &self,
        destination: &Destination,
        source: &dyn ArtifactFile,
        metadata: &ObjectMetadata,
        region: &Region,
    ) -> TransferResult<PutObjectOutput> {
        let (mut writer, reader) = tokio::io::duplex(STREAM_BUFFER_SIZE);

        let copy = async move {
            let copied = source.copy_to(&mut writer).await;
            // EOF for the reader whatever happened
            let _ = writer.shutdown().await;
            copied
        };
        let put = self.storage.put_object_stream(
            destination.bucket_name(),
            destination.object_key(),
            Box::pin(reader),
            metadata,
            region,
        );

        match tokio::join!(copy, put) {
            (Ok(_), Ok(output)) => Ok(output),
            // The backend hung up first; its error is the cause
            (Err(e), Err(storage)) if e.kind() == io::ErrorKind::BrokenPipe => {
                Err(storage.into())
            }
            (Err(e), _) => Err(TransferError::Source {
                path: source.full_path().to_string(),
                source: e,
            }),
            (Ok(_), Err(storage)) => Err(storage.into()),
        }
    }

    async fn staged_upload(
        &self,
        destination: &Destination,
        source: &dyn ArtifactFile,
        metadata: &ObjectMetadata,
        region: &Region,
    ) -> TransferResult<PutObjectOutput> {
        let staged = StagedFile::stage(source, self.staging_dir.as_deref()).await?;
        let output = self
            .storage
            .put_object(
                destination.bucket_name(),
                destination.object_key(),
                staged.path(),
                metadata,
                region,
            )
            .await;
        drop(staged);
        Ok(output?)
    }

    /// Fetch `destination` into the local file `target`, creating parent
    /// directories as needed. The record is always marked as produced.
    pub async fn download(
        &self,
        destination: &Destination,
        target: &Path,
    ) -> TransferResult<TransferRecord> {
        let start = Instant::now();

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::Target {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let bucket = destination.bucket_name();
        let key = destination.object_key();

        match self.storage.get_object(bucket, key, target).await {
            Ok(output) => {
                tracing::info!(
                    bucket = %bucket,
                    key = %key,
                    target = %target.display(),
                    size_bytes = output.size_bytes,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Downloaded artifact"
                );
                Ok(TransferRecord::new(true, destination, output.e_tag))
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    "Artifact download failed"
                );
                Err(e.into())
            }
        }
    }
}
