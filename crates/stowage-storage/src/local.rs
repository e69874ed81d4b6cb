use crate::metadata::ObjectMetadata;
use crate::traits::{
    GetObjectOutput, ObjectReader, ObjectStorage, PutObjectOutput, StorageError, StorageResult,
};
use crate::StorageBackend;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use stowage_core::Region;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

const METADATA_DIR: &str = ".stowage-meta";
const COPY_BUFFER_SIZE: usize = 64 * 1024;

static PARTIAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Metadata persisted next to each stored object
#[derive(Debug, Serialize, Deserialize)]
struct StoredObject {
    e_tag: String,
    size_bytes: u64,
    metadata: ObjectMetadata,
}

/// Local filesystem storage implementation
///
/// Buckets are directories under `base_path`; object keys map to paths inside
/// them. Object metadata is kept in a parallel `.stowage-meta` tree.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding one directory per bucket
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert bucket and key to a filesystem path with traversal validation
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket.starts_with('.') {
            return Err(StorageError::InvalidKey(format!(
                "Bucket name {:?} is not usable on the local backend",
                bucket
            )));
        }
        if key.is_empty()
            || key.starts_with('/')
            || key.ends_with('/')
            || key.split('/').any(|segment| segment == "..")
        {
            return Err(StorageError::InvalidKey(format!(
                "Object key {:?} contains invalid segments",
                key
            )));
        }

        Ok(self.base_path.join(bucket).join(key))
    }

    fn metadata_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.base_path
            .join(METADATA_DIR)
            .join(bucket)
            .join(format!("{}.json", key))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write `reader` to `bucket`/`key`, hashing as it goes.
    ///
    /// Bytes land in a uniquely named partial file that is only renamed into
    /// place once the full, expected length has been written.
    async fn write_object<R>(
        &self,
        bucket: &str,
        key: &str,
        mut reader: R,
        metadata: &ObjectMetadata,
    ) -> StorageResult<PutObjectOutput>
    where
        R: AsyncRead + Unpin + Send,
    {
        let path = self.object_path(bucket, key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();
        let partial = path.with_file_name(format!(
            ".{}.{}.{}.partial",
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            std::process::id(),
            PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        let written = copy_hashing(&mut reader, &partial).await;
        let (size_bytes, e_tag) = match written {
            Ok(result) => result,
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                return Err(StorageError::UploadFailed(format!(
                    "Failed to write {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if let Some(expected) = metadata.content_length {
            if expected != size_bytes {
                let _ = fs::remove_file(&partial).await;
                tracing::error!(
                    bucket = %bucket,
                    key = %key,
                    expected_bytes = expected,
                    size_bytes = size_bytes,
                    "Local storage upload length mismatch"
                );
                return Err(StorageError::UploadFailed(format!(
                    "Expected {} bytes for {}/{}, received {}",
                    expected, bucket, key, size_bytes
                )));
            }
        }

        fs::rename(&partial, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to move {} into place: {}", path.display(), e))
        })?;

        let stored = StoredObject {
            e_tag: e_tag.clone(),
            size_bytes,
            metadata: metadata.clone(),
        };
        let metadata_path = self.metadata_path(bucket, key);
        self.ensure_parent_dir(&metadata_path).await?;
        let encoded = serde_json::to_vec_pretty(&stored)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        fs::write(&metadata_path, encoded).await?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = size_bytes,
            e_tag = %e_tag,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(PutObjectOutput { e_tag })
    }

    /// Stored metadata for an object, if any was recorded
    pub async fn head_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectMetadata> {
        let path = self.object_path(bucket, key)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, key)));
        }
        let stored = self.read_stored(bucket, key).await?;
        Ok(stored.map(|s| s.metadata).unwrap_or_default())
    }

    async fn read_stored(&self, bucket: &str, key: &str) -> StorageResult<Option<StoredObject>> {
        let metadata_path = self.metadata_path(bucket, key);
        match fs::read(&metadata_path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|e| StorageError::BackendError(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

async fn copy_hashing<R>(reader: &mut R, target: &Path) -> std::io::Result<(u64, String)>
where
    R: AsyncRead + Unpin + Send,
{
    let mut file = fs::File::create(target).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let read = reader.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        file.write_all(&buffer[..read]).await?;
        total += read as u64;
    }

    file.sync_all().await?;
    Ok((total, hex::encode(hasher.finalize())))
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        metadata: &ObjectMetadata,
        region: &Region,
    ) -> StorageResult<PutObjectOutput> {
        tracing::debug!(region = %region, "Local storage ignores region");
        let file = fs::File::open(source).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to open {}: {}", source.display(), e))
        })?;
        self.write_object(bucket, key, file, metadata).await
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn put_object_stream(
        &self,
        bucket: &str,
        key: &str,
        reader: ObjectReader,
        metadata: &ObjectMetadata,
        region: &Region,
    ) -> StorageResult<PutObjectOutput> {
        tracing::debug!(region = %region, "Local storage ignores region");
        self.write_object(bucket, key, reader, metadata).await
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        target: &Path,
    ) -> StorageResult<GetObjectOutput> {
        let path = self.object_path(bucket, key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, key)));
        }

        let e_tag = match self.read_stored(bucket, key).await? {
            Some(stored) => stored.e_tag,
            None => {
                let mut file = fs::File::open(&path).await?;
                let mut hasher = Sha256::new();
                let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
                loop {
                    let read = file.read(&mut buffer).await?;
                    if read == 0 {
                        break;
                    }
                    hasher.update(&buffer[..read]);
                }
                hex::encode(hasher.finalize())
            }
        };

        let size_bytes = fs::copy(&path, target).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to copy {} to {}: {}",
                path.display(),
                target.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(GetObjectOutput { e_tag, size_bytes })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
