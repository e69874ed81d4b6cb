use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use stowage_core::Region;
use stowage_storage::{
    GetObjectOutput, LocalStorage, ObjectMetadata, ObjectReader, ObjectStorage, PutObjectOutput,
    StorageBackend, StorageResult,
};
use tempfile::TempDir;

/// Local object store plus a staging directory, both under one temp dir.
pub struct TestStorage {
    pub temp_dir: TempDir,
    pub store: LocalStorage,
    pub staging_dir: PathBuf,
}

impl TestStorage {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = LocalStorage::new(temp_dir.path().join("objects"))
            .await
            .expect("Failed to create local storage");
        let staging_dir = temp_dir.path().join("staging");
        std::fs::create_dir(&staging_dir).expect("Failed to create staging directory");
        Self {
            temp_dir,
            store,
            staging_dir,
        }
    }

    /// Number of entries left in the staging directory
    pub fn staged_count(&self) -> usize {
        std::fs::read_dir(&self.staging_dir)
            .expect("Failed to list staging directory")
            .count()
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.store.base_path().join(bucket).join(key)
    }

    /// Write a file into the temp dir, outside the store
    pub fn write_source(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join("workspace").join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }
}

/// Local storage that refuses streamed uploads, like the S3 backend
pub struct NonStreamingStorage(pub LocalStorage);

#[async_trait]
impl ObjectStorage for NonStreamingStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        metadata: &ObjectMetadata,
        region: &Region,
    ) -> StorageResult<PutObjectOutput> {
        self.0.put_object(bucket, key, source, metadata, region).await
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        target: &Path,
    ) -> StorageResult<GetObjectOutput> {
        self.0.get_object(bucket, key, target).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// Local storage that records the region each upload was sent to.
///
/// Uploads whose key starts with `slow/` are held back before storing, so
/// tests can overlap them with later uploads.
pub struct RegionRecordingStorage {
    inner: LocalStorage,
    delay: Duration,
    sent: Mutex<Vec<(String, Region)>>,
}

impl RegionRecordingStorage {
    pub fn new(inner: LocalStorage, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// `(key, region)` pairs in the order the uploads completed
    pub fn sent(&self) -> Vec<(String, Region)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn region_for(&self, key: &str) -> Option<Region> {
        self.sent()
            .into_iter()
            .find(|(sent_key, _)| sent_key == key)
            .map(|(_, region)| region)
    }

    async fn hold(&self, key: &str) {
        if key.starts_with("slow/") {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn record(&self, key: &str, region: &Region) {
        self.sent.lock().unwrap().push((key.to_string(), *region));
    }
}

#[async_trait]
impl ObjectStorage for RegionRecordingStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        metadata: &ObjectMetadata,
        region: &Region,
    ) -> StorageResult<PutObjectOutput> {
        self.hold(key).await;
        let output = self.inner.put_object(bucket, key, source, metadata, region).await?;
        self.record(key, region);
        Ok(output)
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
        self.hold(key).await;
        let output = self
            .inner
            .put_object_stream(bucket, key, reader, metadata, region)
            .await?;
        self.record(key, region);
        Ok(output)
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        target: &Path,
    ) -> StorageResult<GetObjectOutput> {
        self.inner.get_object(bucket, key, target).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
