#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;
use stowage_storage::ObjectStorage;
use stowage_transfer::TransferEngine;

pub use fixtures::MemoryArtifactFile;
pub use storage::{NonStreamingStorage, RegionRecordingStorage, TestStorage};

/// Engine over a fresh local store that streams remote artifacts
pub async fn streaming_engine() -> (TestStorage, TransferEngine) {
    let storage = TestStorage::new().await;
    let backend: Arc<dyn ObjectStorage> = Arc::new(storage.store.clone());
    let engine = TransferEngine::new(backend).with_staging_dir(&storage.staging_dir);
    (storage, engine)
}

/// Engine over a fresh local store that must stage remote artifacts
pub async fn staging_engine() -> (TestStorage, TransferEngine) {
    let storage = TestStorage::new().await;
    let backend: Arc<dyn ObjectStorage> = Arc::new(NonStreamingStorage(storage.store.clone()));
    let engine = TransferEngine::new(backend).with_staging_dir(&storage.staging_dir);
    (storage, engine)
}

/// Engine whose backend records the region of every upload; `slow/` keys
/// are delayed by `delay`
pub async fn region_recording_engine(
    delay: Duration,
) -> (TestStorage, Arc<RegionRecordingStorage>, TransferEngine) {
    let storage = TestStorage::new().await;
    let recorder = Arc::new(RegionRecordingStorage::new(storage.store.clone(), delay));
    let backend: Arc<dyn ObjectStorage> = recorder.clone();
    let engine = TransferEngine::new(backend).with_staging_dir(&storage.staging_dir);
    (storage, recorder, engine)
}
