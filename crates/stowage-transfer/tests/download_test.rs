//! Download integration tests against the local backend.
//!
//! Run with: `cargo test -p stowage-transfer --test download_test`

mod helpers;

use helpers::streaming_engine;
use stowage_core::{Destination, JobIdentity, ManagementMode};
use stowage_transfer::{LocalArtifactFile, UploadOptions};

#[tokio::test]
async fn test_download_missing_object_is_not_found() {
    let (storage, engine) = streaming_engine().await;
    let destination = Destination::unmanaged("bucket", "absent.txt").unwrap();
    let target = storage.temp_dir.path().join("out/absent.txt");

    let err = engine.download(&destination, &target).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(!target.exists());
}

#[tokio::test]
async fn test_download_resolves_managed_names() {
    let (storage, engine) = streaming_engine().await;
    let job = JobIdentity::new("svc", 3);
    let source_path = storage.write_source("dist/svc.bin", b"binary");

    let upload_to = Destination::resolve(
        "bucket",
        &source_path.to_string_lossy(),
        0,
        ManagementMode::ManagedFlattened,
        &job,
    )
    .unwrap();
    engine
        .upload(
            &upload_to,
            &LocalArtifactFile::new(&source_path),
            &UploadOptions::new("us-east-1"),
        )
        .await
        .unwrap();

    let download_from =
        Destination::for_file_name("bucket", "svc.bin", ManagementMode::ManagedFlattened, &job)
            .unwrap();
    assert_eq!(download_from.object_key(), upload_to.object_key());

    let target = storage.temp_dir.path().join("restore/svc.bin");
    let record = engine.download(&download_from, &target).await.unwrap();

    assert!(record.produced());
    assert!(record.success());
    assert_eq!(record.file_name(), "svc.bin");
    assert_eq!(std::fs::read(&target).unwrap(), b"binary");
}

#[tokio::test]
async fn test_download_overwrites_existing_target() {
    let (storage, engine) = streaming_engine().await;
    let source_path = storage.write_source("notes.txt", b"fresh");
    let destination = Destination::unmanaged("bucket", "notes.txt").unwrap();
    engine
        .upload(
            &destination,
            &LocalArtifactFile::new(&source_path),
            &UploadOptions::new("us-east-1"),
        )
        .await
        .unwrap();

    let target = storage.temp_dir.path().join("notes.txt");
    std::fs::write(&target, b"stale contents that are longer").unwrap();

    engine.download(&destination, &target).await.unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"fresh");
}
