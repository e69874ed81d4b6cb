//! Upload integration tests against the local backend.
//!
//! Run with: `cargo test -p stowage-transfer --test upload_test`

mod helpers;

use helpers::{region_recording_engine, staging_engine, streaming_engine, MemoryArtifactFile};
use std::time::Duration;
use stowage_core::{Destination, JobIdentity, ManagementMode, MetadataPair, StorageClass};
use stowage_storage::ServerSideEncryption;
use stowage_transfer::{ArtifactFile, LocalArtifactFile, TransferError, UploadOptions};

#[tokio::test]
async fn test_upload_then_download_is_byte_identical() {
    let (storage, engine) = streaming_engine().await;
    let source_path = storage.write_source("target/app.jar", b"jar contents");
    let source = LocalArtifactFile::new(&source_path);

    let destination = Destination::unmanaged("releases/v1", "app.jar").unwrap();
    let uploaded = engine
        .upload(&destination, &source, &UploadOptions::new("us-east-1"))
        .await
        .unwrap();

    assert!(uploaded.success());
    assert!(!uploaded.produced());
    assert_eq!(uploaded.user_bucket_spec(), "releases/v1");
    assert_eq!(uploaded.file_name(), "app.jar");
    assert!(storage.object_path("releases", "v1/app.jar").is_file());

    let target = storage.temp_dir.path().join("downloads/nested/app.jar");
    let downloaded = engine.download(&destination, &target).await.unwrap();

    assert!(downloaded.produced());
    assert_eq!(downloaded.checksum(), uploaded.checksum());
    assert_eq!(std::fs::read(&target).unwrap(), b"jar contents");
}

#[tokio::test]
async fn test_managed_upload_uses_job_prefix() {
    let (storage, engine) = streaming_engine().await;
    let source_path = storage.write_source("build/out/report.txt", b"report");
    let job = JobIdentity::new("web-app", 17);
    let search_root = format!("{}/", storage.temp_dir.path().join("workspace/build").display());
    let candidate = source_path.to_string_lossy();

    let destination = Destination::resolve(
        "artifacts",
        &candidate,
        search_root.chars().count(),
        ManagementMode::ManagedStructured,
        &job,
    )
    .unwrap();
    assert_eq!(destination.object_key(), "jobs/web-app/17/out/report.txt");

    let source = LocalArtifactFile::new(&source_path);
    engine
        .upload(&destination, &source, &UploadOptions::new("us-east-1"))
        .await
        .unwrap();

    assert_eq!(
        std::fs::read(storage.object_path("artifacts", "jobs/web-app/17/out/report.txt")).unwrap(),
        b"report"
    );
}

#[tokio::test]
async fn test_upload_records_headers_and_user_metadata() {
    let (storage, engine) = streaming_engine().await;
    let source_path = storage.write_source("site/index.html", b"<html></html>");
    let source = LocalArtifactFile::new(&source_path);
    let destination = Destination::unmanaged("site", "index.html").unwrap();

    let options = UploadOptions {
        metadata: vec![
            MetadataPair::new("Cache-Control", "max-age=60"),
            MetadataPair::new("Content-Encoding", "identity"),
            MetadataPair::new("Expires", "soon"),
            MetadataPair::new("Team", "platform"),
        ],
        storage_class: Some(StorageClass::ReducedRedundancy),
        server_side_encryption: true,
        produced: true,
        ..UploadOptions::new("us-east-1")
    };
    let record = engine.upload(&destination, &source, &options).await.unwrap();
    assert!(record.produced());

    let stored = storage.store.head_object("site", "index.html").await.unwrap();
    assert_eq!(stored.content_type.as_deref(), Some("text/html"));
    assert_eq!(stored.content_length, Some(13));
    assert_eq!(stored.cache_control.as_deref(), Some("max-age=60"));
    assert_eq!(stored.content_encoding.as_deref(), Some("identity"));
    assert_eq!(stored.expires, None);
    assert_eq!(stored.user_metadata_value("expires"), Some("soon"));
    assert_eq!(stored.user_metadata_value("team"), Some("platform"));
    assert_eq!(stored.storage_class, Some(StorageClass::ReducedRedundancy));
    assert_eq!(
        stored.server_side_encryption,
        Some(ServerSideEncryption::Aes256)
    );
}

#[tokio::test]
async fn test_legacy_and_canonical_region_names_agree() {
    let (storage, recorder, engine) = region_recording_engine(Duration::ZERO).await;
    let source_path = storage.write_source("a.txt", b"same bytes");
    let source = LocalArtifactFile::new(&source_path);

    let canonical = Destination::unmanaged("bucket/canonical", "a.txt").unwrap();
    let legacy = Destination::unmanaged("bucket/legacy", "a.txt").unwrap();

    engine
        .upload(&canonical, &source, &UploadOptions::new("us-west-2"))
        .await
        .unwrap();
    engine
        .upload(&legacy, &source, &UploadOptions::new("US_WEST_2"))
        .await
        .unwrap();

    let from_canonical = recorder.region_for("canonical/a.txt").unwrap();
    let from_legacy = recorder.region_for("legacy/a.txt").unwrap();
    assert_eq!(from_canonical, from_legacy);
    assert_eq!(from_legacy.name(), "us-west-2");
}

#[tokio::test]
async fn test_concurrent_uploads_keep_their_own_region() {
    let (storage, recorder, engine) =
        region_recording_engine(Duration::from_millis(50)).await;
    let eu_path = storage.write_source("eu.txt", b"eu bytes");
    let us_path = storage.write_source("us.txt", b"us bytes");
    let eu_source = LocalArtifactFile::new(&eu_path);
    let us_source = LocalArtifactFile::new(&us_path);

    let eu_destination = Destination::unmanaged("bucket/slow", "eu.txt").unwrap();
    let us_destination = Destination::unmanaged("bucket", "us.txt").unwrap();
    let eu_options = UploadOptions::new("eu-west-1");
    let us_options = UploadOptions::new("us-east-1");

    let eu_upload = engine.upload(&eu_destination, &eu_source, &eu_options);
    let us_upload = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        engine.upload(&us_destination, &us_source, &us_options).await
    };
    let (eu, us) = tokio::join!(eu_upload, us_upload);
    eu.unwrap();
    us.unwrap();

    let sent = recorder.sent();
    // The delayed upload finishes last, after the other one picked its region
    assert_eq!(sent[0].0, "us.txt");
    assert_eq!(recorder.region_for("slow/eu.txt").unwrap().name(), "eu-west-1");
    assert_eq!(recorder.region_for("us.txt").unwrap().name(), "us-east-1");
}

#[tokio::test]
async fn test_unknown_region_uploads_nothing() {
    let (storage, engine) = streaming_engine().await;
    let source_path = storage.write_source("a.txt", b"never stored");
    let source = LocalArtifactFile::new(&source_path);
    let destination = Destination::unmanaged("bucket", "a.txt").unwrap();

    let err = engine
        .upload(&destination, &source, &UploadOptions::new("mars-north-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::InvalidRegion(ref r) if r == "mars-north-1"));
    assert!(!storage.object_path("bucket", "a.txt").exists());
}

#[tokio::test]
async fn test_missing_local_source_fails_without_record() {
    let (storage, engine) = streaming_engine().await;
    let source = LocalArtifactFile::new(storage.temp_dir.path().join("gone.bin"));
    let destination = Destination::unmanaged("bucket", "gone.bin").unwrap();

    let err = engine
        .upload(&destination, &source, &UploadOptions::new("us-east-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Source { .. }));
}

#[tokio::test]
async fn test_remote_artifact_streams_into_backend() {
    let (storage, engine) = streaming_engine().await;
    let source = MemoryArtifactFile::new("/agent/ws/dist/bundle.js", b"console.log(1)");
    let destination = Destination::unmanaged("cdn", source.base_name()).unwrap();

    let record = engine
        .upload(&destination, &source, &UploadOptions::new("eu-west-1"))
        .await
        .unwrap();

    assert!(record.success());
    assert_eq!(
        std::fs::read(storage.object_path("cdn", "bundle.js")).unwrap(),
        b"console.log(1)"
    );
    assert_eq!(storage.staged_count(), 0);
}

#[tokio::test]
async fn test_interrupted_stream_stores_nothing() {
    let (storage, engine) = streaming_engine().await;
    let source = MemoryArtifactFile::failing_after("/agent/ws/big.bin", &[7u8; 4096], 1000);
    let destination = Destination::unmanaged("bucket", "big.bin").unwrap();

    let err = engine
        .upload(&destination, &source, &UploadOptions::new("us-east-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Source { .. }));
    assert!(!storage.object_path("bucket", "big.bin").exists());
}

#[tokio::test]
async fn test_remote_artifact_is_staged_for_path_only_backend() {
    let (storage, engine) = staging_engine().await;
    let source = MemoryArtifactFile::new("/agent/ws/app.tar.gz", b"tarball");
    let destination = Destination::unmanaged("bucket", "app.tar.gz").unwrap();

    engine
        .upload(&destination, &source, &UploadOptions::new("us-east-1"))
        .await
        .unwrap();

    assert_eq!(
        std::fs::read(storage.object_path("bucket", "app.tar.gz")).unwrap(),
        b"tarball"
    );
    assert_eq!(storage.staged_count(), 0);
}

#[tokio::test]
async fn test_staging_file_removed_when_relay_fails() {
    let (storage, engine) = staging_engine().await;
    let source = MemoryArtifactFile::failing_after("/agent/ws/app.tar.gz", b"tarball", 3);
    let destination = Destination::unmanaged("bucket", "app.tar.gz").unwrap();

    let err = engine
        .upload(&destination, &source, &UploadOptions::new("us-east-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Staging { .. }));
    assert_eq!(storage.staged_count(), 0);
    assert!(!storage.object_path("bucket", "app.tar.gz").exists());
}

#[tokio::test]
async fn test_staging_file_removed_when_backend_rejects() {
    let (storage, engine) = staging_engine().await;
    let source = MemoryArtifactFile::new("/agent/ws/app.jar", b"jar");
    // Keys starting with '/' are rejected by the local backend
    let destination = Destination::unmanaged("bucket/", "app.jar").unwrap();
    assert_eq!(destination.object_key(), "/app.jar");

    let err = engine
        .upload(&destination, &source, &UploadOptions::new("us-east-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Storage(_)));
    assert_eq!(storage.staged_count(), 0);
}

#[tokio::test]
async fn test_local_source_never_staged() {
    let (storage, engine) = staging_engine().await;
    let source_path = storage.write_source("lib.so", b"elf");
    let source = LocalArtifactFile::new(&source_path);
    let destination = Destination::unmanaged("bucket", "lib.so").unwrap();

    engine
        .upload(&destination, &source, &UploadOptions::new("us-east-1"))
        .await
        .unwrap();

    assert_eq!(storage.staged_count(), 0);
    assert!(storage.object_path("bucket", "lib.so").is_file());
}
