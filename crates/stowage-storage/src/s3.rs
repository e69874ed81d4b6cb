use crate::metadata::ObjectMetadata;
use crate::traits::{GetObjectOutput, ObjectStorage, PutObjectOutput, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::{ByteStream, DateTime};
use aws_sdk_s3::types::{ServerSideEncryption, StorageClass};
use aws_sdk_s3::Client;
use std::path::Path;
use stowage_core::Region;

/// S3 storage implementation
///
/// One client serves every bucket and region; each upload carries its region
/// as a per-request config override.
pub struct S3Storage {
    client: Client,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `default_region` - Region for requests that do not name one (downloads)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(default_region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let region_provider =
            RegionProviderChain::first_try(aws_config::Region::new(default_region.clone()));

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let client = if let Some(ref endpoint) = endpoint_url {
            // Path-style addressing is required by MinIO and most S3-compatible providers
            let mut s3_config_builder = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .endpoint_url(endpoint)
                .region(config.region().cloned())
                .force_path_style(true);
            if let Some(provider) = config.credentials_provider() {
                s3_config_builder = s3_config_builder.credentials_provider(provider);
            }
            Client::from_conf(s3_config_builder.build())
        } else {
            Client::new(&config)
        };

        tracing::debug!(
            region = %default_region,
            endpoint = ?endpoint_url,
            "S3 client initialised"
        );

        Ok(S3Storage {
            client,
            endpoint_url,
        })
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }
}

fn region_override(region: &Region) -> aws_sdk_s3::config::Builder {
    aws_sdk_s3::Config::builder().region(aws_sdk_s3::config::Region::new(region.name()))
}

/// S3 reports ETags wrapped in double quotes.
fn unquote(e_tag: Option<&str>) -> String {
    e_tag.unwrap_or_default().trim_matches('"').to_string()
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        metadata: &ObjectMetadata,
        region: &Region,
    ) -> StorageResult<PutObjectOutput> {
        let start = std::time::Instant::now();

        let body = ByteStream::from_path(source).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to open {}: {}", source.display(), e))
        })?;

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .set_content_type(metadata.content_type.clone())
            .set_cache_control(metadata.cache_control.clone())
            .set_content_encoding(metadata.content_encoding.clone());

        if let Some(length) = metadata.content_length {
            let length = i64::try_from(length).map_err(|_| {
                StorageError::UploadFailed(format!("Content length {} out of range", length))
            })?;
            request = request.content_length(length);
        }
        if let Some(class) = metadata.storage_class {
            request = request.storage_class(StorageClass::from(class.as_str()));
        }
        if let Some(sse) = metadata.server_side_encryption {
            request = request.server_side_encryption(ServerSideEncryption::from(sse.as_str()));
        }
        if let Some(expires) = metadata.expires {
            request = request.expires(DateTime::from_secs(expires.timestamp()));
        }
        // Last-Modified is assigned by the service on PUT; it is not sent.
        for (name, value) in metadata.user_metadata() {
            request = request.metadata(name, value);
        }

        let output = request
            .customize()
            .config_override(region_override(region))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    region = %region,
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    size_bytes = ?metadata.content_length,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let e_tag = unquote(output.e_tag());

        tracing::info!(
            bucket = %bucket,
            key = %key,
            region = %region,
            size_bytes = ?metadata.content_length,
            e_tag = %e_tag,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(PutObjectOutput { e_tag })
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        target: &Path,
    ) -> StorageResult<GetObjectOutput> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(service_err)
                    if matches!(service_err.err(), GetObjectError::NoSuchKey(_)) =>
                {
                    StorageError::NotFound(format!("{}/{}", bucket, key))
                }
                _ => {
                    tracing::error!(
                        error = %e,
                        bucket = %bucket,
                        key = %key,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "S3 download failed"
                    );
                    StorageError::DownloadFailed(e.to_string())
                }
            })?;

        let e_tag = unquote(response.e_tag());
        let mut reader = response.body.into_async_read();

        let mut file = tokio::fs::File::create(target).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to create {}: {}", target.display(), e))
        })?;

        let size_bytes = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to write {}: {}", target.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to sync {}: {}", target.display(), e))
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size_bytes,
            e_tag = %e_tag,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(GetObjectOutput { e_tag, size_bytes })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
