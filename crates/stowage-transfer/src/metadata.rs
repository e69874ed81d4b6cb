//! Upload metadata construction

use chrono::{DateTime, Utc};
use std::io;
use stowage_core::{MetadataPair, StorageClass};
use stowage_storage::{ObjectMetadata, ServerSideEncryption};

use crate::file::ArtifactFile;

/// Build the metadata for uploading `file`.
///
/// `Cache-Control`, `Content-Encoding` and `Expires` pairs set the matching
/// header; all other pairs become user metadata. An `Expires` value that is not
/// an RFC 1123 date is kept as user metadata instead of failing the upload.
pub async fn build_metadata(
    file: &dyn ArtifactFile,
    pairs: &[MetadataPair],
    storage_class: Option<StorageClass>,
    server_side_encryption: bool,
) -> io::Result<ObjectMetadata> {
    let mut metadata = ObjectMetadata::default();
    metadata.content_type = Some(
        mime_guess::from_path(file.base_name())
            .first_or_octet_stream()
            .to_string(),
    );
    metadata.content_length = Some(file.length().await?);
    metadata.last_modified = Some(file.last_modified().await?);
    metadata.storage_class = storage_class;
    metadata.server_side_encryption =
        server_side_encryption.then_some(ServerSideEncryption::Aes256);

    for pair in pairs {
        if pair.is_key("cache-control") {
            metadata.cache_control = Some(pair.value.clone());
        } else if pair.is_key("content-encoding") {
            metadata.content_encoding = Some(pair.value.clone());
        } else if pair.is_key("expires") {
            match parse_expires(&pair.value) {
                Some(expires) => metadata.expires = Some(expires),
                None => {
                    // TODO: decide whether an unparseable Expires should reject the entry
                    // once existing pipeline configurations have been audited.
                    tracing::warn!(
                        key = %pair.key,
                        value = %pair.value,
                        "Expires is not an RFC 1123 date, storing it as user metadata"
                    );
                    metadata.add_user_metadata(&pair.key, &pair.value);
                }
            }
        } else {
            metadata.add_user_metadata(&pair.key, &pair.value);
        }
    }

    Ok(metadata)
}

/// Zone names accepted in place of a numeric offset, beyond the RFC 2822 set.
const ZONE_ALIASES: &[(&str, &str)] = &[
    ("UTC", "+0000"),
    ("Z", "+0000"),
    ("WET", "+0000"),
    ("BST", "+0100"),
    ("CET", "+0100"),
    ("MET", "+0100"),
    ("CEST", "+0200"),
    ("EET", "+0200"),
    ("EEST", "+0300"),
    ("IST", "+0530"),
    ("JST", "+0900"),
    ("AEST", "+1000"),
];

/// Parse an HTTP date such as `Thu, 01 Dec 1994 16:00:00 GMT`.
///
/// Besides the RFC 2822 zones, common zone abbreviations like `UTC` or
/// `CET` are accepted.
pub fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    let (stamp, zone) = value.rsplit_once(' ')?;
    let (_, offset) = ZONE_ALIASES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(zone))?;
    DateTime::parse_from_rfc2822(&format!("{} {}", stamp, offset))
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
