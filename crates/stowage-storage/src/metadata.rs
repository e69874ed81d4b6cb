//! Object metadata sent alongside an upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stowage_core::StorageClass;

/// Server-side encryption algorithms a request can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerSideEncryption {
    /// Service-managed keys
    #[serde(rename = "AES256")]
    Aes256,
}

impl ServerSideEncryption {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerSideEncryption::Aes256 => "AES256",
        }
    }
}

/// Headers and user metadata for a stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub storage_class: Option<StorageClass>,
    pub server_side_encryption: Option<ServerSideEncryption>,
    pub cache_control: Option<String>,
    pub content_encoding: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    /// User-defined entries in insertion order; keys are unique ignoring case
    user_metadata: Vec<(String, String)>,
}

impl ObjectMetadata {
    /// Add a user-defined entry.
    ///
    /// A key equal to an existing one ignoring case replaces that entry's value
    /// and keeps the key as first written.
    pub fn add_user_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .user_metadata
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
        {
            Some(entry) => entry.1 = value,
            None => self.user_metadata.push((key, value)),
        }
    }

    /// Case-insensitive lookup of a user-defined entry
    pub fn user_metadata_value(&self, key: &str) -> Option<&str> {
        self.user_metadata
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    pub fn user_metadata(&self) -> &[(String, String)] {
        &self.user_metadata
    }
}
