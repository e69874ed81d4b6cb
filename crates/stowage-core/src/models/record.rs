use serde::{Deserialize, Serialize};

use crate::models::Destination;

/// Outcome of one file transfer, kept to later verify which build produced
/// which stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    produced: bool,
    user_bucket_spec: String,
    file_name: String,
    checksum: String,
    success: bool,
}

impl TransferRecord {
    /// Record a completed transfer; `checksum` is the service's integrity tag.
    pub fn new(produced: bool, destination: &Destination, checksum: impl Into<String>) -> Self {
        Self {
            produced,
            user_bucket_spec: destination.user_bucket_spec().to_string(),
            file_name: destination.file_name().to_string(),
            checksum: checksum.into(),
            success: true,
        }
    }

    /// Record a transfer that did not complete, for callers that continue past failures.
    pub fn failed(produced: bool, destination: &Destination) -> Self {
        Self {
            produced,
            user_bucket_spec: destination.user_bucket_spec().to_string(),
            file_name: destination.file_name().to_string(),
            checksum: String::new(),
            success: false,
        }
    }

    /// Whether the file is a primary build product rather than a side artifact
    pub fn produced(&self) -> bool {
        self.produced
    }

    pub fn user_bucket_spec(&self) -> &str {
        &self.user_bucket_spec
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn success(&self) -> bool {
        self.success
    }
}
