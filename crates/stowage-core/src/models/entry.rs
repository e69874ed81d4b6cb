use serde::{Deserialize, Serialize};

use crate::error::StowageResult;
use crate::models::{ManagementMode, MetadataPair, StorageClass};

/// One configured publish entry, as stored in a pipeline's entries file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// Destination bucket, optionally followed by `/virtual/path`
    pub bucket: String,
    /// File, directory or `http(s)://` URL of the artifact(s) to upload
    pub source: String,
    /// `STANDARD`, `REDUCED_REDUNDANCY` or empty
    #[serde(default)]
    pub storage_class: String,
    /// Region in canonical (`us-east-1`) or legacy (`US_EAST_1`) form
    #[serde(default)]
    pub selected_region: Option<String>,
    /// Skip this entry when the build failed
    #[serde(default)]
    pub no_upload_on_failure: bool,
    /// Upload from where the file lives instead of relaying its bytes
    #[serde(default)]
    pub upload_from_agent: bool,
    #[serde(default)]
    pub management: ManagementMode,
    #[serde(default)]
    pub use_server_side_encryption: bool,
    #[serde(default)]
    pub metadata: Vec<MetadataPair>,
}

impl ArtifactEntry {
    pub fn new(bucket: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            source: source.into(),
            storage_class: String::new(),
            selected_region: None,
            no_upload_on_failure: false,
            upload_from_agent: false,
            management: ManagementMode::default(),
            use_server_side_encryption: false,
            metadata: Vec::new(),
        }
    }

    pub fn storage_class(&self) -> StowageResult<Option<StorageClass>> {
        StorageClass::parse_optional(&self.storage_class)
    }

    /// Region to use, falling back to `default_region` when the entry names none.
    pub fn region_or<'a>(&'a self, default_region: &'a str) -> &'a str {
        match self.selected_region.as_deref() {
            Some(region) if !region.trim().is_empty() => region,
            _ => default_region,
        }
    }
}
