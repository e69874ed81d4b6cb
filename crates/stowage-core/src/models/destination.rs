//! Destination naming
//!
//! A configured bucket string may carry a virtual path after its first `/`:
//! putting `file.txt` into `mybucket/v1` stores object `v1/file.txt` in bucket
//! `mybucket`. The virtual path and the managed build prefix compose additively:
//!
//! ```text
//! object key = [virtual path + "/"] + [jobs/<project>/<build>/] + file name
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::error::{StowageError, StowageResult};
use crate::models::{JobIdentity, ManagementMode};

/// Where one artifact lives in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    user_bucket_spec: String,
    bucket_name: String,
    file_name: String,
    object_key: String,
}

impl Destination {
    /// Resolve the destination of a matched artifact.
    ///
    /// `candidate` is the artifact's full path; `search_root_len` is the number of
    /// leading characters belonging to the declared search root, stripped in
    /// structured modes.
    pub fn resolve(
        user_bucket_spec: &str,
        candidate: &str,
        search_root_len: usize,
        mode: ManagementMode,
        job: &JobIdentity,
    ) -> StowageResult<Self> {
        if candidate.is_empty() {
            return Err(StowageError::InvalidArgument(
                "artifact path must not be empty".to_string(),
            ));
        }

        let file_name = if mode.is_structured() {
            candidate.chars().skip(search_root_len).collect()
        } else {
            base_name(candidate).to_string()
        };

        Self::build(user_bucket_spec, &file_name, &managed_prefix(mode, job))
    }

    /// Build a destination for an already-known file name, such as a single
    /// explicitly named object. Only the managed prefix of `mode` applies.
    pub fn for_file_name(
        user_bucket_spec: &str,
        file_name: &str,
        mode: ManagementMode,
        job: &JobIdentity,
    ) -> StowageResult<Self> {
        if file_name.is_empty() {
            return Err(StowageError::InvalidArgument(
                "file name must not be empty".to_string(),
            ));
        }
        Self::build(user_bucket_spec, file_name, &managed_prefix(mode, job))
    }

    /// Destination without any build-scoped prefix.
    pub fn unmanaged(user_bucket_spec: &str, file_name: &str) -> StowageResult<Self> {
        Self::for_file_name(
            user_bucket_spec,
            file_name,
            ManagementMode::UnmanagedFlattened,
            &JobIdentity::default(),
        )
    }

    fn build(user_bucket_spec: &str, file_name: &str, managed_prefix: &str) -> StowageResult<Self> {
        if user_bucket_spec.is_empty() {
            return Err(StowageError::InvalidArgument(
                "bucket specification must not be empty".to_string(),
            ));
        }

        let (bucket_name, object_key) = match user_bucket_spec.split_once('/') {
            Some((bucket, virtual_path)) => (
                bucket,
                format!("{}/{}{}", virtual_path, managed_prefix, file_name),
            ),
            None => (user_bucket_spec, format!("{}{}", managed_prefix, file_name)),
        };

        Ok(Self {
            user_bucket_spec: user_bucket_spec.to_string(),
            bucket_name: bucket_name.to_string(),
            file_name: file_name.to_string(),
            object_key,
        })
    }

    /// The raw bucket string from configuration
    pub fn user_bucket_spec(&self) -> &str {
        &self.user_bucket_spec
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Destination [bucketName={}, objectName={}]",
            self.bucket_name, self.object_key
        )
    }
}

fn managed_prefix(mode: ManagementMode, job: &JobIdentity) -> String {
    match mode {
        ManagementMode::ManagedFlattened | ManagementMode::ManagedStructured => {
            job.managed_prefix()
        }
        ManagementMode::UnmanagedFlattened | ManagementMode::UnmanagedStructured => String::new(),
    }
}

/// Last path component, accepting either separator since artifacts may come
/// from agents on another platform.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
