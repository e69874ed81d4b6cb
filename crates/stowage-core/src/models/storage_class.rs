use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StowageError, StowageResult};

/// Storage tier requested for uploaded objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageClass {
    Standard,
    ReducedRedundancy,
}

impl StorageClass {
    pub const ALL: [StorageClass; 2] = [StorageClass::Standard, StorageClass::ReducedRedundancy];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::ReducedRedundancy => "REDUCED_REDUNDANCY",
        }
    }

    /// Configurations store "no storage class" as an empty string.
    pub fn parse_optional(value: &str) -> StowageResult<Option<StorageClass>> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            trimmed.parse().map(Some)
        }
    }
}

impl FromStr for StorageClass {
    type Err = StowageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StowageError::invalid_value("storage class", s))
    }
}

impl Display for StorageClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
