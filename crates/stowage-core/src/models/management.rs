use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StowageError;

/// How an artifact's object key is laid out.
///
/// *Managed* modes inject a build-scoped `jobs/<project>/<build>/` prefix.
/// *Structured* modes keep the file's directories relative to its search root,
/// *flattened* modes keep only the base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ManagementMode {
    #[default]
    UnmanagedFlattened,
    UnmanagedStructured,
    ManagedFlattened,
    ManagedStructured,
}

impl ManagementMode {
    pub const ALL: [ManagementMode; 4] = [
        ManagementMode::UnmanagedFlattened,
        ManagementMode::UnmanagedStructured,
        ManagementMode::ManagedFlattened,
        ManagementMode::ManagedStructured,
    ];

    pub fn is_managed(self) -> bool {
        match self {
            ManagementMode::ManagedFlattened | ManagementMode::ManagedStructured => true,
            ManagementMode::UnmanagedFlattened | ManagementMode::UnmanagedStructured => false,
        }
    }

    pub fn is_structured(self) -> bool {
        match self {
            ManagementMode::UnmanagedStructured | ManagementMode::ManagedStructured => true,
            ManagementMode::UnmanagedFlattened | ManagementMode::ManagedFlattened => false,
        }
    }

    /// Configuration name, as written by older pipeline configurations
    pub fn as_str(self) -> &'static str {
        match self {
            ManagementMode::UnmanagedFlattened => "UNMANAGED_FLATTENED",
            ManagementMode::UnmanagedStructured => "UNMANAGED_STRUCTURED",
            ManagementMode::ManagedFlattened => "MANAGED_FLATTENED",
            ManagementMode::ManagedStructured => "MANAGED_STRUCTURED",
        }
    }
}

impl FromStr for ManagementMode {
    type Err = StowageError;

    /// An empty value selects the default (`UNMANAGED_FLATTENED`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(ManagementMode::default());
        }
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| StowageError::invalid_value("management mode", s))
    }
}

impl Display for ManagementMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl Serialize for ManagementMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ManagementMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
