use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StowageError;

/// A user-supplied metadata entry attached to uploaded objects.
///
/// `Cache-Control`, `Content-Encoding` and `Expires` (matched case-insensitively)
/// become first-class object headers; every other key is stored as user metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPair {
    pub key: String,
    pub value: String,
}

impl MetadataPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive key comparison
    pub fn is_key(&self, name: &str) -> bool {
        self.key.eq_ignore_ascii_case(name)
    }
}

impl FromStr for MetadataPair {
    type Err = StowageError;

    /// Parses `KEY=VALUE`; the value may itself contain `=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok(MetadataPair::new(key.trim(), value))
            }
            _ => Err(StowageError::invalid_value("metadata pair", s)),
        }
    }
}
