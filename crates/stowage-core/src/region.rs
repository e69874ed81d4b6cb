//! Region resolution
//!
//! Stored configurations name regions in one of two historical formats: the
//! canonical region name (`us-east-1`) and the older enumeration constant
//! (`US_EAST_1`, `GovCloud`). Both must keep resolving to the same region.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Serialize, Serializer};

use crate::error::{StowageError, StowageResult};

/// A known object-storage region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    name: &'static str,
    legacy_name: &'static str,
}

const fn region(name: &'static str, legacy_name: &'static str) -> Region {
    Region { name, legacy_name }
}

impl Region {
    pub const US_EAST_1: Region = region("us-east-1", "US_EAST_1");

    /// Every region the resolver knows about, in catalogue order.
    pub const ALL: &'static [Region] = &[
        region("us-gov-west-1", "GovCloud"),
        region("us-gov-east-1", "US_GOV_EAST_1"),
        Region::US_EAST_1,
        region("us-east-2", "US_EAST_2"),
        region("us-west-1", "US_WEST_1"),
        region("us-west-2", "US_WEST_2"),
        region("ca-central-1", "CA_CENTRAL_1"),
        region("eu-west-1", "EU_WEST_1"),
        region("eu-west-2", "EU_WEST_2"),
        region("eu-west-3", "EU_WEST_3"),
        region("eu-central-1", "EU_CENTRAL_1"),
        region("eu-north-1", "EU_NORTH_1"),
        region("eu-south-1", "EU_SOUTH_1"),
        region("ap-east-1", "AP_EAST_1"),
        region("ap-south-1", "AP_SOUTH_1"),
        region("ap-southeast-1", "AP_SOUTHEAST_1"),
        region("ap-southeast-2", "AP_SOUTHEAST_2"),
        region("ap-northeast-1", "AP_NORTHEAST_1"),
        region("ap-northeast-2", "AP_NORTHEAST_2"),
        region("ap-northeast-3", "AP_NORTHEAST_3"),
        region("sa-east-1", "SA_EAST_1"),
        region("cn-north-1", "CN_NORTH_1"),
        region("cn-northwest-1", "CN_NORTHWEST_1"),
        region("me-south-1", "ME_SOUTH_1"),
        region("af-south-1", "AF_SOUTH_1"),
    ];

    /// Resolve a configured region string.
    ///
    /// The canonical name is tried first, then the legacy constant name.
    /// Matching is exact in both cases.
    pub fn resolve(selected: &str) -> StowageResult<Region> {
        Self::ALL
            .iter()
            .find(|r| r.name == selected)
            .or_else(|| Self::ALL.iter().find(|r| r.legacy_name == selected))
            .copied()
            .ok_or_else(|| StowageError::InvalidRegion(selected.to_string()))
    }

    /// Canonical region name handed to the storage client
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn legacy_name(&self) -> &'static str {
        self.legacy_name
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::US_EAST_1
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name)
    }
}

impl Serialize for Region {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}
