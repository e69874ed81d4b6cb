use serde::{Deserialize, Serialize};

/// Identity of the build that owns a set of artifacts.
///
/// Only consulted when a management mode injects the `jobs/<project>/<build>/` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobIdentity {
    pub project: String,
    pub build_id: u64,
}

impl JobIdentity {
    pub fn new(project: impl Into<String>, build_id: u64) -> Self {
        Self {
            project: project.into(),
            build_id,
        }
    }

    /// Key prefix isolating this build's artifacts.
    pub fn managed_prefix(&self) -> String {
        format!("jobs/{}/{}/", self.project, self.build_id)
    }
}
