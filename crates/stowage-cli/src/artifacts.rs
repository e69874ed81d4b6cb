//! Turning configured entries into concrete transfers

use anyhow::{bail, Context, Result};
use std::path::Path;
use stowage_core::models::base_name;
use stowage_core::{ArtifactEntry, Destination, JobIdentity, ManagementMode, TransferRecord};
use stowage_transfer::{ArtifactFile, HttpArtifactFile, LocalArtifactFile, UploadOptions};
use walkdir::WalkDir;

/// A file matched by an entry, with the length of its search root prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedArtifact {
    pub path: String,
    pub search_root_len: usize,
}

/// Every file under `source`, or `source` itself when it is a file.
///
/// For a directory the search root is the directory itself, so structured
/// names keep the layout below it. For a single file it is the file's parent.
pub fn collect_artifacts(source: &str) -> Result<Vec<MatchedArtifact>> {
    let path = Path::new(source);
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Artifact source {} does not exist", source))?;

    if metadata.is_file() {
        let search_root_len = source.chars().count() - base_name(source).chars().count();
        return Ok(vec![MatchedArtifact {
            path: source.to_string(),
            search_root_len,
        }]);
    }

    let root = source.trim_end_matches('/');
    let search_root_len = root.chars().count() + 1;

    let mut matched = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", source))?;
        if entry.file_type().is_file() {
            matched.push(MatchedArtifact {
                path: entry.path().to_string_lossy().into_owned(),
                search_root_len,
            });
        }
    }
    Ok(matched)
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// One upload ready to hand to the engine
pub struct PlannedUpload {
    pub destination: Destination,
    pub file: Box<dyn ArtifactFile>,
    pub options: UploadOptions,
}

/// One download ready to hand to the engine
#[derive(Debug, Clone)]
pub struct PlannedDownload {
    pub destination: Destination,
    pub target: std::path::PathBuf,
}

/// Shared view of planned transfers used by the batch runner
pub trait Planned: Send + Sync {
    fn destination(&self) -> &Destination;

    fn produced(&self) -> bool;

    fn failed_record(&self) -> TransferRecord {
        TransferRecord::failed(self.produced(), self.destination())
    }
}

impl Planned for PlannedUpload {
    fn destination(&self) -> &Destination {
        &self.destination
    }

    fn produced(&self) -> bool {
        self.options.produced
    }
}

impl Planned for PlannedDownload {
    fn destination(&self) -> &Destination {
        &self.destination
    }

    fn produced(&self) -> bool {
        true
    }
}

/// Settings shared by every entry of one upload run
pub struct UploadPlan<'a> {
    pub job: &'a JobIdentity,
    pub default_region: &'a str,
    pub build_failed: bool,
    pub produced: bool,
    pub http: &'a reqwest::Client,
}

impl UploadPlan<'_> {
    /// Resolve every artifact of `entries`.
    ///
    /// Naming errors abort the whole plan before anything is transferred.
    pub fn plan(&self, entries: &[ArtifactEntry]) -> Result<Vec<PlannedUpload>> {
        let mut planned = Vec::new();

        for entry in entries {
            if self.build_failed && entry.no_upload_on_failure {
                tracing::info!(
                    bucket = %entry.bucket,
                    source = %entry.source,
                    "Skipping entry for failed build"
                );
                continue;
            }

            let options = UploadOptions {
                metadata: entry.metadata.clone(),
                storage_class: entry.storage_class()?,
                region: entry.region_or(self.default_region).to_string(),
                server_side_encryption: entry.use_server_side_encryption,
                produced: self.produced,
            };

            if is_url(&entry.source) {
                let file = HttpArtifactFile::new(self.http.clone(), &entry.source)
                    .with_context(|| format!("Invalid artifact URL {}", entry.source))?;
                let full_path = file.full_path().to_string();
                let search_root_len =
                    full_path.chars().count() - base_name(&full_path).chars().count();
                let destination = Destination::resolve(
                    &entry.bucket,
                    &full_path,
                    search_root_len,
                    entry.management,
                    self.job,
                )?;
                planned.push(PlannedUpload {
                    destination,
                    file: Box::new(file),
                    options,
                });
                continue;
            }

            let matched = collect_artifacts(&entry.source)?;
            if matched.is_empty() {
                tracing::warn!(source = %entry.source, "No artifacts matched");
            }

            for artifact in matched {
                let destination = Destination::resolve(
                    &entry.bucket,
                    &artifact.path,
                    artifact.search_root_len,
                    entry.management,
                    self.job,
                )?;
                let file = if entry.upload_from_agent {
                    LocalArtifactFile::new(&artifact.path)
                } else {
                    LocalArtifactFile::relayed(&artifact.path)
                };
                planned.push(PlannedUpload {
                    destination,
                    file: Box::new(file),
                    options: options.clone(),
                });
            }
        }

        Ok(planned)
    }
}

/// Destinations for downloading `file_names` into `target_dir`
pub fn plan_downloads(
    bucket: &str,
    file_names: &[String],
    target_dir: &Path,
    mode: ManagementMode,
    job: &JobIdentity,
) -> Result<Vec<PlannedDownload>> {
    file_names
        .iter()
        .map(|name| {
            if name.split('/').any(|segment| segment == "..") {
                bail!("File name {} escapes the target directory", name);
            }
            let destination = Destination::for_file_name(bucket, name, mode, job)?;
            Ok(PlannedDownload {
                target: target_dir.join(name.trim_start_matches('/')),
                destination,
            })
        })
        .collect()
}
