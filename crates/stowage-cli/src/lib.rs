//! Stowage command-line support
//!
//! Planning turns configured entries into destinations, and the batch
//! runner executes them concurrently and aggregates a manifest.

pub mod artifacts;
pub mod batch;

use anyhow::{bail, Context};
use serde::Serialize;
use stowage_core::{ArtifactEntry, Config, JobIdentity};

pub use artifacts::{collect_artifacts, plan_downloads, PlannedDownload, PlannedUpload, UploadPlan};
pub use batch::{download_all, run_batch, upload_all, Manifest};

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize manifest")?;
    println!("{}", out);
    Ok(())
}

/// Read a JSON array of entries
pub fn load_entries(path: &std::path::Path) -> anyhow::Result<Vec<ArtifactEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read entries file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid entries file {}", path.display()))
}

/// Job identity from flags, falling back to `STOWAGE_PROJECT` / `STOWAGE_BUILD_ID`.
///
/// Only managed modes need one; `required` makes a missing identity an error
/// instead of an empty default.
pub fn job_identity(
    config: &Config,
    project: Option<String>,
    build_id: Option<u64>,
    required: bool,
) -> anyhow::Result<JobIdentity> {
    let project = project.or_else(|| config.project.clone());
    let build_id = build_id.or(config.build_id);

    match (project, build_id) {
        (Some(project), Some(build_id)) if !project.is_empty() => {
            Ok(JobIdentity::new(project, build_id))
        }
        _ if required => bail!(
            "Managed artifacts need a job identity (--project/--build-id or STOWAGE_PROJECT/STOWAGE_BUILD_ID)"
        ),
        _ => Ok(JobIdentity::default()),
    }
}
