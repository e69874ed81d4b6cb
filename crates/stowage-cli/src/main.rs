//! Stowage CLI: publish build artifacts to object storage and fetch them back.
//!
//! Storage is selected with STORAGE_BACKEND (s3 or local); see `Config::from_env`.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stowage_cli::{
    download_all, init_tracing, job_identity, load_entries, plan_downloads, print_json,
    upload_all, UploadPlan,
};
use stowage_core::{ArtifactEntry, Config, ManagementMode, MetadataPair};
use stowage_storage::create_storage;
use stowage_transfer::TransferEngine;

#[derive(Parser)]
#[command(name = "stowage", about = "Build artifact storage CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload artifacts from an entries file or a single inline entry
    Upload {
        /// JSON file holding an array of entries
        #[arg(long, conflicts_with_all = ["bucket", "source"])]
        entries: Option<PathBuf>,
        /// Bucket, optionally followed by /virtual/path
        #[arg(long, requires = "source")]
        bucket: Option<String>,
        /// File or directory to upload
        #[arg(long, requires = "bucket")]
        source: Option<String>,
        /// STANDARD or REDUCED_REDUNDANCY
        #[arg(long, default_value = "")]
        storage_class: String,
        /// Region, canonical or legacy form (default: AWS_REGION)
        #[arg(long)]
        region: Option<String>,
        /// UNMANAGED_FLATTENED, UNMANAGED_STRUCTURED, MANAGED_FLATTENED or MANAGED_STRUCTURED
        #[arg(long, default_value = "")]
        management: String,
        /// Request AES256 server-side encryption
        #[arg(long)]
        sse: bool,
        /// Relay bytes through this process instead of uploading from the path
        #[arg(long)]
        relay: bool,
        /// Object metadata as KEY=VALUE, repeatable
        #[arg(long = "metadata", value_name = "KEY=VALUE")]
        metadata: Vec<MetadataPair>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        build_id: Option<u64>,
        /// The build failed; skip entries marked no_upload_on_failure
        #[arg(long)]
        build_failed: bool,
        /// Record the artifacts as side artifacts rather than build products
        #[arg(long)]
        side_artifacts: bool,
        /// Record failed transfers and keep going
        #[arg(long)]
        continue_on_failure: bool,
    },
    /// Download named artifacts into a directory
    Download {
        /// Bucket, optionally followed by /virtual/path
        #[arg(long)]
        bucket: String,
        /// Directory to write the files into
        #[arg(long, default_value = ".")]
        target: PathBuf,
        #[arg(long, default_value = "")]
        management: String,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        build_id: Option<u64>,
        /// Record failed transfers and keep going
        #[arg(long)]
        continue_on_failure: bool,
        /// File names as they were uploaded
        #[arg(required = true)]
        files: Vec<String>,
    },
}

async fn engine_for(config: &Config) -> anyhow::Result<TransferEngine> {
    let storage = create_storage(config)
        .await
        .context("Failed to create storage backend")?;
    let engine = TransferEngine::new(storage);
    Ok(match &config.staging_dir {
        Some(dir) => engine.with_staging_dir(dir),
        None => engine,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            entries,
            bucket,
            source,
            storage_class,
            region,
            management,
            sse,
            relay,
            metadata,
            project,
            build_id,
            build_failed,
            side_artifacts,
            continue_on_failure,
        } => {
            let entries = match (entries, bucket, source) {
                (Some(path), _, _) => load_entries(&path)?,
                (None, Some(bucket), Some(source)) => vec![ArtifactEntry {
                    storage_class,
                    selected_region: region,
                    upload_from_agent: !relay,
                    management: management.parse()?,
                    use_server_side_encryption: sse,
                    metadata,
                    ..ArtifactEntry::new(bucket, source)
                }],
                _ => bail!("Pass --entries or both --bucket and --source"),
            };

            let managed = entries.iter().any(|e| e.management.is_managed());
            let job = job_identity(&config, project, build_id, managed)?;
            let http = reqwest::Client::new();
            let planned = UploadPlan {
                job: &job,
                default_region: &config.aws_region,
                build_failed,
                produced: !side_artifacts,
                http: &http,
            }
            .plan(&entries)?;

            let engine = engine_for(&config).await?;
            let concurrency = config.concurrency_for(planned.len());
            let manifest = upload_all(&engine, &planned, concurrency, continue_on_failure).await?;
            print_json(&manifest)?;
        }
        Commands::Download {
            bucket,
            target,
            management,
            project,
            build_id,
            continue_on_failure,
            files,
        } => {
            let mode: ManagementMode = management.parse()?;
            let job = job_identity(&config, project, build_id, mode.is_managed())?;
            let planned = plan_downloads(&bucket, &files, &target, mode, &job)?;

            let engine = engine_for(&config).await?;
            let concurrency = config.concurrency_for(planned.len());
            let manifest =
                download_all(&engine, &planned, concurrency, continue_on_failure).await?;
            print_json(&manifest)?;
        }
    }

    Ok(())
}
