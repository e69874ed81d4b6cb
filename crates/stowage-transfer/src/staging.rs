//! Local staging of remote artifacts
//!
//! Backends that only upload from a path get remote files copied into a
//! uniquely named temporary file first. The file is removed when the
//! `StagedFile` is dropped, whichever way the upload ends.

use std::path::Path;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use crate::error::{TransferError, TransferResult};
use crate::file::ArtifactFile;

const STAGING_PREFIX: &str = "stowage";
const STAGING_SUFFIX: &str = ".bin";

/// A temporary local copy of a remote artifact
#[derive(Debug)]
pub struct StagedFile {
    path: Option<TempPath>,
}

impl StagedFile {
    /// Copy `source` into a new temporary file in `dir` (or the OS temp dir).
    pub async fn stage(source: &dyn ArtifactFile, dir: Option<&Path>) -> TransferResult<Self> {
        let staging_err = |e: std::io::Error| TransferError::Staging {
            path: source.full_path().to_string(),
            source: e,
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX).suffix(STAGING_SUFFIX);
        let named = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(staging_err)?;

        let (file, path) = named.into_parts();
        // From here on, dropping `staged` removes the file
        let staged = StagedFile { path: Some(path) };
        let mut file = tokio::fs::File::from_std(file);

        let copied = source.copy_to(&mut file).await.map_err(staging_err)?;
        file.flush().await.map_err(staging_err)?;
        file.sync_all().await.map_err(staging_err)?;

        tracing::debug!(
            source = %source.full_path(),
            staged = %staged.path().display(),
            size_bytes = copied,
            "Staged remote artifact"
        );

        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        match &self.path {
            Some(path) => path,
            None => Path::new(""),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let shown = path.display().to_string();
            if let Err(e) = path.close() {
                tracing::warn!(
                    error = %e,
                    path = %shown,
                    "Failed to remove staging file"
                );
            }
        }
    }
}
