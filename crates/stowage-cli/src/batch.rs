//! Concurrent execution of planned transfers

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use stowage_core::TransferRecord;
use stowage_transfer::{TransferEngine, TransferResult};

use crate::artifacts::{Planned, PlannedDownload, PlannedUpload};

/// Build-level summary printed once a batch finishes
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub records: Vec<TransferRecord>,
    pub failed: usize,
}

/// Run `transfer` over `items`, at most `concurrency` at a time.
///
/// With `continue_on_failure` a failed item is recorded and the batch goes
/// on. Otherwise the first failure stops new transfers from starting, lets
/// the in-flight ones finish, and is returned as the batch error.
pub async fn run_batch<'a, T, F, Fut>(
    items: &'a [T],
    concurrency: usize,
    continue_on_failure: bool,
    transfer: F,
) -> Result<Manifest>
where
    T: Planned,
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = TransferResult<TransferRecord>> + 'a,
{
    let stop = AtomicBool::new(false);
    let stop = &stop;
    let transfer = &transfer;

    let mut outcomes: Vec<(usize, TransferResult<TransferRecord>)> = stream::iter(
        items.iter().enumerate(),
    )
    .map(|(index, item)| async move {
        if stop.load(Ordering::SeqCst) {
            return None;
        }
        let result = transfer(item).await;
        if result.is_err() && !continue_on_failure {
            stop.store(true, Ordering::SeqCst);
        }
        Some((index, result))
    })
    .buffer_unordered(concurrency.max(1))
    .filter_map(|outcome| async move { outcome })
    .collect()
    .await;

    outcomes.sort_by_key(|(index, _)| *index);

    let mut records = Vec::with_capacity(outcomes.len());
    let mut failed = 0;
    for (index, result) in outcomes {
        let item = &items[index];
        match result {
            Ok(record) => records.push(record),
            Err(e) if continue_on_failure => {
                tracing::warn!(
                    error = %e,
                    destination = %item.destination(),
                    "Transfer failed, continuing"
                );
                failed += 1;
                records.push(item.failed_record());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Transfer to {} failed", item.destination()));
            }
        }
    }

    Ok(Manifest { records, failed })
}

pub async fn upload_all(
    engine: &TransferEngine,
    planned: &[PlannedUpload],
    concurrency: usize,
    continue_on_failure: bool,
) -> Result<Manifest> {
    run_batch(planned, concurrency, continue_on_failure, |p| {
        engine.upload(&p.destination, p.file.as_ref(), &p.options)
    })
    .await
}

pub async fn download_all(
    engine: &TransferEngine,
    planned: &[PlannedDownload],
    concurrency: usize,
    continue_on_failure: bool,
) -> Result<Manifest> {
    run_batch(planned, concurrency, continue_on_failure, |p| {
        engine.download(&p.destination, &p.target)
    })
    .await
}
