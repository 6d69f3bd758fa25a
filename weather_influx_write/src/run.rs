//! Drives observations from a [`RecordSource`] through the mapper into a
//! [`BatchedWriter`]

use std::path::PathBuf;

use tracing::{info, warn};
use weather_influx_client::WriteApi;

use crate::{
    mapper::{PointConfig, map_observation},
    source::{RecordSource, SourceError},
    writer::{BatchedWriter, WriteError},
};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// What a completed run delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_processed: usize,
    pub points_written: usize,
    pub batches_written: usize,
}

/// Load, map and enqueue every file in order, then flush and close the writer.
///
/// Processing stops at the first error, but the writer is flushed and closed
/// on every path, so points enqueued before a failure still reach the store.
/// When more than one step fails the first error is returned and the later
/// ones are logged.
pub async fn run<S, W>(
    config: &PointConfig,
    source: &S,
    files: &[PathBuf],
    city: &str,
    mut writer: BatchedWriter<W>,
) -> Result<RunSummary, RunError>
where
    S: RecordSource,
    W: WriteApi,
{
    let mut files_processed = 0;
    let mut result = process(config, source, files, city, &mut writer, &mut files_processed).await;

    if let Err(e) = writer.flush().await {
        match result {
            Ok(()) => result = Err(e.into()),
            Err(_) => warn!(error = %e, "final flush failed after an earlier error"),
        }
    }

    let summary = RunSummary {
        files_processed,
        points_written: writer.points_written(),
        batches_written: writer.batches_written(),
    };

    if let Err(e) = writer.close().await {
        match result {
            Ok(()) => result = Err(e.into()),
            Err(_) => warn!(error = %e, "closing the writer failed after an earlier error"),
        }
    }

    result.map(|()| summary)
}

async fn process<S, W>(
    config: &PointConfig,
    source: &S,
    files: &[PathBuf],
    city: &str,
    writer: &mut BatchedWriter<W>,
    files_processed: &mut usize,
) -> Result<(), RunError>
where
    S: RecordSource,
    W: WriteApi,
{
    for path in files {
        info!(file = %path.display(), "processing observation");
        let observation = source.load(path).await?;
        let point = map_observation(config, &observation, city);
        writer.enqueue(point).await?;
        *files_processed += 1;
    }
    Ok(())
}
