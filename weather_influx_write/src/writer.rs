//! Buffered delivery of points to a [`WriteApi`]

use std::mem;

use tracing::{debug, warn};
use weather_influx_client::{DataPoint, WriteApi};

/// Number of buffered points that triggers a drain
pub const DEFAULT_BATCH_SIZE: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to write batch of {points} point(s): {source}")]
    Transport {
        points: usize,
        #[source]
        source: weather_influx_client::Error,
    },

    #[error("failed to close the write client: {0}")]
    Close(#[source] weather_influx_client::Error),
}

pub type Result<T, E = WriteError> = std::result::Result<T, E>;

/// Accumulates points and hands them to the store in batches.
///
/// Points leave the buffer in the order they were enqueued. A batch is
/// drained as soon as the buffer holds `batch_size` points; whatever is left
/// goes out on [`flush`](Self::flush). Failed batches are not retried.
///
/// [`close`](Self::close) consumes the writer, so a closed writer can't be
/// used again.
#[derive(Debug)]
pub struct BatchedWriter<W> {
    api: W,
    batch_size: usize,
    buffer: Vec<DataPoint>,
    points_written: usize,
    batches_written: usize,
}

impl<W: WriteApi> BatchedWriter<W> {
    /// Create a writer draining every `batch_size` points. A `batch_size`
    /// of zero is treated as one.
    pub fn new(api: W, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            api,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            points_written: 0,
            batches_written: 0,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Points waiting for the next drain
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Points the store client has accepted so far
    pub fn points_written(&self) -> usize {
        self.points_written
    }

    /// Batches the store client has accepted so far
    pub fn batches_written(&self) -> usize {
        self.batches_written
    }

    /// Append a point, draining the buffer if it reached the batch size.
    pub async fn enqueue(&mut self, point: DataPoint) -> Result<()> {
        self.buffer.push(point);
        if self.buffer.len() >= self.batch_size {
            self.drain().await?;
        }
        Ok(())
    }

    /// Send everything still buffered. A no-op when the buffer is empty.
    pub async fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.drain().await
    }

    /// Release the store connection. Call after the final [`flush`](Self::flush).
    pub async fn close(self) -> Result<()> {
        if !self.buffer.is_empty() {
            warn!(
                points = self.buffer.len(),
                "closing writer with unflushed points"
            );
        }
        self.api.close().await.map_err(WriteError::Close)
    }

    async fn drain(&mut self) -> Result<()> {
        let batch = mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
        let points = batch.len();

        debug!(points, "draining batch");
        match self.api.write(&batch).await {
            Ok(()) => {
                self.points_written += points;
                self.batches_written += 1;
                Ok(())
            }
            Err(source) => {
                warn!(points, error = %source, "batch write failed");
                Err(WriteError::Transport { points, source })
            }
        }
    }
}
