//! Per-image, per-width resize fan-out

use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::resizer::{ResizeError, Resizer};
use super::types::{ResizeFailure, ResizeJob, ResizeResult, ResizedImage};

/// Runs every width of a job through the resizer.
///
/// Resizes execute on the blocking pool, at most `width_concurrency` at a
/// time. Dropping the returned future abandons the job: widths still
/// waiting for a permit never start, and output of running ones is
/// discarded.
pub struct FanOut {
    resizer: Arc<dyn Resizer>,
    permits: Arc<Semaphore>,
}

impl FanOut {
    pub fn new(resizer: Arc<dyn Resizer>, width_concurrency: usize) -> Self {
        Self {
            resizer,
            permits: Arc::new(Semaphore::new(width_concurrency.max(1))),
        }
    }

    /// Resize `job` to each of its widths; results follow `job.widths` order.
    pub async fn resize_all(&self, job: &ResizeJob) -> Vec<ResizeResult> {
        debug!(
            "Fanning out {} to {} widths",
            job.source_name,
            job.widths.len()
        );

        let pending = job.widths.iter().map(|&width| self.resize_one(job, width));
        let outcomes = join_all(pending).await;

        job.widths
            .iter()
            .zip(outcomes)
            .map(|(&width, outcome)| match outcome {
                Ok(bytes) => Ok(ResizedImage {
                    output_name: job.output_name(width),
                    width,
                    bytes,
                }),
                Err(e) => {
                    warn!("Resize of {} to {}px failed: {}", job.source_name, width, e);
                    Err(ResizeFailure {
                        source_name: job.source_name.clone(),
                        width,
                        kind: e.kind(),
                        detail: e.to_string(),
                    })
                }
            })
            .collect()
    }

    async fn resize_one(&self, job: &ResizeJob, width: u32) -> Result<Vec<u8>, ResizeError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| ResizeError::Aborted(format!("worker pool closed: {}", e)))?;

        let resizer = Arc::clone(&self.resizer);
        let source = job.source_bytes.clone();

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            resizer.resize(&source, width)
        })
        .await
        .map_err(|e| ResizeError::Aborted(format!("resize task failed: {}", e)))?
    }
}
