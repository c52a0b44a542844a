use crate::error::{FluxError, Result};
use crate::models::{BatchFailure, BatchImage, BatchSummary, GenerationRequest};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use super::image_client::ImageClient;

/// Hard cap on in-flight generation calls per batch, independent of batch
/// size and core count. The bound targets the remote service's rate
/// limit, not local throughput.
pub const MAX_CONCURRENT_JOBS: usize = 4;

/// Runs N seeded variants of one request template under a bounded worker
/// pool and aggregates the outcomes.
///
/// Jobs are never cancelled on a sibling's failure; the batch always
/// waits for all N outcomes. Partial failure is returned as data; only a
/// batch with zero successes fails as a whole.
#[derive(Clone)]
pub struct BatchClient {
    image_client: ImageClient,
}

impl BatchClient {
    pub fn new(image_client: ImageClient) -> Self {
        Self { image_client }
    }

    /// Generate `count` variants of `template`, one per derived seed.
    ///
    /// With `template.seed == 0` each variant gets an independent random
    /// seed; otherwise the variants use `seed, seed+1, …, seed+count-1`
    /// so a supplied seed stays reproducible.
    pub async fn run(&self, template: &GenerationRequest, count: u32) -> Result<BatchSummary> {
        if count == 0 {
            return Err(FluxError::InvalidParameter(
                "batch count must be at least 1".into(),
            ));
        }
        // Validate once up front so a bad template costs zero calls.
        template.validate()?;

        let seeds = derive_seeds(template.seed, count);
        log::info!(
            "Running batch of {} jobs with pool of {}",
            count,
            pool_size(count)
        );

        let semaphore = Arc::new(Semaphore::new(pool_size(count)));
        let (tx, mut rx) = mpsc::channel::<(u64, Result<crate::models::GeneratedImage>)>(
            count as usize,
        );

        for seed in seeds {
            let client = self.image_client.clone();
            let request = template.clone().with_seed(seed);
            let semaphore = semaphore.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                let outcome = client.generate(&request).await;
                let _ = tx.send((seed, outcome)).await;
            });
        }
        drop(tx);

        // Single aggregator: outcomes arrive in completion order, each
        // tagged with its seed.
        let mut summary = BatchSummary::default();
        while let Some((seed, outcome)) = rx.recv().await {
            match outcome {
                Ok(image) => {
                    log::info!("Batch job with seed {} succeeded: {}", seed, image.url);
                    summary.record_success(BatchImage {
                        seed,
                        url: image.url,
                        bytes: image.bytes,
                    });
                }
                Err(e) => {
                    log::warn!("Batch job with seed {} failed: {}", seed, e);
                    summary.record_failure(BatchFailure {
                        seed,
                        message: e.to_string(),
                    });
                }
            }
        }

        if summary.succeeded == 0 {
            return Err(FluxError::BatchFailed(summary.failure_report()));
        }

        log::info!("{}", summary.status_line());
        Ok(summary)
    }
}

fn pool_size(count: u32) -> usize {
    (count as usize).min(MAX_CONCURRENT_JOBS).max(1)
}

fn derive_seeds(base_seed: u64, count: u32) -> Vec<u64> {
    if base_seed == 0 {
        let mut rng = rand::rng();
        let mut seeds: Vec<u64> = Vec::with_capacity(count as usize);
        while seeds.len() < count as usize {
            // Non-zero so a derived request never re-triggers the sentinel.
            let seed = rng.random_range(1..=u32::MAX as u64);
            if !seeds.contains(&seed) {
                seeds.push(seed);
            }
        }
        seeds
    } else {
        (0..count as u64)
            .map(|offset| base_seed.wrapping_add(offset))
            .collect()
    }
}
