use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::config::DetectorConfig;
use crate::api::models::DetectionResult;
use crate::api::report::render_csv;
use crate::api::workers::WorkerPool;
use crate::fetcher::{HttpFetcher, PageFetcher};

/// Batch front-end over the worker pool.
///
/// A batch call returns only once every URL has a result, and results come
/// back in input order no matter which finished first. Failures of single
/// URLs are part of the output, never an error of the batch.
#[derive(Clone)]
pub struct BatchDetector {
    pool: WorkerPool,
}

impl BatchDetector {
    /// Detector backed by a real HTTP fetcher built from `config`
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    pub fn with_fetcher(config: &DetectorConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        Ok(Self {
            pool: WorkerPool::start(config, fetcher)?,
        })
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub async fn detect_urls(&self, urls: &[String]) -> Vec<DetectionResult> {
        if urls.is_empty() {
            info!("No URLs provided for detection");
            return Vec::new();
        }

        info!(
            "Starting platform detection for {} URL(s) with {} workers",
            urls.len(),
            self.pool.workers()
        );

        // Fan out. A rejected submission is that URL's result, not a batch failure.
        let mut pending = Vec::with_capacity(urls.len());
        for url in urls {
            pending.push(self.pool.submit(url.clone()).await);
        }

        // Join in input order
        let results = join_all(urls.iter().zip(pending).map(|(url, submitted)| async move {
            match submitted {
                Ok(response_rx) => response_rx.await.unwrap_or_else(|_| {
                    warn!("Worker dropped the job for '{}'", url);
                    DetectionResult::unexpected(url.as_str(), "WorkerDropped")
                }),
                Err(e) => {
                    warn!("Could not queue '{}': {}", url, e);
                    DetectionResult::unexpected(url.as_str(), e.as_str())
                }
            }
        }))
        .await;

        let ok_count = results.iter().filter(|r| r.is_ok()).count();
        info!(
            "Finished platform detection: {} succeeded, {} failed",
            ok_count,
            results.len() - ok_count
        );

        results
    }

    /// Runs the batch and renders it as `website,platforms` CSV
    pub async fn detect_urls_csv(&self, urls: &[String]) -> Result<String> {
        let results = self.detect_urls(urls).await;
        render_csv(&results)
    }
}
