use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, trace, warn};

use crate::api::config::{AdmissionPolicy, DetectorConfig};
use crate::api::models::{DetectionJob, DetectionResult};
use crate::api::processor::process_url;
use crate::fetcher::PageFetcher;

/// Why a job could not be queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The queue was at capacity under [`AdmissionPolicy::FailFast`]
    QueueFull,
    /// Every worker has shut down
    QueueClosed,
}

impl SubmitError {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitError::QueueFull => "QueueFull",
            SubmitError::QueueClosed => "QueueClosed",
        }
    }
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::error::Error for SubmitError {}

/// Fixed set of workers draining a bounded FIFO job queue.
///
/// Cloning is cheap and every clone feeds the same queue. Workers exit once
/// the last clone is dropped and the queue has drained.
#[derive(Clone)]
pub struct WorkerPool {
    job_tx: mpsc::Sender<DetectionJob>,
    workers: usize,
    admission: AdmissionPolicy,
}

impl WorkerPool {
    /// Spawns `config.workers` worker tasks. Must be called from within a
    /// Tokio runtime. Fails without spawning anything if `config` does not
    /// validate.
    pub fn start(config: &DetectorConfig, fetcher: Arc<dyn PageFetcher>) -> anyhow::Result<Self> {
        config.validate()?;
        let workers = config.workers;
        let queue_capacity = config.queue_capacity;

        debug!("Creating job queue with capacity: {}", queue_capacity);
        let (job_tx, job_rx) = mpsc::channel::<DetectionJob>(queue_capacity);
        start_workers(job_rx, workers, fetcher);

        Ok(Self {
            job_tx,
            workers,
            admission: config.admission,
        })
    }

    /// Queues one URL and returns the channel its result will arrive on
    pub async fn submit(&self, url: String) -> Result<oneshot::Receiver<DetectionResult>, SubmitError> {
        let (response_tx, response_rx) = oneshot::channel();
        let job = DetectionJob { url, response_tx };

        match self.admission {
            AdmissionPolicy::Block => {
                self.job_tx.send(job).await.map_err(|_| SubmitError::QueueClosed)?;
            }
            AdmissionPolicy::FailFast => match self.job_tx.try_send(job) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(job)) => {
                    warn!("Queue full, rejecting job for URL: {}", job.url);
                    return Err(SubmitError::QueueFull);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    error!("Worker queue has been closed!");
                    return Err(SubmitError::QueueClosed);
                }
            },
        }

        Ok(response_rx)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn queue_capacity(&self) -> usize {
        self.job_tx.max_capacity()
    }

    /// Jobs accepted but not yet picked up by a worker
    pub fn queued_jobs(&self) -> usize {
        self.job_tx.max_capacity() - self.job_tx.capacity()
    }
}

/// Starts worker tasks to process jobs from the queue
///
/// Each worker pulls jobs from the shared queue and runs the detection
/// pipeline. A panic inside the pipeline is caught here and reported as that
/// job's result, so the worker keeps serving the queue.
fn start_workers(job_rx: mpsc::Receiver<DetectionJob>, workers: usize, fetcher: Arc<dyn PageFetcher>) {
    // Wrap the job receiver in a mutex so multiple workers can access it
    let job_rx = Arc::new(Mutex::new(job_rx));

    info!("Spawning {} detection workers", workers);
    for worker_id in 0..workers {
        let job_rx = job_rx.clone();
        let fetcher = fetcher.clone();

        tokio::spawn(async move {
            debug!("Worker {} started", worker_id);
            loop {
                trace!("Worker {} waiting for job", worker_id);
                let job_opt = { job_rx.lock().await.recv().await };

                match job_opt {
                    Some(job) => {
                        debug!("Worker {} processing job for URL: {}", worker_id, job.url);
                        let result = AssertUnwindSafe(process_url(&job.url, fetcher.as_ref()))
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|_| {
                                error!("Worker {} caught a panic while processing {}", worker_id, job.url);
                                DetectionResult::unexpected(job.url.as_str(), "TaskPanicked")
                            });

                        if job.response_tx.send(result).is_err() {
                            warn!("Worker {} failed to send response - receiver dropped", worker_id);
                        }
                    }
                    None => {
                        debug!("Worker {} shutting down - channel closed", worker_id);
                        break;
                    }
                }
            }
        });
    }
}
