use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::oneshot;

use crate::platform_classifier::{Classification, Platform};

/// Status code reported when no HTTP status was obtained
pub const NO_STATUS: i32 = -1;

/// Request body for the batch endpoints
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BatchDetectRequest {
    /// URLs to classify, in the order results should be returned
    #[serde(default)]
    pub urls: Option<Vec<String>>,
}

impl BatchDetectRequest {
    pub fn into_urls(self) -> Vec<String> {
        self.urls.unwrap_or_default()
    }
}

/// Detection outcome for one input URL.
///
/// Constructed only through [`DetectionResult::ok`] and
/// [`DetectionResult::error`], which keep the invariants: a failed result
/// has no platforms and no evidence, and evidence keys are a subset of the
/// platforms. Fields serialize in a fixed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    url: String,
    ok: bool,
    status_code: i32,
    error: Option<String>,
    platforms: BTreeSet<Platform>,
    evidence: BTreeMap<Platform, Vec<String>>,
}

impl DetectionResult {
    /// A page that was fetched and classified. `url` is the caller's
    /// original input, not the normalised form.
    pub fn ok(url: impl Into<String>, status_code: u16, classification: Classification) -> Self {
        let (platforms, evidence) = classification.into_parts();
        Self {
            url: url.into(),
            ok: true,
            status_code: i32::from(status_code),
            error: None,
            platforms,
            evidence,
        }
    }

    pub fn error(url: impl Into<String>, status_code: i32, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ok: false,
            status_code,
            error: Some(error.into()),
            platforms: BTreeSet::new(),
            evidence: BTreeMap::new(),
        }
    }

    /// A failure caught at the task boundary rather than inside the pipeline
    pub fn unexpected(url: impl Into<String>, category: &str) -> Self {
        Self::error(url, NO_STATUS, format!("Unexpected error: {}", category))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn status_code(&self) -> i32 {
        self.status_code
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn platforms(&self) -> &BTreeSet<Platform> {
        &self.platforms
    }

    pub fn evidence(&self) -> &BTreeMap<Platform, Vec<String>> {
        &self.evidence
    }
}

/// Internal job structure for the worker queue
#[derive(Debug)]
pub struct DetectionJob {
    /// The URL exactly as the caller supplied it
    pub url: String,

    /// Sender for the response channel
    pub response_tx: oneshot::Sender<DetectionResult>,
}

/// Health status response for the /health endpoint
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Status indicator: healthy or degraded
    pub status: String,

    /// Number of detection workers
    pub workers: usize,

    /// Capacity of the job queue
    pub queue_capacity: usize,

    /// Jobs currently waiting for a worker
    pub queued_jobs: usize,

    /// Server uptime in seconds
    pub uptime_secs: u64,
}

/// Error response for API endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Status indicator: error
    pub status: String,

    /// Error message details
    pub message: String,
}
