use tracing::{debug, instrument, warn};

use crate::api::models::{DetectionResult, NO_STATUS};
use crate::fetcher::{FetchOutcome, PageFetcher};
use crate::platform_classifier::classify;
use crate::url_parser::normalize_url;

/// Runs the per-URL pipeline: normalise, fetch, classify.
///
/// Every outcome, including blank input and network failures, is turned into
/// a [`DetectionResult`] carrying the URL exactly as it was supplied.
#[instrument(skip(fetcher), fields(url = %url))]
pub async fn process_url(url: &str, fetcher: &dyn PageFetcher) -> DetectionResult {
    let normalized = normalize_url(url);
    if normalized.is_empty() {
        warn!("Skipping empty URL input");
        return DetectionResult::error(url, NO_STATUS, "Empty URL");
    }
    if normalized != url {
        debug!("Normalized URL: '{}' -> '{}'", url, normalized);
    }

    debug!("Fetching HTML for {}", normalized);
    let (status_code, body) = match fetcher.fetch(&normalized).await {
        FetchOutcome::Success { status_code, body } => (status_code, body),
        FetchOutcome::HttpFailure { status_code } => {
            warn!("Fetch failed for '{}': HTTP {}", normalized, status_code);
            return DetectionResult::error(url, i32::from(status_code), format!("HTTP {}", status_code));
        }
        FetchOutcome::TransportFailure { reason } => {
            warn!("Fetch failed for '{}': {}", normalized, reason);
            return DetectionResult::error(url, NO_STATUS, reason);
        }
    };
    debug!("Fetched {} chars from '{}' (HTTP {})", body.len(), normalized, status_code);

    let classification = classify(&body);
    if classification.is_empty() {
        debug!("No platform detected for '{}'", url);
    } else {
        debug!("Detected {:?} for '{}'", classification.platforms(), url);
    }

    DetectionResult::ok(url, status_code, classification)
}
