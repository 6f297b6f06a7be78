use tracing::trace;

use super::{Classification, Platform, patterns::*};

/// Classifies an HTML document by case-insensitive substring matching.
///
/// Each rule fires at most once per document and contributes exactly one
/// evidence line. No match at all is a valid outcome and yields an empty
/// classification.
pub fn classify(html: &str) -> Classification {
    let lower = html.to_lowercase();
    let mut classification = Classification::default();

    for rule in MARKER_RULES.iter() {
        if contains_any(&lower, rule.markers) {
            classification.hit(rule.platform, rule.evidence);
        }
    }

    if let Some(score) = magento_score(&lower) {
        classification.hit(
            Platform::Magento,
            format!("Magento detected (strict markers: score={})", score),
        );
    }

    classification
}

/// Returns the Magento score when the document passes the two-stage gate:
/// at least one exclusive marker and a score of at least `MAGENTO_MIN_SCORE`.
fn magento_score(lower: &str) -> Option<usize> {
    let exclusive = contains_any(lower, MAGENTO_EXCLUSIVE_MARKERS);

    let score = MAGENTO_SCORED_MARKERS
        .iter()
        .filter(|group| contains_any(lower, group))
        .count();

    if contains_any(lower, MAGENTO_WEAK_MARKERS) {
        trace!("Weak Magento hint present, not scored");
    }

    if exclusive && score >= MAGENTO_MIN_SCORE {
        Some(score)
    } else {
        trace!("Magento gate not passed: exclusive={}, score={}", exclusive, score);
        None
    }
}

fn contains_any(lower: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| lower.contains(marker))
}
