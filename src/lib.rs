//! Bulk e-commerce platform fingerprinting.
//!
//! URLs are fetched by a bounded pool of workers, each page is classified by
//! substring markers, and results come back in input order.

pub mod api;
pub mod fetcher;
pub mod platform_classifier;
pub mod url_parser;
pub mod utils;

pub use api::batch::BatchDetector;
pub use api::config::{AdmissionPolicy, DetectorConfig};
pub use api::models::DetectionResult;
pub use platform_classifier::{classify, Classification, Platform};
