use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default number of concurrent detection workers
pub const WORKER_COUNT: usize = 10;

/// Default capacity for the job queue
pub const QUEUE_SIZE: usize = 200;

const REQUEST_TIMEOUT_SECS: u64 = 12;
const CONNECT_TIMEOUT_SECS: u64 = 8;
const MAX_REDIRECTS: usize = 5;
const USER_AGENT: &str = "Mozilla/5.0 (PlatformDetectorBot/1.0)";

/// Prefix for environment overrides, e.g. `DETECTOR_WORKERS=20`
const ENV_PREFIX: &str = "DETECTOR";

/// What happens when a job is submitted while the queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// Wait until a worker frees a slot
    Block,
    /// Reject the job; it surfaces as an error result for that URL
    FailFast,
}

/// Configuration shared by the fetcher and the worker pool.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of workers processing URLs concurrently
    pub workers: usize,

    /// Maximum number of jobs waiting for a worker
    pub queue_capacity: usize,

    /// Behaviour when the queue is full
    pub admission: AdmissionPolicy,

    /// Timeout for a single page request, in seconds
    pub request_timeout_secs: u64,

    /// Timeout for establishing a connection, in seconds
    pub connect_timeout_secs: u64,

    /// Whether redirects are followed at all
    pub follow_redirects: bool,

    /// Maximum redirect hops before the fetch fails
    pub max_redirects: usize,

    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            workers: WORKER_COUNT,
            queue_capacity: QUEUE_SIZE,
            admission: AdmissionPolicy::Block,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            follow_redirects: true,
            max_redirects: MAX_REDIRECTS,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from an optional file, overridden by `DETECTOR_*`
    /// environment variables. Keys missing from both take their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("Loading configuration file {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let settings = builder.build().context("Failed to read configuration")?;
        let config: DetectorConfig = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;
        config.validate()?;

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Rejects values the worker pool or HTTP client cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.queue_capacity == 0 {
            bail!("queue_capacity must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.connect_timeout_secs == 0 {
            bail!("connect_timeout_secs must be greater than zero");
        }
        if self.user_agent.trim().is_empty() {
            bail!("user_agent cannot be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_admission(mut self, admission: AdmissionPolicy) -> Self {
        self.admission = admission;
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.workers, 10);
        assert_eq!(config.queue_capacity, 200);
        assert_eq!(config.admission, AdmissionPolicy::Block);
        assert_eq!(config.request_timeout(), Duration::from_secs(12));
        assert_eq!(config.connect_timeout(), Duration::from_secs(8));
        assert!(config.follow_redirects);
        assert!(config.user_agent.contains("PlatformDetectorBot"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = DetectorConfig::new()
            .with_workers(4)
            .with_queue_capacity(16)
            .with_admission(AdmissionPolicy::FailFast)
            .with_request_timeout_secs(3)
            .with_connect_timeout_secs(2)
            .with_follow_redirects(false)
            .with_max_redirects(1)
            .with_user_agent("Test/1.0");

        assert_eq!(config.workers, 4);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.admission, AdmissionPolicy::FailFast);
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.connect_timeout_secs, 2);
        assert!(!config.follow_redirects);
        assert_eq!(config.max_redirects, 1);
        assert_eq!(config.user_agent, "Test/1.0");
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        assert!(DetectorConfig::new().with_workers(0).validate().is_err());
        assert!(DetectorConfig::new().with_queue_capacity(0).validate().is_err());
        assert!(DetectorConfig::new().with_user_agent("  ").validate().is_err());
        let err = DetectorConfig::new().with_request_timeout_secs(0).validate();
        assert!(err.unwrap_err().to_string().contains("request_timeout_secs"));
        let err = DetectorConfig::new().with_connect_timeout_secs(0).validate();
        assert!(err.unwrap_err().to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn test_load_from_file_keeps_defaults_for_missing_keys() {
        let path = std::env::temp_dir().join(format!("platform_detector_{}.toml", std::process::id()));
        fs::write(&path, "workers = 3\nadmission = \"fail_fast\"\nrequest_timeout_secs = 5\n").unwrap();

        let config = DetectorConfig::load(Some(&path)).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.workers, 3);
        assert_eq!(config.admission, AdmissionPolicy::FailFast);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.queue_capacity, QUEUE_SIZE);
        assert_eq!(config.user_agent, USER_AGENT);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let path = std::env::temp_dir().join(format!("platform_detector_bad_{}.toml", std::process::id()));
        fs::write(&path, "workers = 0\n").unwrap();

        let result = DetectorConfig::load(Some(&path));
        fs::remove_file(&path).ok();

        assert!(result.is_err());
    }
}
