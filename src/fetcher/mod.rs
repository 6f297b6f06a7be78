use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT}, redirect::Policy};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use crate::api::config::DetectorConfig;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Result of a single page fetch. Consumed right away by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Status in [200, 400) with the decoded body (empty if there was none)
    Success { status_code: u16, body: String },
    /// Any other status. The body is dropped.
    HttpFailure { status_code: u16 },
    /// No status line was obtained: DNS, connect, TLS, timeout, decode...
    TransportFailure { reason: String },
}

/// Seam between the pipeline and the network.
///
/// Implementations must be total: every failure is reported through
/// [`FetchOutcome`] rather than an error or a panic.
pub trait PageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FetchOutcome>;
}

/// Fetches pages over HTTP with a shared, preconfigured `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    request_timeout: Duration,
}

impl HttpFetcher {
    /// Builds the HTTP client. Connection level settings (connect timeout,
    /// redirects, user agent) are fixed here for the life of the process.
    /// Fails if `config` does not validate.
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        config.validate()?;
        debug!("Initializing HTTP client with user agent: {}", config.user_agent);
        let mut headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .context("Failed to create User-Agent header")?;
        headers.insert(USER_AGENT, user_agent);

        let client = Client::builder()
            .redirect(redirect_policy(config))
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            request_timeout: config.request_timeout(),
        })
    }

    /// Performs exactly one GET. Never retries.
    pub async fn fetch_page(&self, url: &str) -> FetchOutcome {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Refusing to fetch unparseable URL '{}': {}", url, e);
                return FetchOutcome::TransportFailure {
                    reason: format!("InvalidUrl: {}", e),
                };
            }
        };

        trace!("Sending request to {}", parsed);
        let response = match self
            .client
            .get(parsed)
            .header(ACCEPT, ACCEPT_HTML)
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("Request to {} failed: {}", url, e);
                return transport_failure(&e);
            }
        };

        let status = response.status().as_u16();
        debug!("Response status for {}: {}", url, status);
        if !(200..400).contains(&status) {
            return FetchOutcome::HttpFailure { status_code: status };
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Success { status_code: status, body },
            Err(e) => {
                debug!("Failed to read response body from {}: {}", url, e);
                transport_failure(&e)
            }
        }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FetchOutcome> {
        self.fetch_page(url).boxed()
    }
}

/// Follows redirects up to the configured hop limit, but stops rather than
/// downgrade from https to http. A stopped redirect hands the 3xx response
/// back to the caller.
fn redirect_policy(config: &DetectorConfig) -> Policy {
    if !config.follow_redirects {
        return Policy::none();
    }

    let max_redirects = config.max_redirects;
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            return attempt.error("too many redirects");
        }

        if is_downgrade(attempt.previous(), attempt.url()) {
            debug!("Not following https -> http redirect to {}", attempt.url());
            attempt.stop()
        } else {
            attempt.follow()
        }
    })
}

/// True when `next` would move a chain currently on https over to plain http
fn is_downgrade(previous: &[Url], next: &Url) -> bool {
    next.scheme() == "http"
        && previous
            .last()
            .map(|current| current.scheme() == "https")
            .unwrap_or(false)
}

fn transport_failure(error: &reqwest::Error) -> FetchOutcome {
    FetchOutcome::TransportFailure {
        reason: format!("{}: {}", failure_category(error), error),
    }
}

/// Short category for a transport error, used as the prefix of its message
fn failure_category(error: &reqwest::Error) -> &'static str {
    let details = source_chain(error).to_lowercase();

    if error.is_builder() {
        "InvalidUrl"
    } else if error.is_timeout() {
        "Timeout"
    } else if error.is_redirect() {
        "TooManyRedirects"
    } else if details.contains("dns") || details.contains("failed to lookup address") {
        "DnsError"
    } else if details.contains("certificate") || details.contains("tls") || details.contains("ssl") {
        "TlsError"
    } else if error.is_connect() {
        "ConnectError"
    } else if error.is_decode() || error.is_body() {
        "DecodeError"
    } else {
        "RequestError"
    }
}

/// Messages of the underlying causes, without reqwest's own (URL bearing) message
fn source_chain(error: &reqwest::Error) -> String {
    let mut details = Vec::new();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        details.push(cause.to_string());
        source = cause.source();
    }
    details.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(config: &DetectorConfig) -> HttpFetcher {
        HttpFetcher::new(config).expect("client builds")
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<script src=\"//cdn.shopify.com/x.js\"></script>")
            .create_async()
            .await;

        let outcome = fetcher(&DetectorConfig::default()).fetch_page(&server.url()).await;

        mock.assert_async().await;
        assert_eq!(
            outcome,
            FetchOutcome::Success {
                status_code: 200,
                body: "<script src=\"//cdn.shopify.com/x.js\"></script>".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_sends_user_agent_and_accept_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("user-agent", "Test/1.0")
            .match_header("accept", ACCEPT_HTML)
            .with_status(200)
            .create_async()
            .await;

        let config = DetectorConfig::default().with_user_agent("Test/1.0");
        let outcome = fetcher(&config).fetch_page(&server.url()).await;

        mock.assert_async().await;
        assert_eq!(outcome, FetchOutcome::Success { status_code: 200, body: String::new() });
    }

    #[tokio::test]
    async fn test_not_found_is_http_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("cdn.shopify.com")
            .create_async()
            .await;

        let url = format!("{}/missing", server.url());
        let outcome = fetcher(&DetectorConfig::default()).fetch_page(&url).await;

        assert_eq!(outcome, FetchOutcome::HttpFailure { status_code: 404 });
    }

    #[tokio::test]
    async fn test_server_error_is_http_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(503).create_async().await;

        let outcome = fetcher(&DetectorConfig::default()).fetch_page(&server.url()).await;

        assert_eq!(outcome, FetchOutcome::HttpFailure { status_code: 503 });
    }

    #[tokio::test]
    async fn test_follows_redirect() {
        let mut server = mockito::Server::new_async().await;
        let target = format!("{}/new", server.url());
        let _old = server
            .mock("GET", "/old")
            .with_status(301)
            .with_header("location", &target)
            .create_async()
            .await;
        let _new = server
            .mock("GET", "/new")
            .with_status(200)
            .with_body("woocommerce-no-js")
            .create_async()
            .await;

        let url = format!("{}/old", server.url());
        let outcome = fetcher(&DetectorConfig::default()).fetch_page(&url).await;

        assert_eq!(
            outcome,
            FetchOutcome::Success { status_code: 200, body: "woocommerce-no-js".to_string() }
        );
    }

    #[tokio::test]
    async fn test_redirect_not_followed_when_disabled() {
        let mut server = mockito::Server::new_async().await;
        let _old = server
            .mock("GET", "/old")
            .with_status(302)
            .with_header("location", "/new")
            .create_async()
            .await;

        let url = format!("{}/old", server.url());
        let config = DetectorConfig::default().with_follow_redirects(false);
        let outcome = fetcher(&config).fetch_page(&url).await;

        assert_eq!(outcome, FetchOutcome::Success { status_code: 302, body: String::new() });
    }

    #[tokio::test]
    async fn test_redirect_loop_is_transport_failure() {
        let mut server = mockito::Server::new_async().await;
        let _loop = server
            .mock("GET", "/loop")
            .with_status(302)
            .with_header("location", "/loop")
            .expect_at_least(1)
            .create_async()
            .await;

        let url = format!("{}/loop", server.url());
        let config = DetectorConfig::default().with_max_redirects(2);
        let outcome = fetcher(&config).fetch_page(&url).await;

        match outcome {
            FetchOutcome::TransportFailure { reason } => {
                assert!(reason.starts_with("TooManyRedirects:"), "unexpected reason: {}", reason)
            }
            other => panic!("expected transport failure, got {:?}", other),
        }
    }

    fn urls(raw: &[&str]) -> Vec<Url> {
        raw.iter().map(|u| Url::parse(u).unwrap()).collect()
    }

    #[test]
    fn test_https_to_http_redirect_is_a_downgrade() {
        let previous = urls(&["https://shop.example/"]);
        let next = Url::parse("http://shop.example/home").unwrap();

        assert!(is_downgrade(&previous, &next));
    }

    #[test]
    fn test_upgrade_and_same_scheme_redirects_are_followed() {
        let plain = urls(&["http://shop.example/"]);
        let secure = urls(&["http://shop.example/", "https://shop.example/"]);

        assert!(!is_downgrade(&plain, &Url::parse("https://shop.example/").unwrap()));
        assert!(!is_downgrade(&plain, &Url::parse("http://www.shop.example/").unwrap()));
        assert!(!is_downgrade(&secure, &Url::parse("https://www.shop.example/").unwrap()));
        assert!(!is_downgrade(&[], &Url::parse("http://shop.example/").unwrap()));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        // port 1 on loopback has nothing listening
        let outcome = fetcher(&DetectorConfig::default()).fetch_page("http://127.0.0.1:1/").await;

        assert!(matches!(outcome, FetchOutcome::TransportFailure { .. }));
    }

    #[tokio::test]
    async fn test_unparseable_url_is_transport_failure() {
        let outcome = fetcher(&DetectorConfig::default()).fetch_page("https://exa mple.com").await;

        match outcome {
            FetchOutcome::TransportFailure { reason } => assert!(reason.starts_with("InvalidUrl:")),
            other => panic!("expected transport failure, got {:?}", other),
        }
    }
}
