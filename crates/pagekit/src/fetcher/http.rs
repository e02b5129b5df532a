//! HTTP page fetcher
//!
//! One GET per call, bounded by the per-call timeout, body decoded as UTF-8
//! regardless of the charset the server declares.

use crate::error::PageError;
use crate::fetcher::PageFetcher;
use crate::types::RawPage;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Accept header sent with every request
const ACCEPT_VALUE: &str = "text/html, application/xhtml+xml, text/plain, */*;q=0.8";

/// reqwest-backed fetcher
///
/// Holds one client for the lifetime of the tool. The client carries no
/// per-page state, so concurrent calls are independent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the given User-Agent (or the default one)
    pub fn new(user_agent: Option<&str>) -> Result<Self, PageError> {
        let mut headers = HeaderMap::new();
        let user_agent = user_agent.unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(PageError::ClientBuild)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawPage, PageError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Request failed");
                PageError::from_reqwest(e)
            })?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // The request timeout also covers reading the body
        let body = response.bytes().await.map_err(|e| {
            warn!(url = %url, error = %e, "Failed to read body");
            PageError::from_reqwest(e)
        })?;

        debug!(url = %url, status_code, size = body.len(), "Fetched page");

        Ok(RawPage {
            status_code,
            content_type,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_fetcher_builds() {
        let fetcher = HttpFetcher::new(None).unwrap();
        assert_eq!(fetcher.name(), "http");

        let fetcher = HttpFetcher::new(Some("TestAgent/1.0")).unwrap();
        assert_eq!(fetcher.name(), "http");
    }

    #[test]
    fn test_invalid_user_agent_falls_back() {
        // Header values cannot contain newlines
        assert!(HttpFetcher::new(Some("bad\nagent")).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let fetcher = HttpFetcher::new(None).unwrap();
        // Port 9 (discard) on loopback is expected to refuse connections
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = fetcher
            .fetch(&url, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert_eq!(err.status(), 500);
    }
}
