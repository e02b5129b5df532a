//! Page fetching
//!
//! Design: the controller only talks to the [`PageFetcher`] trait, so the
//! transport can be swapped (tests inject fakes that count calls).
//! [`HttpFetcher`] is the reqwest-backed implementation used by default.

mod http;

pub use http::HttpFetcher;

use crate::error::PageError;
use crate::types::RawPage;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Trait for page fetchers
///
/// A fetcher performs exactly one retrieval per call and never retries.
/// Non-2xx responses are returned as data in [`RawPage::status_code`];
/// only transport failures are errors.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Unique identifier for this fetcher (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Fetch the URL, giving up after `timeout`
    ///
    /// The URL has already been validated by the caller.
    /// Returns [`PageError::Timeout`] when the deadline expires.
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawPage, PageError>;
}
