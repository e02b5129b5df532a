//! Error types for PageKit
//!
//! Every variant doubles as an agent-facing outcome: [`PageError::status`]
//! gives the status code reported in [`PageResult`](crate::PageResult) and the
//! `Display` text becomes its `error_message`.

use thiserror::Error;

/// Errors that can occur while fetching and paginating a page
#[derive(Debug, Error)]
pub enum PageError {
    /// Requested page index is negative
    #[error("page_num must be 0 or greater. Please provide a valid page number.")]
    InvalidPageNum,

    /// Timeout is zero, negative or not a number
    #[error("timeout_sec must be a positive number of seconds.")]
    InvalidTimeout,

    /// URL is missing
    #[error("Missing required parameter: url")]
    MissingUrl,

    /// URL is not an absolute http(s) URL with a host
    #[error("Invalid URL: must be an absolute http:// or https:// URL with a host")]
    InvalidUrl,

    /// URL is blocked by prefix list
    #[error("Blocked URL: prefix not allowed. Please try to fetch other pages.")]
    BlockedUrl,

    /// Failed to build HTTP client
    #[error("Could not download page. Please try to fetch other pages.")]
    ClientBuild(#[source] reqwest::Error),

    /// Request did not complete within the timeout
    #[error("Could not download page due to Timeout Error. Please try to fetch other pages.")]
    Timeout,

    /// Failed to connect to server
    #[error("Could not download page. Please try to fetch other pages.")]
    Connect(#[source] reqwest::Error),

    /// Other transport error
    #[error("Could not download page. Please try to fetch other pages.")]
    Request(String),

    /// Server answered with a non-2xx status
    #[error("Could not download page. Please try to fetch other pages.")]
    HttpStatus(u16),

    /// Body is binary (image, archive, pdf, ...)
    #[error("Could not parse page content. Please try to fetch other pages.")]
    UnsupportedContent(String),

    /// HTML could not be parsed or the readability pass failed
    #[error("Could not parse page content. Please try to fetch other pages.")]
    Parse(String),

    /// Requested page is past the last chunk
    #[error("page_num parameter looks invalid. Please try to fetch other pages.")]
    PageOutOfRange {
        /// Requested page index
        page_num: usize,
        /// Number of chunks the document produced
        total: usize,
    },

    /// Requested page is at or past the paging ceiling
    #[error("Reading more of this page_num's content will overload your memory. Please provide your response based on the information you currently have.")]
    PageLimit {
        /// Requested page index
        page_num: usize,
        /// Configured ceiling
        max_pages: usize,
    },

    /// Tokenizer vocabulary could not be loaded
    #[error("Failed to load tokenizer: {0}")]
    Tokenizer(String),

    /// Background task failed unexpectedly
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PageError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PageError::Timeout
        } else if err.is_connect() {
            PageError::Connect(err)
        } else {
            PageError::Request(err.to_string())
        }
    }

    /// Status code reported to the caller for this error
    ///
    /// Input problems are 400, a remote non-2xx status is passed through
    /// verbatim, the paging ceiling is 503 and everything else is 500.
    pub fn status(&self) -> u16 {
        match self {
            PageError::InvalidPageNum
            | PageError::InvalidTimeout
            | PageError::MissingUrl
            | PageError::InvalidUrl
            | PageError::BlockedUrl => 400,
            PageError::HttpStatus(code) => *code,
            PageError::PageLimit { .. } => 503,
            PageError::ClientBuild(_)
            | PageError::Timeout
            | PageError::Connect(_)
            | PageError::Request(_)
            | PageError::UnsupportedContent(_)
            | PageError::Parse(_)
            | PageError::PageOutOfRange { .. }
            | PageError::Tokenizer(_)
            | PageError::Internal(_) => 500,
        }
    }
}
