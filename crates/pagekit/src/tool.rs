//! Tool builder and pagination controller
//!
//! Every call runs the whole pipeline from scratch:
//! validate → fetch → extract → split → select one chunk.
//! Nothing is cached between calls, so a [`Tool`] can be shared freely
//! across concurrent callers.

use crate::error::PageError;
use crate::extract::extract;
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::splitter::{TextSplitter, Tiktoken, TokenCounter, DEFAULT_CHUNK_SIZE};
use crate::types::{PageRequest, PageResult, ToolSpec};
use crate::{TOOL_LLMTXT, TOOL_NAME};
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default anti-overload ceiling: pages `0..3` may be read
pub const DEFAULT_MAX_PAGES: usize = 3;

/// Default download timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Status update during tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStatus {
    /// Current phase ("validate", "fetch", "extract", "split", "complete")
    pub phase: String,
    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Estimated completion percentage (0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<f32>,
}

impl ToolStatus {
    /// Create a new status with phase
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            message: None,
            percent_complete: None,
        }
    }

    /// Set message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set completion percentage
    pub fn with_percent(mut self, percent: f32) -> Self {
        self.percent_complete = Some(percent);
        self
    }
}

/// Builder for configuring the page tool
#[derive(Clone)]
pub struct ToolBuilder {
    user_agent: Option<String>,
    chunk_size: usize,
    max_pages: usize,
    default_timeout: Duration,
    allow_prefixes: Vec<String>,
    block_prefixes: Vec<String>,
    ceiling_first: bool,
    fetcher: Option<Arc<dyn PageFetcher>>,
    token_counter: Option<Arc<dyn TokenCounter>>,
    model: Option<String>,
    separators: Option<Vec<String>>,
}

impl Default for ToolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolBuilder {
    /// Create a new tool builder with default limits
    pub fn new() -> Self {
        Self {
            user_agent: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            default_timeout: DEFAULT_TIMEOUT,
            allow_prefixes: Vec::new(),
            block_prefixes: Vec::new(),
            ceiling_first: false,
            fetcher: None,
            token_counter: None,
            model: None,
            separators: None,
        }
    }

    /// Set custom User-Agent (ignored when a custom fetcher is set)
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the token bound per chunk
    pub fn chunk_size(mut self, tokens: usize) -> Self {
        self.chunk_size = tokens;
        self
    }

    /// Set the paging ceiling; page indices at or above it are refused
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    /// Set the timeout used when a request has no `timeout_sec`
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Add URL prefix to allow list
    pub fn allow_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.allow_prefixes.push(prefix.into());
        self
    }

    /// Add URL prefix to block list
    pub fn block_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.block_prefixes.push(prefix.into());
        self
    }

    /// Check the paging ceiling before the chunk-count bound
    ///
    /// Off by default: a page index past the last chunk reports 500 even
    /// when it is also past the ceiling. When on, any index at or past the
    /// ceiling reports 503.
    pub fn enforce_ceiling_first(mut self, enable: bool) -> Self {
        self.ceiling_first = enable;
        self
    }

    /// Use a custom fetcher instead of HTTP
    pub fn fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Use a custom token counter instead of the o200k tokenizer
    pub fn token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.token_counter = Some(counter);
        self
    }

    /// Count tokens with the tiktoken vocabulary of the given model
    ///
    /// Ignored when a custom token counter is set.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Replace the splitter's separators, coarsest first
    pub fn separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = Some(separators.into_iter().map(Into::into).collect());
        self
    }

    /// Build the tool
    ///
    /// Fails if the HTTP client or the tokenizer cannot be created.
    pub fn build(self) -> Result<Tool, PageError> {
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(self.user_agent.as_deref())?),
        };
        let counter: Arc<dyn TokenCounter> = match (self.token_counter, self.model.as_deref()) {
            (Some(counter), _) => counter,
            (None, Some(model)) => Arc::new(Tiktoken::for_model(model)?),
            (None, None) => Arc::new(Tiktoken::o200k()?),
        };

        let mut splitter = TextSplitter::new(counter, self.chunk_size);
        if let Some(separators) = self.separators {
            splitter = splitter.with_separators(separators);
        }

        Ok(Tool {
            fetcher,
            splitter,
            max_pages: self.max_pages,
            default_timeout: self.default_timeout,
            allow_prefixes: self.allow_prefixes,
            block_prefixes: self.block_prefixes,
            ceiling_first: self.ceiling_first,
        })
    }
}

/// Configured page tool
///
/// Cloning is cheap; clones share the fetcher and tokenizer.
#[derive(Clone)]
pub struct Tool {
    fetcher: Arc<dyn PageFetcher>,
    splitter: TextSplitter,
    max_pages: usize,
    default_timeout: Duration,
    allow_prefixes: Vec<String>,
    block_prefixes: Vec<String>,
    ceiling_first: bool,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("fetcher", &self.fetcher.name())
            .field("chunk_size", &self.splitter.chunk_size())
            .field("max_pages", &self.max_pages)
            .field("default_timeout", &self.default_timeout)
            .field("allow_prefixes", &self.allow_prefixes)
            .field("block_prefixes", &self.block_prefixes)
            .field("ceiling_first", &self.ceiling_first)
            .finish()
    }
}

impl Tool {
    /// Create a new tool builder
    pub fn builder() -> ToolBuilder {
        ToolBuilder::new()
    }

    /// Tool with default settings
    pub fn new() -> Result<Self, PageError> {
        ToolBuilder::new().build()
    }

    /// Tool name the agent calls
    pub fn name(&self) -> &'static str {
        TOOL_NAME
    }

    /// Usage description for the agent, with this tool's limits filled in
    pub fn description(&self) -> String {
        format!(
            "Fetches the main readable content of a web page, one page of text at a time.\n\n\
             Returns `status` and `page_content` (`title`, `content`, `has_next`). \
             If `status` is not 200, fetching failed and `page_content.error_message` says why \
             (please try to fetch other pages).\n\n\
             Each page holds at most {chunk_size} tokens of content. If `has_next` is true, \
             more content follows: call again with the same `url` and `page_num` incremented by one \
             (paging starts at 0, so the next page is 1).\n\n\
             If a document is long, do not fetch more than {max_pages} pages of it; \
             answer with the information you already have instead.",
            chunk_size = self.splitter.chunk_size(),
            max_pages = self.max_pages,
        )
    }

    /// Get full documentation (llmtxt)
    pub fn llmtxt(&self) -> &'static str {
        TOOL_LLMTXT
    }

    /// Get input schema as JSON
    pub fn input_schema(&self) -> serde_json::Value {
        let schema = schema_for!(PageRequest);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Get output schema as JSON
    pub fn output_schema(&self) -> serde_json::Value {
        let schema = schema_for!(PageResult);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Capability descriptor for registering with an agent runtime
    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }

    /// Execute the tool with the given request
    ///
    /// Never fails: every error becomes a [`PageResult`] with a status code
    /// and a message the caller can act on.
    pub async fn execute(&self, req: PageRequest) -> PageResult {
        self.execute_with_status(req, |_| {}).await
    }

    /// Execute the tool with status updates
    pub async fn execute_with_status<F>(&self, req: PageRequest, mut status_callback: F) -> PageResult
    where
        F: FnMut(ToolStatus),
    {
        let url = req.url.clone();
        let page_num = req.page_num;

        let result = match self.run(req, &mut status_callback).await {
            Ok(result) => result,
            Err(err) => {
                debug!(url = %url, page_num, error = ?err, "Page request failed");
                PageResult::from(err)
            }
        };

        status_callback(
            ToolStatus::new("complete")
                .with_percent(100.0)
                .with_message(format!("status {}", result.status)),
        );

        result
    }

    async fn run<F>(&self, req: PageRequest, status_callback: &mut F) -> Result<PageResult, PageError>
    where
        F: FnMut(ToolStatus),
    {
        status_callback(ToolStatus::new("validate").with_percent(0.0));
        let (url, page_num, timeout) = self.validate(&req)?;

        status_callback(ToolStatus::new("fetch").with_percent(10.0));
        debug!(fetcher = self.fetcher.name(), url = %url, page_num, "Fetching page");
        let page = self.fetcher.fetch(&url, timeout).await?;
        if !(200..300).contains(&page.status_code) {
            return Err(PageError::HttpStatus(page.status_code));
        }

        status_callback(ToolStatus::new("extract").with_percent(60.0));
        // Readability and splitting are CPU-bound; keep them off the async workers
        let content = tokio::task::spawn_blocking(move || extract(&page, &url))
            .await
            .map_err(|e| PageError::Parse(e.to_string()))??;

        status_callback(ToolStatus::new("split").with_percent(80.0));
        let splitter = self.splitter.clone();
        let text = content.text;
        let chunks = tokio::task::spawn_blocking(move || splitter.split(&text))
            .await
            .map_err(|e| PageError::Internal(e.to_string()))?;
        debug!(page_num, chunks = chunks.len(), "Split page content");

        self.select(content.title, chunks, page_num)
    }

    /// Validate a request before any I/O
    fn validate(&self, req: &PageRequest) -> Result<(Url, usize, Duration), PageError> {
        let page_num = usize::try_from(req.page_num).map_err(|_| PageError::InvalidPageNum)?;

        let timeout = match req.timeout_sec {
            None => self.default_timeout,
            Some(secs) if secs.is_finite() && secs > 0.0 => {
                Duration::try_from_secs_f64(secs).map_err(|_| PageError::InvalidTimeout)?
            }
            Some(_) => return Err(PageError::InvalidTimeout),
        };

        let url = validate_url(&req.url)?;

        if !self.allow_prefixes.is_empty()
            && !self
                .allow_prefixes
                .iter()
                .any(|prefix| req.url.starts_with(prefix))
        {
            return Err(PageError::BlockedUrl);
        }

        if self
            .block_prefixes
            .iter()
            .any(|prefix| req.url.starts_with(prefix))
        {
            return Err(PageError::BlockedUrl);
        }

        Ok((url, page_num, timeout))
    }

    /// Pick the requested chunk, enforcing the chunk-count bound and the ceiling
    fn select(
        &self,
        title: String,
        mut chunks: Vec<String>,
        page_num: usize,
    ) -> Result<PageResult, PageError> {
        let total = chunks.len();
        let over_ceiling = page_num >= self.max_pages;

        if self.ceiling_first && over_ceiling {
            return Err(PageError::PageLimit {
                page_num,
                max_pages: self.max_pages,
            });
        }
        if page_num >= total {
            return Err(PageError::PageOutOfRange { page_num, total });
        }
        if over_ceiling {
            return Err(PageError::PageLimit {
                page_num,
                max_pages: self.max_pages,
            });
        }

        let has_next = page_num < total - 1;
        Ok(PageResult::page(title, chunks.swap_remove(page_num), has_next))
    }
}

/// Check that `url` is an absolute http(s) URL with a host
pub fn validate_url(url: &str) -> Result<Url, PageError> {
    if url.is_empty() {
        return Err(PageError::MissingUrl);
    }

    let parsed = Url::parse(url).map_err(|_| PageError::InvalidUrl)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PageError::InvalidUrl);
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(PageError::InvalidUrl);
    }

    Ok(parsed)
}
