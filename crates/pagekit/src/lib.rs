//! PageKit - paginated web page reading for LLM agents
//!
//! This crate exposes a single agent-callable tool, `fetch_page`, that
//! downloads a web page, extracts its main readable content, splits that
//! content into token-bounded chunks and returns one chunk per call.
//!
//! ## Pipeline
//!
//! Each call is stateless and runs the whole pipeline:
//!
//! 1. [`PageFetcher`] downloads the page ([`HttpFetcher`] by default)
//! 2. [`extract`](extract::extract) isolates the main content and renders it as text
//! 3. [`TextSplitter`] cuts the text into chunks of at most `chunk_size` tokens
//! 4. [`Tool`] returns the chunk at `page_num`, or a status-coded error
//!
//! ## Example
//!
//! ```no_run
//! use pagekit::{PageRequest, Tool};
//!
//! # async fn run() -> Result<(), pagekit::PageError> {
//! let tool = Tool::builder().chunk_size(1000).build()?;
//!
//! let first = tool.execute(PageRequest::new("https://example.com/article")).await;
//! if first.is_success() && first.has_next() == Some(true) {
//!     let second = tool
//!         .execute(PageRequest::new("https://example.com/article").page_num(1))
//!         .await;
//!     println!("{:?}", second.content());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod extract;
pub mod fetcher;
pub mod splitter;
mod tool;
mod types;

pub use error::PageError;
pub use extract::{html_to_text, is_html};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use splitter::{TextSplitter, Tiktoken, TokenCounter, DEFAULT_CHUNK_SIZE};
pub use tool::{validate_url, Tool, ToolBuilder, ToolStatus, DEFAULT_MAX_PAGES, DEFAULT_TIMEOUT};
pub use types::{ExtractedContent, PageContent, PageRequest, PageResult, RawPage, ToolSpec};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = concat!("pagekit/", env!("CARGO_PKG_VERSION"));

/// Tool name the agent calls
pub const TOOL_NAME: &str = "fetch_page";

/// Extended documentation for LLM consumption (llmtxt)
pub const TOOL_LLMTXT: &str = r#"# fetch_page Tool

Reads the main content of a web page, one page of text at a time.

## Capabilities
- Downloads HTML and plain-text pages over http:// and https://
- Strips navigation, ads and boilerplate, keeping the article body
- Splits long content into pages of bounded token length
- Reports failures as status codes with a suggested next step

## Input Parameters
- `url` (required): The URL of the web page (must be http:// or https://)
- `page_num` (optional): Page number starting at 0 (default: 0)
- `timeout_sec` (optional): Download timeout in seconds (default: 10)

## Output Fields
- `status`: 200 on success, otherwise an error status
- `page_content.title`: Document title
- `page_content.content`: Text of the requested page
- `page_content.has_next`: True if a further page exists
- `page_content.error_message`: Present instead of the fields above when `status` is not 200

## Status Codes
- `200`: Success
- `400`: Invalid input (negative `page_num`, bad URL or timeout); fix the call
- `404`, `403`, ...: The site's own response code; try other pages
- `500`: Download timed out, failed, could not be parsed, or `page_num` is past the end
- `503`: Paging limit reached; answer with what you already have

## Paging
Start with `page_num` 0. While `has_next` is true, call again with the same
`url` and `page_num` + 1. Stop after the paging limit even if more remains.

## Examples

### Read the first page
```json
{"url": "https://example.com/article"}
```

### Read the next page
```json
{"url": "https://example.com/article", "page_num": 1}
```

### Use a shorter timeout
```json
{"url": "https://example.com/article", "timeout_sec": 5}
```
"#;
