//! Core types for PageKit

use crate::error::PageError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Request for one page of a URL's readable content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PageRequest {
    /// The URL of the web page to read (required, must be http:// or https://)
    pub url: String,

    /// Page number, starting at 0. Increment it with the same URL to read the next part of a long page. Negative values are invalid.
    #[serde(default)]
    #[schemars(range(min = 0))]
    pub page_num: i64,

    /// Download timeout in seconds (optional, default 10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_sec: Option<f64>,
}

impl PageRequest {
    /// Create a new request for the first page of the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the page number
    pub fn page_num(mut self, page_num: i64) -> Self {
        self.page_num = page_num;
        self
    }

    /// Set the download timeout in seconds
    pub fn timeout_sec(mut self, seconds: f64) -> Self {
        self.timeout_sec = Some(seconds);
        self
    }
}

/// A fetched HTTP response, body decoded as UTF-8
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPage {
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

/// Main readable content of a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    /// Document title, possibly empty
    pub title: String,
    /// Plain text with paragraphs separated by blank lines
    pub text: String,
}

/// Payload of a [`PageResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PageContent {
    /// One chunk of the page
    Page {
        /// Document title
        title: String,
        /// Text of the requested chunk
        content: String,
        /// True if another page follows this one
        has_next: bool,
    },
    /// Failure description for the caller
    Error {
        /// What went wrong and what to do instead
        error_message: String,
    },
}

/// Result of a `fetch_page` call
///
/// `status` must be checked before trusting the shape of `page_content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PageResult {
    /// 200 on success, 400 for invalid input, the site's own code for non-2xx
    /// responses, 500 for download/parse/index errors, 503 when paging further
    /// is refused
    pub status: u16,

    /// Page chunk on success, error message otherwise
    pub page_content: PageContent,
}

impl PageResult {
    /// Successful result carrying one chunk
    pub fn page(title: impl Into<String>, content: impl Into<String>, has_next: bool) -> Self {
        Self {
            status: 200,
            page_content: PageContent::Page {
                title: title.into(),
                content: content.into(),
                has_next,
            },
        }
    }

    /// Failed result with an explicit status
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            page_content: PageContent::Error {
                error_message: message.into(),
            },
        }
    }

    /// True for status 200
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Chunk text, if this is a success
    pub fn content(&self) -> Option<&str> {
        match &self.page_content {
            PageContent::Page { content, .. } => Some(content),
            PageContent::Error { .. } => None,
        }
    }

    /// `has_next` flag, if this is a success
    pub fn has_next(&self) -> Option<bool> {
        match &self.page_content {
            PageContent::Page { has_next, .. } => Some(*has_next),
            PageContent::Error { .. } => None,
        }
    }

    /// Error message, if this is a failure
    pub fn error_message(&self) -> Option<&str> {
        match &self.page_content {
            PageContent::Page { .. } => None,
            PageContent::Error { error_message } => Some(error_message),
        }
    }
}

impl From<PageError> for PageResult {
    fn from(err: PageError) -> Self {
        PageResult::error(err.status(), err.to_string())
    }
}

/// Capability descriptor used to register the tool with an agent runtime
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    /// Tool name the agent calls
    pub name: String,
    /// Usage description, including the paging protocol
    pub description: String,
    /// JSON schema of [`PageRequest`]
    pub input_schema: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = PageRequest::new("https://example.com")
            .page_num(2)
            .timeout_sec(3.5);

        assert_eq!(req.url, "https://example.com");
        assert_eq!(req.page_num, 2);
        assert_eq!(req.timeout_sec, Some(3.5));
    }

    #[test]
    fn test_request_defaults_from_json() {
        let req: PageRequest = serde_json::from_str(r#"{"url": "https://example.com"}"#).unwrap();
        assert_eq!(req.page_num, 0);
        assert!(req.timeout_sec.is_none());

        let req: PageRequest =
            serde_json::from_str(r#"{"url": "https://example.com", "page_num": -1}"#).unwrap();
        assert_eq!(req.page_num, -1);
    }

    #[test]
    fn test_request_serialization() {
        let req = PageRequest::new("https://example.com").page_num(1);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"url\":\"https://example.com\""));
        assert!(json.contains("\"page_num\":1"));
        assert!(!json.contains("timeout_sec"));
    }

    #[test]
    fn test_success_result_shape() {
        let result = PageResult::page("Title", "Body", true);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], 200);
        assert_eq!(json["page_content"]["title"], "Title");
        assert_eq!(json["page_content"]["content"], "Body");
        assert_eq!(json["page_content"]["has_next"], true);
        assert!(json["page_content"].get("error_message").is_none());
    }

    #[test]
    fn test_error_result_shape() {
        let result = PageResult::error(503, "stop");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], 503);
        assert_eq!(json["page_content"]["error_message"], "stop");
        assert!(json["page_content"].get("content").is_none());
        assert!(!result.is_success());
        assert_eq!(result.content(), None);
        assert_eq!(result.error_message(), Some("stop"));
    }

    #[test]
    fn test_result_deserializes_both_variants() {
        let ok: PageResult = serde_json::from_str(
            r#"{"status":200,"page_content":{"title":"t","content":"c","has_next":false}}"#,
        )
        .unwrap();
        assert_eq!(ok, PageResult::page("t", "c", false));

        let err: PageResult =
            serde_json::from_str(r#"{"status":500,"page_content":{"error_message":"x"}}"#)
                .unwrap();
        assert_eq!(err, PageResult::error(500, "x"));
    }

    #[test]
    fn test_result_from_error() {
        let result = PageResult::from(PageError::HttpStatus(404));
        assert_eq!(result.status, 404);
        assert!(result.error_message().unwrap().contains("Could not download"));
    }
}
