//! Main-content extraction
//!
//! HTML goes through a readability pass (text density and link density
//! scoring over the DOM) to pick the primary content subtree, which is then
//! flattened to plain text with paragraph breaks kept as blank lines.

use crate::error::PageError;
use crate::types::{ExtractedContent, RawPage};
use std::io::Cursor;
use std::iter::Peekable;
use std::panic::{self, AssertUnwindSafe};
use std::str::Chars;
use tracing::{debug, warn};
use url::Url;

/// Binary content type prefixes
const BINARY_PREFIXES: &[&str] = &[
    "image/",
    "audio/",
    "video/",
    "application/octet-stream",
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/x-tar",
    "application/x-rar",
    "application/x-7z",
    "application/vnd.ms-",
    "application/vnd.openxmlformats",
    "font/",
];

/// Elements whose content is never text
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "head", "title", "template",
];

/// Elements rendered as a separate paragraph
const PARAGRAPH_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "ul",
    "ol",
    "dl",
    "table",
    "section",
    "article",
    "main",
    "header",
    "footer",
    "figure",
    "hr",
];

/// Elements rendered on their own line
const LINE_TAGS: &[&str] = &["br", "div", "li", "tr", "dt", "dd", "figcaption"];

/// Extract the title and main text from a fetched page
///
/// Binary bodies are rejected, HTML goes through readability, and any other
/// textual body (plain text, markdown, JSON) is used as-is with an empty title.
pub fn extract(page: &RawPage, url: &Url) -> Result<ExtractedContent, PageError> {
    if let Some(ref ct) = page.content_type {
        if is_binary_content_type(ct) {
            return Err(PageError::UnsupportedContent(ct.clone()));
        }
    }

    if page.body.trim().is_empty() {
        return Ok(ExtractedContent::default());
    }

    if !is_html(&page.content_type, &page.body) {
        debug!(url = %url, "Body is not HTML, skipping readability");
        return Ok(ExtractedContent {
            title: String::new(),
            text: clean_whitespace(&page.body),
        });
    }

    let mut cursor = Cursor::new(page.body.as_bytes());
    let product = contain_panic(|| {
        readability::extractor::extract(&mut cursor, url)
            .map_err(|e| PageError::Parse(e.to_string()))
    })?;

    let mut title = clean_whitespace(&product.title);
    let text = html_to_text(&product.content);

    if title.is_empty() {
        title = first_heading(&page.body).unwrap_or_default();
    }

    debug!(url = %url, title = %title, chars = text.len(), "Extracted main content");

    Ok(ExtractedContent { title, text })
}

/// Run an extraction step, reporting a panic as a parse failure
fn contain_panic<T>(step: impl FnOnce() -> Result<T, PageError>) -> Result<T, PageError> {
    panic::catch_unwind(AssertUnwindSafe(step)).unwrap_or_else(|_| {
        warn!("Content extraction panicked");
        Err(PageError::Parse("content extraction panicked".to_string()))
    })
}

/// Check if content type indicates binary content
pub fn is_binary_content_type(content_type: &str) -> bool {
    let ct_lower = content_type.to_lowercase();
    BINARY_PREFIXES
        .iter()
        .any(|prefix| ct_lower.starts_with(prefix))
}

/// Check if content is HTML based on content type and body
pub fn is_html(content_type: &Option<String>, body: &str) -> bool {
    if let Some(ct) = content_type {
        let ct_lower = ct.to_lowercase();
        if ct_lower.contains("text/html") || ct_lower.contains("application/xhtml") {
            return true;
        }
    }

    let head: String = skip_prolog(body).chars().take(16).collect();
    let head = head.to_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Skip a byte order mark, whitespace, comments and `<?...?>` declarations
fn skip_prolog(body: &str) -> &str {
    let mut rest = body.trim_start_matches('\u{feff}').trim_start();
    loop {
        let end = if rest.starts_with("<!--") {
            rest.find("-->").map(|i| i + 3)
        } else if rest.starts_with("<?") {
            rest.find("?>").map(|i| i + 2)
        } else {
            return rest;
        };
        match end {
            Some(end) => rest = rest[end..].trim_start(),
            None => return "",
        }
    }
}

/// Convert HTML to plain text
///
/// Tags are stripped, entities decoded and whitespace collapsed. Block
/// elements become blank-line separated paragraphs, list items get a `- `
/// bullet. `<pre>` content keeps its whitespace as-is.
pub fn html_to_text(html: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut output = String::new();
    let mut preformatted: Option<String> = None;
    let mut skip_elements: Vec<String> = Vec::new();

    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            let tag = read_tag(&mut chars);

            // Comments and doctype
            if tag.starts_with('!') || tag.starts_with('?') {
                continue;
            }

            let tag_lower = tag.to_lowercase();
            let is_closing = tag_lower.starts_with('/');
            let tag_name = tag_lower
                .trim_start_matches('/')
                .split(|c: char| c.is_whitespace() || c == '/')
                .next()
                .unwrap_or("");

            if SKIP_TAGS.contains(&tag_name) {
                if is_closing {
                    if let Some(pos) = skip_elements.iter().rposition(|t| t == tag_name) {
                        skip_elements.truncate(pos);
                    }
                } else if !tag.ends_with('/') {
                    skip_elements.push(tag_name.to_string());
                }
                continue;
            }

            if !skip_elements.is_empty() {
                continue;
            }

            if tag_name == "pre" {
                if is_closing {
                    if let Some(pre) = preformatted.take() {
                        push_preformatted(&mut blocks, &pre);
                    }
                } else if preformatted.is_none() {
                    push_flowed(&mut blocks, &mut output);
                    preformatted = Some(String::new());
                }
                continue;
            }

            if let Some(pre) = preformatted.as_mut() {
                if tag_name == "br" {
                    pre.push('\n');
                }
                continue;
            }

            if PARAGRAPH_TAGS.contains(&tag_name) {
                output.push_str("\n\n");
            } else if LINE_TAGS.contains(&tag_name) {
                if tag_name == "br" || !output.ends_with('\n') {
                    output.push('\n');
                }
                if tag_name == "li" && !is_closing {
                    output.push_str("- ");
                }
            } else if matches!(tag_name, "td" | "th") && !is_closing {
                output.push(' ');
            }
        } else if skip_elements.is_empty() {
            let ch = decode_entity(c, &mut chars);
            match preformatted.as_mut() {
                Some(pre) => pre.push(ch),
                None => output.push(ch),
            }
        }
    }

    if let Some(pre) = preformatted {
        push_preformatted(&mut blocks, &pre);
    }
    push_flowed(&mut blocks, &mut output);

    blocks.join("\n\n")
}

/// Collapse pending flowed text into a block
fn push_flowed(blocks: &mut Vec<String>, output: &mut String) {
    let text = clean_whitespace(output);
    if !text.is_empty() {
        blocks.push(text);
    }
    output.clear();
}

/// Add preformatted text with only its surrounding blank lines removed
fn push_preformatted(blocks: &mut Vec<String>, pre: &str) {
    let text = pre.trim_start_matches(['\r', '\n']).trim_end();
    if !text.is_empty() {
        blocks.push(text.to_string());
    }
}

/// Read a tag body up to the closing `>`
///
/// Quoted attribute values may contain `>`. Comments run until `-->`.
fn read_tag(chars: &mut Peekable<Chars>) -> String {
    let mut tag = String::new();
    let mut quote: Option<char> = None;

    for next in chars.by_ref() {
        if tag.starts_with('!') {
            let comment = tag.starts_with("!--");
            if next == '>' && (!comment || tag.ends_with("--")) {
                break;
            }
            tag.push(next);
            continue;
        }
        match quote {
            Some(q) if next == q => quote = None,
            Some(_) => {}
            None if next == '"' || next == '\'' => quote = Some(next),
            None if next == '>' => break,
            None => {}
        }
        tag.push(next);
    }

    tag
}

/// Text of the first `<h1>` in a document, if any
fn first_heading(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(rel) = lower[search_from..].find("<h1") {
        let start = search_from + rel;
        // Reject tags such as <h10> or <h1x>
        let after = lower[start + 3..].chars().next();
        if matches!(after, Some(c) if c == '>' || c.is_whitespace()) {
            let open_end = start + lower[start..].find('>')? + 1;
            let close = open_end + lower[open_end..].find("</h1")?;
            let text = html_to_text(&html[open_end..close]);
            return if text.is_empty() { None } else { Some(text) };
        }
        search_from = start + 3;
    }

    None
}

/// Decode an HTML entity starting at `c`
///
/// The iterator is only advanced when a complete, known entity is found;
/// anything else leaves the ampersand as literal text.
fn decode_entity(c: char, chars: &mut Peekable<Chars>) -> char {
    if c != '&' {
        return c;
    }

    let mut lookahead = chars.clone();
    let mut entity = String::new();
    let mut terminated = false;
    for next in lookahead.by_ref() {
        if next == ';' {
            terminated = true;
            break;
        }
        if !(next.is_ascii_alphanumeric() || next == '#') || entity.len() > 10 {
            break;
        }
        entity.push(next);
    }

    if !terminated {
        return '&';
    }

    let decoded = match entity.as_str() {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        "hellip" => Some('…'),
        "laquo" => Some('«'),
        "raquo" => Some('»'),
        "lsquo" => Some('‘'),
        "rsquo" => Some('’'),
        "ldquo" => Some('“'),
        "rdquo" => Some('”'),
        "copy" => Some('©'),
        "reg" => Some('®'),
        _ => entity.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };

    match decoded {
        Some(ch) => {
            *chars = lookahead;
            ch
        }
        None => '&',
    }
}

/// Clean whitespace: collapse runs, trim, keep max 2 newlines
pub fn clean_whitespace(s: &str) -> String {
    let mut result = String::new();
    let mut last_was_space = false;
    let mut newline_count = 0;

    for c in s.chars() {
        if c == '\n' {
            if last_was_space && result.ends_with(' ') {
                result.pop();
            }
            newline_count += 1;
            last_was_space = true;
            if newline_count <= 2 {
                result.push(c);
            }
        } else if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            newline_count = 0;
            last_was_space = false;
            result.push(c);
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html_page(body: &str) -> RawPage {
        RawPage {
            status_code: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.to_string(),
        }
    }

    fn url() -> Url {
        Url::parse("https://example.com/article").unwrap()
    }

    #[test]
    fn test_is_html_by_content_type() {
        assert!(is_html(&Some("text/html".to_string()), ""));
        assert!(is_html(&Some("text/html; charset=utf-8".to_string()), ""));
        assert!(is_html(&Some("application/xhtml+xml".to_string()), ""));
        assert!(!is_html(&Some("text/plain".to_string()), ""));
        assert!(!is_html(&Some("application/json".to_string()), ""));
    }

    #[test]
    fn test_is_html_by_body() {
        assert!(is_html(&None, "<!DOCTYPE html><html>"));
        assert!(is_html(&None, "  <!doctype html>"));
        assert!(is_html(&None, "<html><body>"));
        assert!(!is_html(&None, "Hello world"));
        assert!(!is_html(&None, "{\"json\": true}"));
    }

    #[test]
    fn test_is_html_after_prolog() {
        assert!(is_html(&None, "\u{feff}<!DOCTYPE html><html>"));
        assert!(is_html(&None, "<!-- generated -->\n<!DOCTYPE html><html>"));
        assert!(is_html(&None, "<?xml version=\"1.0\"?>\n<html xmlns=\"x\">"));
        assert!(is_html(&None, "<!-- a --> <!-- b --><html>"));
        assert!(!is_html(&None, "<!-- unterminated <html>"));
        assert!(!is_html(&None, "<?xml version=\"1.0\"?><rss>"));
    }

    #[test]
    fn test_is_binary_content_type() {
        assert!(is_binary_content_type("image/png"));
        assert!(is_binary_content_type("application/pdf"));
        assert!(is_binary_content_type("Application/ZIP"));
        assert!(is_binary_content_type("font/woff2"));
        assert!(!is_binary_content_type("text/html"));
        assert!(!is_binary_content_type("application/json"));
    }

    #[test]
    fn test_html_to_text_paragraphs() {
        let text = html_to_text("<p>Hello</p><p>World</p>");
        assert_eq!(text, "Hello\n\nWorld");
    }

    #[test]
    fn test_html_to_text_lines_and_lists() {
        let text = html_to_text("<ul><li>One</li><li>Two</li></ul>after<br>line");
        assert!(text.contains("- One\n- Two"));
        assert!(text.contains("after\nline"));
    }

    #[test]
    fn test_html_to_text_keeps_preformatted_whitespace() {
        let html = "<p>Example:</p><pre><code>fn main() {\n    println!(&quot;hi&quot;);\n}\n</code></pre><p>Done   here</p>";
        assert_eq!(
            html_to_text(html),
            "Example:\n\nfn main() {\n    println!(\"hi\");\n}\n\nDone here"
        );
    }

    #[test]
    fn test_html_to_text_preformatted_line_breaks_and_unclosed() {
        assert_eq!(html_to_text("<pre>a<br>  b</pre>"), "a\n  b");
        assert_eq!(html_to_text("<p>x</p><pre>\n  indented"), "x\n\n  indented");
    }

    #[test]
    fn test_html_to_text_skips_script_style_and_head() {
        let html = "<html><head><title>T</title><style>p{}</style></head>\
                    <body><p>Before</p><script>alert('bad');</script><p>After</p></body></html>";
        let text = html_to_text(html);
        assert_eq!(text, "Before\n\nAfter");
    }

    #[test]
    fn test_html_to_text_ignores_comments_and_quoted_gt() {
        let html = "<!-- note --><p title=\"a > b\">Text</p>";
        assert_eq!(html_to_text(html), "Text");
    }

    #[test]
    fn test_entity_decoding() {
        let text = html_to_text("<p>&amp; &lt; &gt; &quot; &apos; &mdash; &#169; &#x263A;</p>");
        assert_eq!(text, "& < > \" ' — © ☺");
    }

    #[test]
    fn test_unknown_entity_kept_literally() {
        assert_eq!(html_to_text("<p>AT&T &bogus; &</p>"), "AT&T &bogus; &");
    }

    #[test]
    fn test_clean_whitespace() {
        let input = "  hello   world  \n\n\n\n  test  ";
        assert_eq!(clean_whitespace(input), "hello world\n\ntest");
    }

    #[test]
    fn test_first_heading() {
        assert_eq!(
            first_heading("<body><h1 class=\"x\">Main <b>Title</b></h1></body>"),
            Some("Main Title".to_string())
        );
        assert_eq!(first_heading("<h10>no</h10>"), None);
        assert_eq!(first_heading("<p>none</p>"), None);
    }

    #[test]
    fn test_extract_article() {
        let html = r#"<!DOCTYPE html>
<html>
<head><title>Rust Ownership</title></head>
<body>
  <div class="nav"><a href="/">Home</a> <a href="/about">About</a></div>
  <article>
    <p>Ownership is a set of rules that govern how a Rust program manages memory, and it is checked at compile time.</p>
    <p>Each value in Rust has an owner, there can only be one owner at a time, and the value is dropped when the owner goes out of scope.</p>
  </article>
  <script>track();</script>
</body>
</html>"#;

        let content = extract(&html_page(html), &url()).unwrap();
        assert_eq!(content.title, "Rust Ownership");
        assert!(content.text.contains("Ownership is a set of rules"));
        assert!(content.text.contains("Each value in Rust has an owner"));
        assert!(!content.text.contains("track()"));
    }

    #[test]
    fn test_extract_plain_text_bypasses_readability() {
        let page = RawPage {
            status_code: 200,
            content_type: Some("text/plain".to_string()),
            body: "line one\n\n\n\nline two".to_string(),
        };
        let content = extract(&page, &url()).unwrap();
        assert_eq!(content.title, "");
        assert_eq!(content.text, "line one\n\nline two");
    }

    #[test]
    fn test_extract_rejects_binary() {
        let page = RawPage {
            status_code: 200,
            content_type: Some("image/png".to_string()),
            body: "\u{89}PNG".to_string(),
        };
        let err = extract(&page, &url()).unwrap_err();
        assert!(matches!(err, PageError::UnsupportedContent(_)));
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_extract_without_paragraphs_keeps_whole_body() {
        let html = "<html><head><title>Short</title></head><body><span>Hi there</span></body></html>";
        let content = extract(&html_page(html), &url()).unwrap();
        assert_eq!(content.text, "Hi there");
    }

    #[test]
    fn test_extract_title_falls_back_to_heading() {
        let html = "<html><body><h1>Only Heading</h1><p>Some body text that is long enough, with commas, to be scored.</p></body></html>";
        let content = extract(&html_page(html), &url()).unwrap();
        assert_eq!(content.title, "Only Heading");
    }

    #[test]
    fn test_panicking_step_is_parse_error() {
        let err = contain_panic(|| -> Result<(), PageError> { panic!("malformed tree") })
            .unwrap_err();
        assert!(matches!(err, PageError::Parse(_)));
        assert_eq!(err.status(), 500);
        assert_eq!(
            err.to_string(),
            "Could not parse page content. Please try to fetch other pages."
        );

        assert_eq!(contain_panic(|| Ok(7)).unwrap(), 7);
        let err = contain_panic(|| -> Result<(), PageError> {
            Err(PageError::Parse("bad".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, PageError::Parse(_)));
    }

    #[test]
    fn test_extract_empty_document() {
        let content = extract(&html_page(""), &url()).unwrap();
        assert!(content.text.is_empty());
    }
}
