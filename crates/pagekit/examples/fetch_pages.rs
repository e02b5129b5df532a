//! Example: Walk the pages of a URL the way an agent would
//!
//! Run with: cargo run -p pagekit --example fetch_pages -- <url> [chunk_size]
//!
//! Requests page 0, then keeps requesting the next page while `has_next`
//! is true, stopping at the first non-200 status.

use pagekit::{PageRequest, PageResult, Tool, DEFAULT_CHUNK_SIZE};

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "https://en.wikipedia.org/wiki/Rust_(programming_language)".to_string());
    let chunk_size = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_CHUNK_SIZE);

    let tool = match Tool::builder().chunk_size(chunk_size).build() {
        Ok(tool) => tool,
        Err(e) => {
            eprintln!("Failed to build tool: {}", e);
            std::process::exit(1);
        }
    };

    println!("PageKit paging example");
    println!("======================\n");
    println!("URL: {}", url);
    println!("Chunk size: {} tokens\n", chunk_size);

    let mut page_num = 0;
    loop {
        let result = tool
            .execute(PageRequest::new(&url).page_num(page_num))
            .await;
        print_page(page_num, &result);

        if result.has_next() != Some(true) {
            break;
        }
        page_num += 1;
    }
}

fn print_page(page_num: i64, result: &PageResult) {
    println!("Page {} -> status {}", page_num, result.status);

    if let Some(content) = result.content() {
        let preview = content.chars().take(100).collect::<String>();
        let preview = preview.replace('\n', " ");
        println!(
            "   Preview: {}{}",
            preview,
            if content.chars().count() > 100 { "..." } else { "" }
        );
        println!("   Has next: {:?}", result.has_next());
    }

    if let Some(error) = result.error_message() {
        println!("   Error: {}", error);
    }

    println!();
}
