//! PageKit MCP server - exposes the `fetch_page` tool to agents over stdio

mod mcp;

use clap::Parser;
use pagekit::{Tool, DEFAULT_CHUNK_SIZE, TOOL_LLMTXT};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// PageKit - paginated web page reading for LLM agents (MCP over stdio)
#[derive(Parser, Debug)]
#[command(name = "pagekit-mcp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Custom User-Agent
    #[arg(long)]
    user_agent: Option<String>,

    /// Maximum tokens per page
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Print full tool documentation (llmtxt) and exit
    #[arg(long)]
    llmtxt: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.llmtxt {
        writeln_safe(TOOL_LLMTXT);
        std::process::exit(0);
    }

    // stdout carries JSON-RPC; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut builder = Tool::builder().chunk_size(cli.chunk_size);
    if let Some(ua) = cli.user_agent {
        builder = builder.user_agent(ua);
    }

    let tool = match builder.build() {
        Ok(tool) => tool,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = mcp::run_server(tool).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["pagekit-mcp"]);
        assert_eq!(cli.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(cli.user_agent.is_none());
        assert!(!cli.llmtxt);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "pagekit-mcp",
            "--user-agent",
            "TestAgent/1.0",
            "--chunk-size",
            "500",
            "--llmtxt",
        ]);
        assert_eq!(cli.user_agent.as_deref(), Some("TestAgent/1.0"));
        assert_eq!(cli.chunk_size, 500);
        assert!(cli.llmtxt);
    }
}
