use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use whistle_docs_mcp::config::DocsConfig;
use whistle_docs_mcp::docs_cache::DocsCache;
use whistle_docs_mcp::server;

#[derive(Parser, Debug)]
#[command(version, about = "Whistle Documentation MCP Server")]
struct Cli {
    /// Type of server to run
    #[arg(short, long, value_enum, default_value_t = ServerType::Stdio)]
    server_type: ServerType,

    /// Address for the SSE server
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    address: String,

    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Documentation site to crawl
    #[arg(long)]
    base_url: Option<String>,

    /// Directory for cached sections
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Seconds before the cached documentation is re-crawled
    #[arg(long)]
    ttl_secs: Option<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ServerType {
    /// Start an SSE server
    Sse,
    /// Start a stdio server
    Stdio,
}

impl Cli {
    fn docs_config(&self) -> Result<DocsConfig> {
        let mut config = match &self.config {
            Some(path) => DocsConfig::from_file(path)?,
            None => DocsConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        if let Some(ttl_secs) = self.ttl_secs {
            config.ttl_secs = ttl_secs;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.docs_config()?;
    let cache = Arc::new(
        DocsCache::from_config(&config).context("Invalid documentation settings")?,
    );

    match cli.server_type {
        ServerType::Sse => {
            server::start_sse_server(&cli.address, cache).await?;
        },
        ServerType::Stdio => {
            server::start_stdio_server(cache).await?;
        },
    }

    Ok(())
}
