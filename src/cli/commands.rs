//! CLI commands implementation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use crate::config::CrawlConfig;
use crate::crawl::Crawler;

#[derive(Parser)]
#[command(name = "fda510k")]
#[command(about = "FDA 510(k) summary PDF crawler and text extractor")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl search results and extract summary PDF text to JSONL
    Crawl {
        /// Device-name search term
        #[arg(short, long, default_value = "implant", env = "FDA510K_QUERY")]
        query: String,

        /// Maximum number of listing pages to visit (0 = unbounded)
        #[arg(short, long, default_value = "0")]
        max_pages: u32,

        /// Output path (default: fda_<query>.jsonl)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Run the browser headless
        #[arg(long)]
        headless: bool,

        /// Ignore identifiers already present in the output file
        #[arg(long)]
        no_resume: bool,

        /// Minimum delay between detail-row operations, in seconds
        #[arg(long, default_value = "0.8")]
        throttle: f64,
    },
}

/// Parse arguments and dispatch.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            query,
            max_pages,
            out,
            headless,
            no_resume,
            throttle,
        } => {
            let mut config = CrawlConfig::for_query(&query, out);
            config.max_pages = max_pages;
            config.headless = headless;
            config.resume = !no_resume;
            config.throttle = throttle;
            crawl(config).await
        }
    }
}

async fn crawl(config: CrawlConfig) -> anyhow::Result<()> {
    let out_path = config.out_path.clone();
    println!(
        "{} Crawling 510(k) results for '{}' (max pages: {})",
        style("→").cyan(),
        config.query,
        if config.max_pages == 0 {
            "unbounded".to_string()
        } else {
            config.max_pages.to_string()
        }
    );

    let summary = Crawler::new(config)?.run().await?;

    println!(
        "{} Done: {} records written to {} ({} pages, {} already present, {} rows failed)",
        style("✓").green(),
        summary.written,
        out_path.display(),
        summary.pages_visited,
        summary.skipped_seen,
        summary.failed_rows
    );
    Ok(())
}
