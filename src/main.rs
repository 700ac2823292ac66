//! fda510k - FDA 510(k) summary PDF crawler.
//!
//! Searches the FDA 510(k) premarket-notification portal, follows each
//! result to its detail page, and extracts the decision summary PDF text
//! into a resumable line-delimited JSON stream.

use fda510k::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "fda510k=info"
    } else {
        "fda510k=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
