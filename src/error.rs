//! Error taxonomy for the crawl pipeline.
//!
//! Only [`CrawlError::Setup`] aborts a run. Everything else is contained at
//! the page, row, or fetch level and surfaces as a skipped row or a record
//! with null summary fields.

use thiserror::Error;

/// Errors raised while driving the portal.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The search interface never appeared. Fatal - nothing can proceed
    /// without a submitted query.
    #[error("search interface not available: {0}")]
    Setup(String),

    /// A page transition failed. Absorbed by trying the next pagination
    /// strategy.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A listing row did not have the expected cell structure. The row is
    /// skipped and the page scan continues.
    #[error("malformed listing row: {0}")]
    RowParse(String),

    /// A detail page could not be processed (timeout, tab failure). The row
    /// is skipped and the crawl continues.
    #[error("detail page processing failed for {identifier}: {reason}")]
    RowProcess { identifier: String, reason: String },

    /// Browser session plumbing failed (launch, CDP call).
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// Writing a record to the output stream failed.
    #[error("output write failed: {0}")]
    Output(#[from] std::io::Error),
}

/// Errors raised while fetching and decoding a single PDF resource.
///
/// These never escape the extractor: transient kinds are retried with
/// backoff and everything degrades to a null `summary_text`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transient network failure - retried.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response decoded but the PDF parser rejected it - retried, since
    /// truncated transfers look the same as garbage.
    #[error("PDF parse error: {0}")]
    Parse(String),
}

pub type Result<T, E = CrawlError> = std::result::Result<T, E>;
