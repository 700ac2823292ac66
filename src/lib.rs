//! FDA 510(k) summary PDF crawler.
//!
//! Drives the FDA premarket-notification portal through a real browser
//! session, walks paginated search results, and extracts the decision
//! summary PDF text for each cleared device into a resumable JSONL stream.

pub mod browser;
pub mod cli;
pub mod config;
pub mod crawl;
pub mod error;
pub mod models;
pub mod output;
pub mod pdf;
pub mod utils;
