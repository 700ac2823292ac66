//! Resilient fetch and decode of a single PDF resource.

mod extractor;
mod retry;

pub use extractor::{looks_like_pdf, PdfTextExtractor};
pub use retry::retry_with_backoff;
