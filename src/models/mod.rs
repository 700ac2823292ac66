//! Data model for crawl results and in-flight state.

mod record;
mod state;

pub use record::{DetailRecord, PdfType, ResultRow};
pub use state::{CrawlState, PageOutcome, PageSignature};
