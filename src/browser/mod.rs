//! Browser session driving the portal over CDP.
//!
//! One Chrome instance and one listing tab serve the whole crawl; detail
//! pages get their own short-lived tab so the listing's DOM and scroll
//! state are never disturbed. All DOM and network interaction goes through
//! this handle, strictly sequentially.

mod session;
mod types;

pub use session::{wait_for_element, BrowserSession};
pub use types::SessionCookie;
