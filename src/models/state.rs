//! Crawl state and page fingerprints.
//!
//! `CrawlState` holds the process-lifetime view of the run: the identifiers
//! already written, the current page index, and the empty-page counter. Its
//! only durable projection is the set of identifiers in the output file,
//! rebuilt at startup by the writer - the state itself is never serialized.

use std::collections::HashSet;

use crate::models::ResultRow;

/// Lightweight fingerprint of a listing page, used solely to detect whether
/// a pagination attempt actually changed the content underneath us.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageSignature(String);

/// Device-name prefix length that goes into the signature.
const SIGNATURE_LABEL_LEN: usize = 50;

impl PageSignature {
    /// Fingerprint a page from its collected rows: first row's identifier
    /// plus a truncated device name. An empty page has an empty signature.
    pub fn of(rows: &[ResultRow]) -> Self {
        match rows.first() {
            Some(first) => {
                let label: String = first.device_name.chars().take(SIGNATURE_LABEL_LEN).collect();
                Self(format!("{}||{}", first.identifier, label))
            }
            None => Self(String::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for PageSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to do after recording a page's row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Keep going: process rows (if any) and paginate.
    Continue,
    /// Too many consecutive empty pages - the crawl is done.
    EmptyLimitReached,
}

/// Mutable state for one crawl run.
#[derive(Debug)]
pub struct CrawlState {
    seen: HashSet<String>,
    page: u32,
    consecutive_empty: u32,
    written: usize,
    empty_page_limit: u32,
}

impl CrawlState {
    /// Start a run at page 1 with the seen set rebuilt from a prior output
    /// file (empty when resume is disabled).
    pub fn new(seen: HashSet<String>, empty_page_limit: u32) -> Self {
        Self {
            seen,
            page: 1,
            consecutive_empty: 0,
            written: 0,
            empty_page_limit,
        }
    }

    /// Record a scanned page's row count and decide whether to continue.
    /// Any non-empty page resets the empty-page counter.
    pub fn record_page(&mut self, row_count: usize) -> PageOutcome {
        if row_count == 0 {
            self.consecutive_empty += 1;
            if self.consecutive_empty >= self.empty_page_limit {
                return PageOutcome::EmptyLimitReached;
            }
        } else {
            self.consecutive_empty = 0;
        }
        PageOutcome::Continue
    }

    /// Advance to the next page index. Never decreases.
    pub fn advance_page(&mut self) {
        self.page += 1;
    }

    /// True when the identifier was already written in this or a prior run.
    pub fn already_seen(&self, identifier: &str) -> bool {
        self.seen.contains(identifier)
    }

    /// Mark an identifier as written. Both the listing identifier and the
    /// corrected one are recorded so a resumed run skips the row under
    /// either name.
    pub fn mark_written(&mut self, listing_identifier: &str, written_identifier: &str) {
        self.seen.insert(listing_identifier.to_string());
        if written_identifier != listing_identifier {
            self.seen.insert(written_identifier.to_string());
        }
        self.written += 1;
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn consecutive_empty(&self) -> u32 {
        self.consecutive_empty
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, name: &str) -> ResultRow {
        ResultRow {
            identifier: id.to_string(),
            device_name: name.to_string(),
            applicant: "Acme".to_string(),
            decision_date: "01/01/2024".to_string(),
            detail_link: format!("https://example.test/pmn.cfm?ID={id}"),
        }
    }

    #[test]
    fn three_consecutive_empty_pages_end_the_crawl() {
        let mut state = CrawlState::new(HashSet::new(), 3);
        assert_eq!(state.record_page(0), PageOutcome::Continue);
        assert_eq!(state.record_page(0), PageOutcome::Continue);
        assert_eq!(state.record_page(0), PageOutcome::EmptyLimitReached);
    }

    #[test]
    fn non_empty_page_resets_the_empty_counter() {
        let mut state = CrawlState::new(HashSet::new(), 3);
        state.record_page(0);
        state.record_page(0);
        assert_eq!(state.record_page(12), PageOutcome::Continue);
        assert_eq!(state.consecutive_empty(), 0);
        // A fresh streak has to start over
        state.record_page(0);
        state.record_page(0);
        assert_eq!(state.record_page(0), PageOutcome::EmptyLimitReached);
    }

    #[test]
    fn marks_both_listing_and_corrected_identifiers() {
        let mut state = CrawlState::new(HashSet::new(), 3);
        state.mark_written("IMPLANT DEVICE", "K240001");
        assert!(state.already_seen("IMPLANT DEVICE"));
        assert!(state.already_seen("K240001"));
        assert_eq!(state.written(), 1);
    }

    #[test]
    fn signature_changes_with_first_row() {
        let a = PageSignature::of(&[row("K1", "Device A")]);
        let b = PageSignature::of(&[row("K2", "Device A")]);
        let a2 = PageSignature::of(&[row("K1", "Device A"), row("K9", "Other")]);
        assert_ne!(a, b);
        assert_eq!(a, a2);
    }

    #[test]
    fn signature_truncates_long_device_names() {
        let long = "X".repeat(200);
        let sig = PageSignature::of(&[row("K1", &long)]);
        assert!(sig.to_string().len() <= "K1||".len() + 50);
    }

    #[test]
    fn empty_page_has_empty_signature() {
        assert!(PageSignature::of(&[]).is_empty());
    }
}
