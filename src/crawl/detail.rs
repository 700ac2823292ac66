//! Per-result detail page processing.
//!
//! Each result gets its own short-lived tab so the listing tab's DOM and
//! scroll state survive untouched; the tab is closed on every exit path
//! before the next row starts.

use chromiumoxide::Page;
use regex::Regex;
use scraper::Html;
use tracing::{debug, info};

use crate::browser::{wait_for_element, BrowserSession};
use crate::config::CrawlConfig;
use crate::crawl::classify::{collect_links, LinkClassifier};
use crate::error::{CrawlError, Result};
use crate::models::{DetailRecord, PdfType, ResultRow};
use crate::pdf::PdfTextExtractor;
use crate::utils::jitter_sleep;

/// Processes one listing row into a finished record.
pub struct DetailPageProcessor {
    classifier: LinkClassifier,
    identifier_pattern: Regex,
    config: CrawlConfig,
}

impl DetailPageProcessor {
    pub fn new(config: &CrawlConfig) -> Self {
        Self {
            classifier: LinkClassifier::standard(),
            // The portal's submission numbers: one letter, six digits
            identifier_pattern: Regex::new(r"\b[A-Z]\d{6}\b").expect("static identifier pattern"),
            config: config.clone(),
        }
    }

    /// Open the row's detail page in an isolated tab, pick the best PDF,
    /// extract its text, and recover the authoritative identifier.
    ///
    /// The tab is always closed and focus handed back to the listing,
    /// whatever happens inside.
    pub async fn process(&self, session: &BrowserSession, row: &ResultRow) -> Result<DetailRecord> {
        let tab = session
            .open_tab(&row.detail_link)
            .await
            .map_err(|e| row_error(row, e))?;

        let outcome = self.process_in_tab(session, &tab, row).await;
        session.close_tab(tab).await;
        outcome.map_err(|e| row_error(row, e))
    }

    async fn process_in_tab(
        &self,
        session: &BrowserSession,
        tab: &Page,
        row: &ResultRow,
    ) -> Result<DetailRecord> {
        wait_for_element(tab, "body", self.config.ui_timeout()).await?;
        jitter_sleep(0.6, 1.2).await;

        let detail_url = tab
            .url()
            .await?
            .unwrap_or_else(|| row.detail_link.clone());
        let html = tab.content().await?;

        // The listing's first column is unreliable; the detail page body
        // carries the authoritative identifier.
        let corrected = self.recover_identifier(&html);
        if let Some(ref id) = corrected {
            if *id != row.identifier {
                debug!("Corrected identifier '{}' -> '{}'", row.identifier, id);
            }
        }

        let links = collect_links(&html, &detail_url);
        let Some((pdf_url, pdf_type)) = self.classifier.select(&links) else {
            info!("No qualifying PDF link for {}", row.identifier);
            return Ok(DetailRecord::from_row(row, corrected, None, None, PdfType::None));
        };

        let extractor = PdfTextExtractor::new(&session.cookies().await, self.config.fetch_timeout());
        let summary_text = extractor.extract(&pdf_url, Some(&detail_url)).await;

        Ok(DetailRecord::from_row(
            row,
            corrected,
            Some(pdf_url),
            summary_text,
            pdf_type,
        ))
    }

    /// Scan the rendered page text for a submission number.
    fn recover_identifier(&self, html: &str) -> Option<String> {
        let text: String = Html::parse_document(html).root_element().text().collect();
        self.identifier_pattern
            .find(&text)
            .map(|m| m.as_str().to_string())
    }
}

fn row_error(row: &ResultRow, e: CrawlError) -> CrawlError {
    CrawlError::RowProcess {
        identifier: row.identifier.clone(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> DetailPageProcessor {
        DetailPageProcessor::new(&CrawlConfig::for_query("implant", None))
    }

    #[test]
    fn recovers_identifier_from_page_body() {
        let html = r#"
            <html><body>
              <h1>510(k) Premarket Notification</h1>
              <p>Device: Spinal Implant</p>
              <p>510(k) Number: K240123</p>
            </body></html>
        "#;
        assert_eq!(processor().recover_identifier(html), Some("K240123".to_string()));
    }

    #[test]
    fn identifier_needs_exactly_six_digits() {
        assert_eq!(processor().recover_identifier("<body>K12345</body>"), None);
        assert_eq!(processor().recover_identifier("<body>K1234567</body>"), None);
        assert_eq!(
            processor().recover_identifier("<body>DEN240001 and P240001</body>"),
            Some("P240001".to_string())
        );
    }

    #[test]
    fn no_identifier_in_page_keeps_listing_value() {
        assert_eq!(processor().recover_identifier("<body>nothing here</body>"), None);
    }
}
