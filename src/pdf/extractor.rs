//! PDF fetch, validation, and text extraction.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::browser::SessionCookie;
use crate::config::USER_AGENT;
use crate::error::FetchError;
use crate::pdf::retry_with_backoff;
use crate::utils::jitter_sleep;

/// Final-URL fragments that mean the portal served a block/interstitial
/// page instead of the document. Not worth retrying.
const BLOCK_URL_PATTERNS: &[&str] = &["apology_objects"];

/// Backoff parameters for transient fetch failures.
const FETCH_TRIES: u32 = 3;
const BACKOFF_BASE: f64 = 1.2;

/// Decide whether a response is plausibly a PDF from three independent
/// signals; any single positive accepts. The body itself is judged later
/// by the parser.
pub fn looks_like_pdf(final_url: &str, content_type: &str, disposition: &str) -> bool {
    final_url.to_lowercase().ends_with(".pdf")
        || content_type.to_lowercase().contains("application/pdf")
        || disposition.to_lowercase().contains(".pdf")
}

/// Parse text out of PDF bytes. `Ok(None)` means a valid but textless
/// document; parser rejections are transient (truncated transfers and
/// garbage look identical) and bubble up for retry.
fn extract_text(bytes: &[u8]) -> Result<Option<String>, FetchError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| FetchError::Parse(e.to_string()))?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_string()))
}

/// Fetches one PDF over plain HTTP, reusing the browser session's cookies
/// and user agent so the portal sees one continuous visitor.
pub struct PdfTextExtractor {
    client: Client,
}

impl PdfTextExtractor {
    /// Build a client carrying the browser session's cookies.
    pub fn new(cookies: &[SessionCookie], timeout: Duration) -> Self {
        let jar = Jar::default();
        for cookie in cookies {
            let host = cookie.domain.trim_start_matches('.');
            if let Ok(url) = format!("https://{host}/").parse() {
                jar.add_cookie_str(&cookie.as_cookie_str(), &url);
            }
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::new(jar))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch `url` and return its text, or `None` when the document is
    /// blocked, not a PDF, empty, or still failing after the retry budget.
    /// Never an error: a lost PDF costs one null field, not the row.
    pub async fn extract(&self, url: &str, referer: Option<&str>) -> Option<String> {
        let client = self.client.clone();
        let url_owned = url.to_string();
        let referer_owned = referer.map(|r| r.to_string());

        let outcome = retry_with_backoff(FETCH_TRIES, BACKOFF_BASE, move |attempt| {
            let client = client.clone();
            let url = url_owned.clone();
            let referer = referer_owned.clone();
            async move { fetch_once(&client, &url, referer.as_deref(), attempt).await }
        })
        .await;

        match outcome {
            Ok(Some(text)) => {
                // Politeness delay after touching the origin
                jitter_sleep(1.0, 1.8).await;
                Some(text)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("PDF extraction gave up on {}: {}", url, e);
                None
            }
        }
    }
}

/// One fetch attempt. `Ok(None)` short-circuits the retry loop (blocked,
/// not a PDF, no text); `Err` marks a transient failure worth retrying.
async fn fetch_once(
    client: &Client,
    url: &str,
    referer: Option<&str>,
    attempt: u32,
) -> Result<Option<String>, FetchError> {
    debug!("Fetching PDF (attempt {}): {}", attempt, url);

    let mut request = client.get(url);
    if let Some(referer) = referer {
        request = request.header(reqwest::header::REFERER, referer);
    }
    let response = request.send().await?;

    let final_url = response.url().to_string();
    let lowered = final_url.to_lowercase();
    if BLOCK_URL_PATTERNS.iter().any(|p| lowered.contains(p)) {
        info!("Blocked/interstitial page for {}", final_url);
        return Ok(None);
    }

    let header = |name: reqwest::header::HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let content_type = header(reqwest::header::CONTENT_TYPE);
    let disposition = header(reqwest::header::CONTENT_DISPOSITION);

    if !looks_like_pdf(&final_url, &content_type, &disposition) {
        info!("Not a PDF: {} (Content-Type: {})", final_url, content_type);
        return Ok(None);
    }

    let bytes = response.bytes().await?;
    extract_text(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_single_signal_accepts() {
        assert!(looks_like_pdf("https://x.test/K1.pdf", "", ""));
        assert!(looks_like_pdf("https://x.test/doc", "application/pdf", ""));
        assert!(looks_like_pdf(
            "https://x.test/doc",
            "application/octet-stream",
            "attachment; filename=K1.pdf"
        ));
    }

    #[test]
    fn no_signal_rejects() {
        assert!(!looks_like_pdf("https://x.test/doc", "text/html", "inline"));
        assert!(!looks_like_pdf("https://x.test/page.cfm", "", ""));
    }

    #[test]
    fn signals_are_case_insensitive() {
        assert!(looks_like_pdf("https://x.test/K1.PDF", "", ""));
        assert!(looks_like_pdf("https://x.test/doc", "Application/PDF", ""));
    }

    #[test]
    fn html_bytes_fail_parsing_even_with_a_pdf_url() {
        // A .pdf URL serving text/html passes the URL signal but the body
        // is rejected by the parser, so no text ever comes out of it.
        let result = extract_text(b"<html><body>Access denied</body></html>");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn block_pattern_matches_apology_redirect() {
        let url = "https://www.fda.gov/apology_objects/unavailable.html".to_lowercase();
        assert!(BLOCK_URL_PATTERNS.iter().any(|p| url.contains(p)));
    }
}
