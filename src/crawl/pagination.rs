//! Pagination advance strategies.
//!
//! The portal exposes no stable pagination API and no total-count guarantee,
//! so advancing is a chain of named strategies tried in strict priority
//! order. Each strategy only issues a navigation; acceptance is decided
//! afterwards by comparing page signatures and requiring at least one row.
//! Exhausting the chain is the terminal condition of the crawl, not an
//! error - silent repetition is the only end-of-results signal the site has.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::BrowserSession;
use crate::crawl::classify::{collect_links, LinkCandidate};
use crate::crawl::rows::collect_rows;
use crate::error::Result;
use crate::models::{PageSignature, ResultRow};

/// Delay after a navigation before re-reading the listing, letting the
/// server-rendered table settle.
const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Bounded wait for the listing table after a navigation.
const TABLE_WAIT: Duration = Duration::from_secs(15);

/// Snapshot of the listing tab a strategy works from.
pub struct PageProbe {
    pub url: String,
    pub html: String,
}

/// Result of one pagination round.
pub struct Advance {
    pub advanced: bool,
    /// Rows of the new page when `advanced`, so the caller doesn't rescan.
    pub rows: Vec<ResultRow>,
}

/// One way of getting to the next listing page.
#[async_trait]
pub trait AdvanceStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Try to issue a navigation toward the next page. `Ok(false)` means
    /// the strategy does not apply to this page; errors are absorbed by the
    /// caller and the next strategy gets its turn.
    async fn attempt(&self, session: &BrowserSession, probe: &PageProbe) -> Result<bool>;
}

/// Strategy 1: follow the explicit next-page affordance (`>` arrow or a
/// "Next" link). A real href is navigated directly - more reliable than a
/// simulated click - with a JS click as the fallback.
pub struct NextControlStrategy;

/// Find the next-control href among a page's anchors, if it carries one.
fn find_next_control(links: &[LinkCandidate]) -> Option<&LinkCandidate> {
    links.iter().find(|l| {
        let text = l.text.trim();
        text == ">" || text.eq_ignore_ascii_case("next")
    })
}

#[async_trait]
impl AdvanceStrategy for NextControlStrategy {
    fn name(&self) -> &'static str {
        "next-control"
    }

    async fn attempt(&self, session: &BrowserSession, probe: &PageProbe) -> Result<bool> {
        let links = collect_links(&probe.html, &probe.url);
        let Some(control) = find_next_control(&links) else {
            return Ok(false);
        };

        if control.href.starts_with("http") {
            debug!("Following next control href: {}", control.href);
            session.goto(&control.href).await?;
            return Ok(true);
        }

        // No usable href (javascript: or empty) - click it instead
        debug!("Clicking next control");
        let clicked = session
            .evaluate_bool(
                r#"(() => {
                    const a = [...document.querySelectorAll('a')]
                        .find(x => x.textContent.trim() === '>'
                                || x.textContent.trim().toLowerCase() === 'next');
                    if (a) { a.click(); return true; }
                    return false;
                })()"#,
            )
            .await;
        Ok(clicked)
    }
}

/// Strategy 2: follow the page-number link whose offset is one step past
/// the current one.
pub struct PageNumberStrategy {
    pub step: u32,
}

#[async_trait]
impl AdvanceStrategy for PageNumberStrategy {
    fn name(&self) -> &'static str {
        "page-number-link"
    }

    async fn attempt(&self, session: &BrowserSession, probe: &PageProbe) -> Result<bool> {
        let next = page_offset(&probe.url).unwrap_or(1) + self.step;
        let marker = format!("PAGENUM={next}");

        let links = collect_links(&probe.html, &probe.url);
        let Some(target) = links.iter().find(|l| l.href.contains(&marker)) else {
            return Ok(false);
        };

        debug!("Following page-number link: {}", target.href);
        session.goto(&target.href).await?;
        Ok(true)
    }
}

/// Strategy 3: reconstruct the next-page URL from the current one by
/// bumping the pagination offset query parameter.
pub struct OffsetUrlStrategy {
    pub step: u32,
}

#[async_trait]
impl AdvanceStrategy for OffsetUrlStrategy {
    fn name(&self) -> &'static str {
        "offset-url"
    }

    async fn attempt(&self, session: &BrowserSession, probe: &PageProbe) -> Result<bool> {
        let Some(next_url) = next_offset_url(&probe.url, self.step) else {
            return Ok(false);
        };
        debug!("Navigating to reconstructed URL: {}", next_url);
        session.goto(&next_url).await?;
        Ok(true)
    }
}

/// Read the pagination offset from a listing URL. The portal uses
/// `PAGENUM`; `start` shows up on some mirrored endpoints.
pub fn page_offset(url: &str) -> Option<u32> {
    let parsed = Url::parse(url).ok()?;
    for (key, value) in parsed.query_pairs() {
        if key == "PAGENUM" || key == "start" {
            return value.parse().ok();
        }
    }
    None
}

/// Rebuild a listing URL with its offset bumped by `step`. When the URL
/// carries no pagination parameter at all this guesses `PAGENUM=1+step`
/// (the first step past page one) - a best-effort heuristic only; the
/// signature check afterwards decides whether it actually worked.
pub fn next_offset_url(url: &str, step: u32) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut bumped = false;
    for (key, value) in pairs.iter_mut() {
        if key == "PAGENUM" || key == "start" {
            let current: u32 = value.parse().ok()?;
            *value = (current + step).to_string();
            bumped = true;
            break;
        }
    }
    if !bumped {
        pairs.push(("PAGENUM".to_string(), (1 + step).to_string()));
    }

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Some(parsed.to_string())
}

/// A pagination attempt counts only if the page content actually changed
/// and the new page has rows.
pub fn accept_advance(before: &PageSignature, after: &PageSignature, row_count: usize) -> bool {
    after != before && row_count > 0
}

/// Ordered strategy chain with post-navigation verification.
pub struct Paginator {
    strategies: Vec<Box<dyn AdvanceStrategy>>,
}

impl Paginator {
    pub fn new(step: u32) -> Self {
        Self {
            strategies: vec![
                Box::new(NextControlStrategy),
                Box::new(PageNumberStrategy { step }),
                Box::new(OffsetUrlStrategy { step }),
            ],
        }
    }

    /// Try each strategy in order until one produces a verified new page.
    /// Navigation errors are logged and absorbed; they just hand the turn
    /// to the next strategy.
    pub async fn advance(&self, session: &BrowserSession, before: &PageSignature) -> Advance {
        for strategy in &self.strategies {
            let probe = match self.probe(session).await {
                Ok(p) => p,
                Err(e) => {
                    warn!("Could not snapshot listing page: {}", e);
                    break;
                }
            };

            match strategy.attempt(session, &probe).await {
                Ok(false) => {
                    debug!("Strategy '{}' not applicable", strategy.name());
                    continue;
                }
                Err(e) => {
                    warn!("Strategy '{}' failed: {}", strategy.name(), e);
                    continue;
                }
                Ok(true) => {}
            }

            if let Err(e) = session.wait_for_selector("table", TABLE_WAIT).await {
                debug!("No table after '{}': {}", strategy.name(), e);
            }
            tokio::time::sleep(SETTLE_DELAY).await;

            let (url, html) = match (session.current_url().await, session.content().await) {
                (Ok(u), Ok(h)) => (u, h),
                _ => continue,
            };
            let rows = collect_rows(&html, &url);
            let after = PageSignature::of(&rows);

            if accept_advance(before, &after, rows.len()) {
                info!("Advanced via '{}' ({} rows)", strategy.name(), rows.len());
                return Advance {
                    advanced: true,
                    rows,
                };
            }
            debug!(
                "Strategy '{}' navigated but signature unchanged or page empty",
                strategy.name()
            );
        }

        Advance {
            advanced: false,
            rows: Vec::new(),
        }
    }

    async fn probe(&self, session: &BrowserSession) -> Result<PageProbe> {
        Ok(PageProbe {
            url: session.current_url().await?,
            html: session.content().await?,
        })
    }
}
