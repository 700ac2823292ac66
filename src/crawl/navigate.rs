//! Search submission and initial listing setup.

use std::time::Duration;

use tracing::{info, warn};

use crate::browser::BrowserSession;
use crate::config::{CrawlConfig, PORTAL_URL};
use crate::error::{CrawlError, Result};

/// Bounded wait for the search form on first load. The portal is slow on
/// cold hits, so this is longer than the per-element wait used later.
const SEARCH_BOX_WAIT: Duration = Duration::from_secs(20);

const SEARCH_INPUT: &str = "input[name='DeviceName']";
const SEARCH_BUTTON: &str = "input[value='Search']";

/// Injected script that hunts for a results-per-page dropdown and raises it
/// to the biggest option. Matches by option value first, then by common
/// page/results naming. Returns whether anything was changed.
const MAX_PAGE_SIZE_SCRIPT: &str = r#"(() => {
    const selects = [...document.querySelectorAll('select')];
    const candidates = selects.filter(s => {
        const id = ((s.name || '') + ' ' + (s.id || '')).toLowerCase();
        const hasBig = [...s.options].some(o => o.text.trim() === '500' || o.value === '500');
        return hasBig || id.includes('page') || id.includes('results');
    });
    for (const select of candidates) {
        const big = [...select.options].find(o => o.text.trim() === '500' || o.value === '500');
        if (!big || select.value === big.value) continue;
        select.value = big.value;
        select.dispatchEvent(new Event('change', { bubbles: true }));
        return true;
    }
    return false;
})()"#;

/// Drives the portal from cold start to the first listing page.
pub struct NavigationController<'a> {
    config: &'a CrawlConfig,
}

impl<'a> NavigationController<'a> {
    pub fn new(config: &'a CrawlConfig) -> Self {
        Self { config }
    }

    /// Submit the search query and land on listing page 1.
    ///
    /// The only fatal failure in the whole pipeline: if the search input
    /// never shows up there is nothing to crawl.
    pub async fn initialize(&self, session: &BrowserSession) -> Result<()> {
        session.goto(PORTAL_URL).await.map_err(fatal)?;

        session
            .wait_for_selector(SEARCH_INPUT, SEARCH_BOX_WAIT)
            .await
            .map_err(fatal)?;

        info!("Submitting search for '{}'", self.config.query);
        // Clear any sticky value before typing
        session
            .evaluate_bool(&format!(
                "(() => {{ const i = document.querySelector(\"{SEARCH_INPUT}\"); \
                 if (i) i.value = ''; return true; }})()"
            ))
            .await;
        session
            .type_into(SEARCH_INPUT, &self.config.query)
            .await
            .map_err(fatal)?;
        session.click(SEARCH_BUTTON).await.map_err(fatal)?;

        // Let the first results page render
        tokio::time::sleep(Duration::from_millis(2500)).await;

        self.maximize_page_size(session).await;
        Ok(())
    }

    /// Best-effort: raise results-per-page to the maximum the portal
    /// offers. Fewer page transitions means fewer pagination hazards, but
    /// the crawl works at any page size, so failure here is only logged.
    async fn maximize_page_size(&self, session: &BrowserSession) {
        if session.evaluate_bool(MAX_PAGE_SIZE_SCRIPT).await {
            info!("Raised results-per-page to maximum");
            tokio::time::sleep(Duration::from_secs(3)).await;
            if let Err(e) = session
                .wait_for_selector("table", self.config.ui_timeout())
                .await
            {
                warn!("Listing did not re-render after page-size change: {}", e);
            }
        } else {
            info!("No results-per-page control found; keeping default page size");
        }
    }
}

/// Promote a navigation failure to the fatal setup error.
fn fatal(e: CrawlError) -> CrawlError {
    match e {
        CrawlError::Navigation(msg) => CrawlError::Setup(msg),
        other => other,
    }
}
