//! Chrome session lifecycle and page plumbing.

use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::network::{
    GetCookiesParams, SetUserAgentOverrideParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::config::USER_AGENT;
use crate::error::{CrawlError, Result};

/// Poll interval while waiting for an element to appear.
const WAIT_POLL: Duration = Duration::from_millis(250);

/// Wait for `selector` to appear on a page, polling up to `timeout`. CDP
/// has no built-in presence wait, so this retries `find_element` the way
/// Selenium's explicit waits do.
pub async fn wait_for_element(page: &Page, selector: &str, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if page.find_element(selector).await.is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(CrawlError::Navigation(format!(
                "timed out after {}s waiting for '{selector}'",
                timeout.as_secs()
            )));
        }
        tokio::time::sleep(WAIT_POLL).await;
    }
}

/// Single browser session: one Chrome process, one long-lived listing tab.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
}

impl BrowserSession {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Find a Chrome executable on this machine.
    fn find_chrome() -> Result<std::path::PathBuf> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(CrawlError::Setup(
            "Chrome/Chromium not found; install it or put it on PATH".to_string(),
        ))
    }

    /// Launch Chrome and open the listing tab.
    pub async fn launch(headless: bool) -> Result<Self> {
        info!("Launching browser (headless={})", headless);

        let chrome_path = Self::find_chrome()?;
        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // with_head means NOT headless, confusingly
        if !headless {
            builder = builder.with_head();
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--no-sandbox") // Often needed for headless in containers
            .arg("--disable-gpu");

        let config = builder
            .build()
            .map_err(|e| CrawlError::Setup(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CrawlError::Setup(format!("failed to launch browser: {e}")))?;

        // Drive the CDP event loop until the connection drops
        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlError::Setup(format!("failed to open listing tab: {e}")))?;
        page.execute(SetUserAgentOverrideParams::new(USER_AGENT.to_string()))
            .await?;

        Ok(Self { browser, page })
    }

    /// Navigate the listing tab and wait for the load to settle.
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| CrawlError::Navigation(format!("{url}: {e}")))?
            .wait_for_navigation()
            .await
            .map_err(|e| CrawlError::Navigation(format!("{url}: {e}")))?;
        Ok(())
    }

    /// HTML snapshot of the listing tab.
    pub async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    /// Current URL of the listing tab.
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    /// Wait for `selector` to appear in the listing tab.
    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        wait_for_element(&self.page, selector, timeout).await
    }

    /// Click the first element matching `selector` in the listing tab.
    pub async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| CrawlError::Navigation(format!("'{selector}' not found: {e}")))?;
        element
            .click()
            .await
            .map_err(|e| CrawlError::Navigation(format!("click '{selector}': {e}")))?;
        Ok(())
    }

    /// Type text into the first element matching `selector`.
    pub async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| CrawlError::Navigation(format!("'{selector}' not found: {e}")))?;
        element
            .click()
            .await
            .map_err(|e| CrawlError::Navigation(format!("focus '{selector}': {e}")))?;
        element
            .type_str(text)
            .await
            .map_err(|e| CrawlError::Navigation(format!("type into '{selector}': {e}")))?;
        Ok(())
    }

    /// Evaluate a script in the listing tab and coerce the result to bool.
    /// Script failures are reported as `false` - callers treat evaluation
    /// as best-effort.
    pub async fn evaluate_bool(&self, script: &str) -> bool {
        match self.page.evaluate(script.to_string()).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(e) => {
                debug!("Script evaluation failed: {}", e);
                false
            }
        }
    }

    /// Open `url` in a fresh tab, leaving the listing tab untouched. The
    /// caller must hand the tab back to [`close_tab`] on every exit path.
    pub async fn open_tab(&self, url: &str) -> Result<Page> {
        let page = self.browser.new_page("about:blank").await?;
        page.execute(SetUserAgentOverrideParams::new(USER_AGENT.to_string()))
            .await?;
        page.goto(url)
            .await
            .map_err(|e| CrawlError::Navigation(format!("{url}: {e}")))?;
        Ok(page)
    }

    /// Close a detail tab. Failures are logged, not propagated - a leaked
    /// tab must never fail the row that spawned it.
    pub async fn close_tab(&self, page: Page) {
        if let Err(e) = page.close().await {
            warn!("Failed to close detail tab: {}", e);
        }
    }

    /// Cookies for the listing tab's current origin, for reuse on plain
    /// HTTP requests.
    pub async fn cookies(&self) -> Vec<super::SessionCookie> {
        let url = match self.page.url().await {
            Ok(Some(u)) => u,
            _ => return Vec::new(),
        };

        let params = GetCookiesParams::builder().urls(vec![url]).build();
        let cookies = match self.page.execute(params).await {
            Ok(result) => result.result.cookies,
            Err(e) => {
                warn!("Failed to get cookies via CDP: {}", e);
                self.page.get_cookies().await.unwrap_or_default()
            }
        };

        cookies
            .iter()
            .map(|c| super::SessionCookie {
                name: c.name.clone(),
                value: c.value.clone(),
                domain: c.domain.clone(),
                path: c.path.clone(),
                secure: c.secure,
                http_only: c.http_only,
            })
            .collect()
    }

    /// Shut the browser down. Best-effort; the process exits anyway.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close failed: {}", e);
        }
    }
}
