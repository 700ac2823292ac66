//! Crawl configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Search endpoint of the FDA 510(k) premarket-notification database.
pub const PORTAL_URL: &str = "https://www.accessdata.fda.gov/scripts/cdrh/cfdocs/cfPMN/pmn.cfm";

/// Query-string fragment that marks a listing row's detail link.
pub const DETAIL_LINK_MARKER: &str = "pmn.cfm?ID=";

/// Browser-identifying user agent sent on both CDP and HTTP requests.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Tunables for one crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Device-name search term.
    pub query: String,

    /// Maximum number of listing pages to visit (0 = unbounded).
    #[serde(default)]
    pub max_pages: u32,

    /// Output JSONL path.
    pub out_path: std::path::PathBuf,

    /// Run Chrome headless.
    #[serde(default)]
    pub headless: bool,

    /// Skip identifiers already present in the output file.
    #[serde(default = "default_resume")]
    pub resume: bool,

    /// Minimum delay between detail-row operations, in seconds. Jitter of
    /// up to 0.9s is added on top.
    #[serde(default = "default_throttle")]
    pub throttle: f64,

    /// Bounded wait for UI elements, in seconds.
    #[serde(default = "default_ui_timeout")]
    pub ui_timeout: u64,

    /// Timeout for a single PDF fetch, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: u64,

    /// The portal's fixed pagination offset step.
    #[serde(default = "default_page_step")]
    pub page_step: u32,

    /// Consecutive zero-row pages before the crawl is declared done.
    #[serde(default = "default_empty_page_limit")]
    pub empty_page_limit: u32,
}

fn default_resume() -> bool {
    true
}

fn default_throttle() -> f64 {
    0.8
}

fn default_ui_timeout() -> u64 {
    15
}

fn default_fetch_timeout() -> u64 {
    90
}

fn default_page_step() -> u32 {
    10
}

fn default_empty_page_limit() -> u32 {
    3
}

impl CrawlConfig {
    /// Build a config for `query`, deriving the output path when none is
    /// given (`fda_<query>.jsonl`, spaces collapsed to underscores).
    pub fn for_query(query: &str, out: Option<std::path::PathBuf>) -> Self {
        let out_path =
            out.unwrap_or_else(|| format!("fda_{}.jsonl", query.replace(' ', "_")).into());
        Self {
            query: query.to_string(),
            max_pages: 0,
            out_path,
            headless: false,
            resume: default_resume(),
            throttle: default_throttle(),
            ui_timeout: default_ui_timeout(),
            fetch_timeout: default_fetch_timeout(),
            page_step: default_page_step(),
            empty_page_limit: default_empty_page_limit(),
        }
    }

    pub fn ui_timeout(&self) -> Duration {
        Duration::from_secs(self.ui_timeout)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_output_path_from_query() {
        let config = CrawlConfig::for_query("bone implant", None);
        assert_eq!(config.out_path, std::path::PathBuf::from("fda_bone_implant.jsonl"));
    }

    #[test]
    fn explicit_output_path_wins() {
        let config = CrawlConfig::for_query("implant", Some("custom.jsonl".into()));
        assert_eq!(config.out_path, std::path::PathBuf::from("custom.jsonl"));
    }
}
