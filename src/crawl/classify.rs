//! Candidate PDF link classification.
//!
//! One configurable priority-tier matcher replaces the pile of near-identical
//! keyword scanners such sites tend to accumulate: each tier is an ordered
//! keyword set, and the first link (in document order) matching the highest
//! non-empty tier wins.

use scraper::{Html, Selector};
use url::Url;

use crate::models::PdfType;

/// Keywords marking a decision summary document.
const SUMMARY_KEYWORDS: &[&str] = &["summary", "decision summary", "summary (english)"];

/// Fallback keywords when no summary is present.
const BACKUP_KEYWORDS: &[&str] = &[
    "decision letter",
    "substantial equivalence",
    "se letter",
    "clearance",
    "letter",
    "decision",
    "determination",
];

/// An anchor scraped from a detail page: visible text plus resolved href.
#[derive(Debug, Clone)]
pub struct LinkCandidate {
    pub text: String,
    pub href: String,
}

impl LinkCandidate {
    fn is_pdfish(&self) -> bool {
        let href = self.href.to_lowercase();
        href.ends_with(".pdf") || href.contains("pdf")
    }

    fn matches_any(&self, keywords: &[&str]) -> bool {
        let text = self.text.to_lowercase();
        let href = self.href.to_lowercase();
        keywords.iter().any(|k| text.contains(k) || href.contains(k))
    }
}

/// Harvest every anchor from an HTML snapshot, hrefs resolved against
/// `base_url`. The single scanner feeding both PDF classification and
/// pagination-control lookup.
pub fn collect_links(html: &str, base_url: &str) -> Vec<LinkCandidate> {
    let doc = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").unwrap();
    let base = Url::parse(base_url).ok();

    doc.select(&anchor_selector)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let resolved = match &base {
                Some(base) => base.join(href).map(|u| u.to_string()).unwrap_or_default(),
                None => href.to_string(),
            };
            if resolved.is_empty() {
                return None;
            }
            Some(LinkCandidate {
                text: a.text().collect::<String>().trim().to_string(),
                href: resolved,
            })
        })
        .collect()
}

/// Ordered keyword tiers over PDF-looking links.
pub struct LinkClassifier {
    tiers: Vec<(PdfType, Vec<&'static str>)>,
}

impl LinkClassifier {
    /// The standard summary > backup > any-PDF priority.
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                (PdfType::Summary, SUMMARY_KEYWORDS.to_vec()),
                (PdfType::Backup, BACKUP_KEYWORDS.to_vec()),
            ],
        }
    }

    /// Pick the best PDF link among the candidates, or `None` when the page
    /// has no PDF-looking link at all. Within a tier, document order wins.
    pub fn select(&self, candidates: &[LinkCandidate]) -> Option<(String, PdfType)> {
        let pdfish: Vec<&LinkCandidate> =
            candidates.iter().filter(|c| c.is_pdfish()).collect();

        for (tier, keywords) in &self.tiers {
            if let Some(hit) = pdfish.iter().find(|c| c.matches_any(keywords)) {
                return Some((hit.href.clone(), *tier));
            }
        }

        // Last tier: any PDF-looking link
        pdfish.first().map(|c| (c.href.clone(), PdfType::Any))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(text: &str, href: &str) -> LinkCandidate {
        LinkCandidate {
            text: text.to_string(),
            href: href.to_string(),
        }
    }

    #[test]
    fn summary_outranks_decision_letter() {
        let candidates = vec![
            link("Decision Letter", "https://x.test/K1.letter.pdf"),
            link("Decision Summary", "https://x.test/K1.summary.pdf"),
        ];
        let (href, tier) = LinkClassifier::standard().select(&candidates).unwrap();
        assert_eq!(tier, PdfType::Summary);
        assert_eq!(href, "https://x.test/K1.summary.pdf");
    }

    #[test]
    fn letter_matches_backup_tier() {
        let candidates = vec![link("Decision Letter", "https://x.test/K1.pdf")];
        let (_, tier) = LinkClassifier::standard().select(&candidates).unwrap();
        assert_eq!(tier, PdfType::Backup);
    }

    #[test]
    fn unlabeled_pdf_falls_through_to_any() {
        let candidates = vec![
            link("Some attachment", "https://x.test/attachment.pdf"),
            link("Home", "https://x.test/index.html"),
        ];
        let (href, tier) = LinkClassifier::standard().select(&candidates).unwrap();
        assert_eq!(tier, PdfType::Any);
        assert_eq!(href, "https://x.test/attachment.pdf");
    }

    #[test]
    fn keyword_in_url_counts_too() {
        let candidates = vec![link("view", "https://x.test/summaries/K1-summary.pdf")];
        let (_, tier) = LinkClassifier::standard().select(&candidates).unwrap();
        assert_eq!(tier, PdfType::Summary);
    }

    #[test]
    fn non_pdf_links_never_match() {
        let candidates = vec![link("Decision Summary", "https://x.test/summary.html")];
        assert!(LinkClassifier::standard().select(&candidates).is_none());
    }

    #[test]
    fn collects_anchors_with_resolved_hrefs() {
        let html = r#"
            <html><body>
              <a href="summary.pdf">Decision Summary</a>
              <a href="javascript:void(0)">&gt;</a>
              <a>no href</a>
            </body></html>
        "#;
        let links = collect_links(html, "https://x.test/cfdocs/page.cfm");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "https://x.test/cfdocs/summary.pdf");
        assert_eq!(links[0].text, "Decision Summary");
        assert_eq!(links[1].href, "javascript:void(0)");
    }

    #[test]
    fn document_order_breaks_ties_within_a_tier() {
        let candidates = vec![
            link("Summary (English)", "https://x.test/first.pdf"),
            link("Decision Summary", "https://x.test/second.pdf"),
        ];
        let (href, _) = LinkClassifier::standard().select(&candidates).unwrap();
        assert_eq!(href, "https://x.test/first.pdf");
    }
}
