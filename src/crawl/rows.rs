//! Listing-row extraction.
//!
//! Works on an HTML snapshot of the listing tab rather than on live element
//! handles, so a re-render mid-scan can never invalidate anything. A result
//! row is any table row whose first cell links to a detail page.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::config::DETAIL_LINK_MARKER;
use crate::error::CrawlError;
use crate::models::ResultRow;

/// Collect every parseable result row from a listing page snapshot.
/// Malformed rows are logged and skipped; they never abort the page.
pub fn collect_rows(html: &str, base_url: &str) -> Vec<ResultRow> {
    let doc = Html::parse_document(html);
    let row_selector = Selector::parse("table tr").unwrap();
    let base = Url::parse(base_url).ok();

    let mut rows = Vec::new();
    for element in doc.select(&row_selector) {
        match parse_row(element, base.as_ref()) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {} // header row, pagination row, etc.
            Err(e) => warn!("Skipping row: {}", e),
        }
    }

    debug!("Collected {} rows from listing page", rows.len());
    rows
}

/// Parse one `<tr>`. Returns `Ok(None)` when the row is not a result row at
/// all, and an error when it looks like one but its cells don't line up.
fn parse_row(row: ElementRef<'_>, base: Option<&Url>) -> Result<Option<ResultRow>, CrawlError> {
    let cell_selector = Selector::parse("td").unwrap();
    let link_selector = Selector::parse("a[href]").unwrap();

    let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
    let Some(first_cell) = cells.first() else {
        return Ok(None);
    };

    // The first cell must link to a detail page; everything else is chrome.
    let Some(anchor) = first_cell
        .select(&link_selector)
        .find(|a| a.value().attr("href").is_some_and(|h| h.contains(DETAIL_LINK_MARKER)))
    else {
        return Ok(None);
    };

    let href = anchor.value().attr("href").unwrap_or_default();
    let detail_link = match base {
        Some(base) => base
            .join(href)
            .map_err(|e| CrawlError::RowParse(format!("bad detail link '{href}': {e}")))?
            .to_string(),
        None => href.to_string(),
    };

    let identifier = cell_text(&anchor);
    if identifier.is_empty() {
        return Err(CrawlError::RowParse(format!(
            "empty identifier cell for {detail_link}"
        )));
    }

    let field = |idx: usize, name: &str| -> Result<String, CrawlError> {
        cells
            .get(idx)
            .map(|c| cell_text(c))
            .ok_or_else(|| CrawlError::RowParse(format!("missing {name} cell for {identifier}")))
    };

    let device_name = field(1, "device name")?;
    let applicant = field(2, "applicant")?;
    let decision_date = field(3, "decision date")?;

    Ok(Some(ResultRow {
        identifier,
        device_name,
        applicant,
        decision_date,
        detail_link,
    }))
}

fn cell_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.accessdata.fda.gov/scripts/cdrh/cfdocs/cfPMN/pmn.cfm";

    fn listing(rows: &str) -> String {
        format!("<html><body><table>{rows}</table></body></html>")
    }

    #[test]
    fn collects_result_rows_with_all_fields() {
        let html = listing(
            r#"
            <tr><th>K Number</th><th>Device</th><th>Applicant</th><th>Date</th></tr>
            <tr>
              <td><a href="pmn.cfm?ID=K240001">K240001</a></td>
              <td>Spinal  Implant</td>
              <td>Acme Medical</td>
              <td>01/15/2024</td>
            </tr>
            "#,
        );
        let rows = collect_rows(&html, BASE);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.identifier, "K240001");
        assert_eq!(row.device_name, "Spinal Implant");
        assert_eq!(row.applicant, "Acme Medical");
        assert_eq!(row.decision_date, "01/15/2024");
        assert!(row.detail_link.ends_with("pmn.cfm?ID=K240001"));
    }

    #[test]
    fn resolves_relative_detail_links_against_listing_url() {
        let html = listing(
            r#"<tr><td><a href="pmn.cfm?ID=K1">K1</a></td><td>D</td><td>A</td><td>X</td></tr>"#,
        );
        let rows = collect_rows(&html, BASE);
        assert_eq!(
            rows[0].detail_link,
            "https://www.accessdata.fda.gov/scripts/cdrh/cfdocs/cfPMN/pmn.cfm?ID=K1"
        );
    }

    #[test]
    fn skips_rows_without_a_detail_link() {
        let html = listing(
            r#"
            <tr><td>Results 1 to 10</td></tr>
            <tr><td><a href="help.cfm">Help</a></td><td>x</td></tr>
            "#,
        );
        assert!(collect_rows(&html, BASE).is_empty());
    }

    #[test]
    fn malformed_row_does_not_abort_the_page() {
        let html = listing(
            r#"
            <tr><td><a href="pmn.cfm?ID=K1">K1</a></td></tr>
            <tr><td><a href="pmn.cfm?ID=K2">K2</a></td><td>Good</td><td>A</td><td>D</td></tr>
            "#,
        );
        let rows = collect_rows(&html, BASE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].identifier, "K2");
    }

    #[test]
    fn empty_page_yields_no_rows() {
        assert!(collect_rows("<html><body></body></html>", BASE).is_empty());
    }
}
