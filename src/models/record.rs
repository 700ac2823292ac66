//! Result rows and the enriched records written to the output stream.

use serde::{Deserialize, Serialize};

/// One row of a listing page.
///
/// Ephemeral: created per page scan and consumed immediately by the detail
/// processor, never persisted directly. The identifier is whatever the
/// listing's first column said and may be corrected from the detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub identifier: String,
    pub device_name: String,
    pub applicant: String,
    pub decision_date: String,
    pub detail_link: String,
}

/// Which priority tier matched when selecting a PDF on the detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfType {
    /// A decision summary document.
    Summary,
    /// A fallback document (decision letter, SE letter, clearance, ...).
    Backup,
    /// Any other link that looks like a PDF.
    Any,
    /// No qualifying PDF link on the page.
    None,
}

impl std::fmt::Display for PdfType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Backup => write!(f, "backup"),
            Self::Any => write!(f, "any"),
            Self::None => write!(f, "none"),
        }
    }
}

/// One fully-processed result, written exactly once as a single JSONL line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailRecord {
    pub k_number: String,
    pub device_name: String,
    pub applicant: String,
    pub decision_date: String,
    pub detail_link: String,
    pub summary_link: Option<String>,
    pub summary_text: Option<String>,
    pub pdf_type: PdfType,
}

impl DetailRecord {
    /// Build a record from a listing row plus what the detail page yielded.
    pub fn from_row(
        row: &ResultRow,
        corrected_identifier: Option<String>,
        summary_link: Option<String>,
        summary_text: Option<String>,
        pdf_type: PdfType,
    ) -> Self {
        Self {
            k_number: corrected_identifier.unwrap_or_else(|| row.identifier.clone()),
            device_name: row.device_name.clone(),
            applicant: row.applicant.clone(),
            decision_date: row.decision_date.clone(),
            detail_link: row.detail_link.clone(),
            summary_link,
            summary_text,
            pdf_type,
        }
    }
}
