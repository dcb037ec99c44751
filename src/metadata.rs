//! Typed metadata schemas, one per document category.
//!
//! Every leaf field is `Option` (or an optional container) because
//! extraction is allowed to find nothing: a scanned invoice may carry no
//! due date, a contract no termination date. serde keeps "the model did not
//! report this field" (`None`) distinguishable from "the model reported it
//! empty" (`Some("")` / `Some(vec![])`), which matters to downstream
//! consumers deciding whether a value is missing or genuinely blank.
//!
//! The two exceptions are [`LineItem::description`] and [`KeyMetric::name`]:
//! a line item without a description or a metric without a name is not a
//! partial value, it is structural garbage, and parsing fails.

use crate::labels::DocumentType;
use serde::{Deserialize, Serialize};

/// One invoice line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Option<f64>,
    pub amount: Option<f64>,
}

/// Metadata extracted from an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceMetadata {
    /// Name of the vendor or company issuing the invoice.
    pub vendor: Option<String>,
    /// Total amount due.
    pub amount: Option<f64>,
    /// Due date in `YYYY-MM-DD` form, when explicitly stated.
    pub due_date: Option<String>,
    pub line_items: Option<Vec<LineItem>>,
}

/// Metadata extracted from a contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub parties: Option<Vec<String>>,
    /// Effective date in `YYYY-MM-DD` form.
    pub effective_date: Option<String>,
    /// Termination date in `YYYY-MM-DD` form.
    pub termination_date: Option<String>,
    pub key_terms: Option<Vec<String>>,
}

/// One named metric from an earnings report.
///
/// `value` stays a free-form string to carry things like `"$1.2B"`,
/// `"15%"`, or `"N/A"` without lossy numeric coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetric {
    pub name: String,
    pub value: Option<String>,
}

/// Metadata extracted from an earnings report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub reporting_period: Option<String>,
    pub key_metrics: Option<Vec<KeyMetric>>,
    pub executive_summary: Option<String>,
}

/// Metadata for documents outside the known categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherMetadata {
    /// A concise overview of the document.
    pub summary: Option<String>,
}

/// A type-tagged metadata record, produced by extraction.
///
/// Serialises untagged — i.e. as the bare field object — because the
/// document type already travels alongside it in the classification
/// result; repeating a tag inside the metadata would be redundant on the
/// wire. Deserialisation happens per-variant in the extractor (which knows
/// the type up front), never through this enum.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DocumentMetadata {
    Invoice(InvoiceMetadata),
    Contract(ContractMetadata),
    Earnings(ReportMetadata),
    Other(OtherMetadata),
}

impl DocumentMetadata {
    /// The document type this record belongs to.
    pub fn doc_type(&self) -> DocumentType {
        match self {
            DocumentMetadata::Invoice(_) => DocumentType::Invoice,
            DocumentMetadata::Contract(_) => DocumentType::Contract,
            DocumentMetadata::Earnings(_) => DocumentType::Earnings,
            DocumentMetadata::Other(_) => DocumentType::Other,
        }
    }
}
