//! The closed set of document categories the pipeline understands.
//!
//! ## Why an enum rather than strings?
//!
//! Every stage downstream of classification — prompt selection, metadata
//! schema, action rules — dispatches on the document type. Representing it
//! as a closed enum makes each dispatch an exhaustive `match`, so adding a
//! fifth category is a compile error at every site that needs updating
//! instead of a silent runtime fallback. Free-form strings only exist at
//! the program boundary and are folded into the enum by [`FromStr`], which
//! is also where the historical `"Report"` spelling is normalised to
//! [`DocumentType::Earnings`].

use crate::error::DocPipeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four business-document categories.
///
/// The variant order is the canonical label order: it drives prompt
/// construction and tie-breaking during classification, so it must stay
/// stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// A bill for goods or services.
    Invoice,
    /// A legal agreement between parties.
    Contract,
    /// A financial or business report.
    #[serde(alias = "Report")]
    Earnings,
    /// Anything that does not fit the categories above.
    Other,
}

impl DocumentType {
    /// All document types, in canonical label order.
    pub const ALL: [DocumentType; 4] = [
        DocumentType::Invoice,
        DocumentType::Contract,
        DocumentType::Earnings,
        DocumentType::Other,
    ];

    /// The label token the classification oracle is asked to emit.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Invoice => "Invoice",
            DocumentType::Contract => "Contract",
            DocumentType::Earnings => "Earnings",
            DocumentType::Other => "Other",
        }
    }

    /// Human-readable description, embedded verbatim in the classification
    /// prompt so the model knows what each label means.
    pub fn description(self) -> &'static str {
        match self {
            DocumentType::Invoice => {
                "A bill for goods or services, typically including vendor, amount, due date, and line items."
            }
            DocumentType::Contract => {
                "A legal agreement between parties, containing terms, dates, and responsibilities."
            }
            DocumentType::Earnings => {
                "A financial or business report summarizing revenue, profits, expenses, and other key metrics."
            }
            DocumentType::Other => {
                "Any other type of document that does not fit the above categories."
            }
        }
    }

    /// Parse a label, mapping anything unrecognised to [`DocumentType::Other`].
    ///
    /// Use this on the action-derivation path, where an unknown type should
    /// fall back to the generic rule set rather than fail. Everywhere else,
    /// prefer the strict [`FromStr`] implementation.
    pub fn parse_lossy(s: &str) -> DocumentType {
        s.parse().unwrap_or(DocumentType::Other)
    }
}

impl FromStr for DocumentType {
    type Err = DocPipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Invoice" => Ok(DocumentType::Invoice),
            "Contract" => Ok(DocumentType::Contract),
            // "Report" is accepted as a legacy spelling of Earnings.
            "Earnings" | "Report" => Ok(DocumentType::Earnings),
            "Other" => Ok(DocumentType::Other),
            other => Err(DocPipeError::UnsupportedDocumentType {
                doc_type: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
