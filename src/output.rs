//! Result types returned by the pipeline.

use crate::labels::DocumentType;
use crate::metadata::DocumentMetadata;
use serde::Serialize;
use uuid::Uuid;

/// The predicted document type with the model's certainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    /// The winning label.
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    /// Softmax-normalised probability mass of the winning label, in [0, 1],
    /// computed over the labels present in the oracle's token candidates.
    pub confidence: f64,
}

/// One fully analysed document: identity, classification, and typed
/// metadata. Immutable once produced; action lists are derived from it on
/// demand rather than stored.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentEntry {
    /// Unique identifier for this analysis run.
    pub id: Uuid,
    pub classification: Classification,
    pub metadata: DocumentMetadata,
}

/// Statistics about a single analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisStats {
    /// Pages the loader extracted from the PDF.
    pub pages: usize,
    /// Total prompt tokens across classification and extraction.
    pub input_tokens: u64,
    /// Total completion tokens across classification and extraction.
    pub output_tokens: u64,
    pub load_duration_ms: u64,
    pub classify_duration_ms: u64,
    pub extract_duration_ms: u64,
    /// USD estimate at the configured per-million-token rates.
    pub estimated_cost_usd: f64,
}

/// Everything produced by one [`crate::analyze()`] call.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub entry: DocumentEntry,
    pub stats: AnalysisStats,
}
