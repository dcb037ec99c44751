//! Typed metadata extraction from page text.
//!
//! One extractor exists per document type; dispatch is an exhaustive match
//! from [`DocumentType`] to the matching prompt + schema pair, so an
//! unsupported type cannot reach this stage at runtime.
//!
//! Parsing is strict on structure: the oracle's reply must be a JSON
//! object satisfying the type's schema (required containers present,
//! field types correct). A reply that is only partially parseable fails
//! as a whole — guessing at half-extracted metadata would poison every
//! downstream consumer — while declared-optional fields may be absent
//! without penalty. Failures carry the raw reply for diagnosis.

use crate::config::PipelineConfig;
use crate::error::DocPipeError;
use crate::labels::DocumentType;
use crate::metadata::{
    ContractMetadata, DocumentMetadata, InvoiceMetadata, OtherMetadata, ReportMetadata,
};
use crate::oracle::{Oracle, TextRequest, Usage};
use crate::pipeline::classify::sample_text;
use crate::pipeline::load::Page;
use crate::prompts;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Models occasionally wrap the object in a fenced block despite the
/// format contract; unwrap it before parsing rather than failing on
/// otherwise-valid output.
static RE_JSON_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```(?:json)?\s*\n(.*?)\n?```\s*$").unwrap());

/// Extracts one document type's metadata schema from page text.
#[derive(Debug, Clone)]
pub struct Extractor {
    doc_type: DocumentType,
    max_pages: Option<usize>,
    max_prompt_chars: Option<usize>,
    max_tokens: usize,
}

impl Extractor {
    pub fn new(doc_type: DocumentType, config: &PipelineConfig) -> Self {
        Self {
            doc_type,
            max_pages: config.max_pages_extraction,
            max_prompt_chars: config.max_prompt_chars_extraction,
            max_tokens: config.max_extraction_tokens,
        }
    }

    /// The document type this extractor is bound to.
    pub fn doc_type(&self) -> DocumentType {
        self.doc_type
    }

    /// Assemble the type-specific user message from (capped) page text.
    pub(crate) fn build_user_prompt(&self, pages: &[Page]) -> String {
        let content = sample_text(pages, self.max_pages, self.max_prompt_chars);
        prompts::extraction_prompt(self.doc_type, &content)
    }

    /// Run one extraction call and parse the reply against the schema.
    pub async fn extract(
        &self,
        oracle: &dyn Oracle,
        pages: &[Page],
    ) -> Result<(DocumentMetadata, Usage), DocPipeError> {
        let request = TextRequest {
            system: prompts::EXTRACTION_SYSTEM_PROMPT.to_string(),
            user: self.build_user_prompt(pages),
            max_tokens: self.max_tokens,
        };

        let response = oracle.complete(&request).await?;
        let metadata = parse_metadata(self.doc_type, &response.text)?;

        debug!(doc_type = %self.doc_type, "extracted metadata");
        Ok((metadata, response.usage))
    }
}

/// Parse oracle free text into the schema for `doc_type`.
pub(crate) fn parse_metadata(
    doc_type: DocumentType,
    raw: &str,
) -> Result<DocumentMetadata, DocPipeError> {
    let body = strip_json_fences(raw);

    match doc_type {
        DocumentType::Invoice => parse_as::<InvoiceMetadata>(doc_type, raw, body)
            .map(DocumentMetadata::Invoice),
        DocumentType::Contract => parse_as::<ContractMetadata>(doc_type, raw, body)
            .map(DocumentMetadata::Contract),
        DocumentType::Earnings => parse_as::<ReportMetadata>(doc_type, raw, body)
            .map(DocumentMetadata::Earnings),
        DocumentType::Other => parse_as::<OtherMetadata>(doc_type, raw, body)
            .map(DocumentMetadata::Other),
    }
}

fn parse_as<T: DeserializeOwned>(
    doc_type: DocumentType,
    raw: &str,
    body: &str,
) -> Result<T, DocPipeError> {
    serde_json::from_str(body).map_err(|source| DocPipeError::MetadataParse {
        doc_type,
        raw: raw.to_string(),
        source,
    })
}

/// Remove a surrounding ```/```json fence, if any.
fn strip_json_fences(text: &str) -> &str {
    match RE_JSON_FENCES.captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(text),
        None => text.trim(),
    }
}
