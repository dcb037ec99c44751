//! Prompt templates for classification and metadata extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening an extraction instruction or
//!    the output-shape contract happens in exactly one place.
//!
//! 2. **Testability** — unit tests inspect the assembled prompts directly
//!    without a live model, so a template regression (a field dropped from
//!    the JSON shape, a label missing from the list) is caught cheaply.
//!
//! The extraction prompts end with an explicit JSON shape instead of
//! relying on a provider-side JSON mode: the shape line travels with the
//! request, works on any OpenAI-compatible endpoint, and documents the
//! schema the parser on our side actually enforces.

use crate::labels::DocumentType;

/// System message for every extraction call.
///
/// The "only information present in the text" constraint is the
/// prompt-level half of the no-invented-values contract; the schema-strict
/// parser is the mechanical half.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "You extract structured metadata from business \
documents parsed as text from PDF. Focus only on the information present in the text.";

/// Build the single-message classification prompt.
///
/// Lists every label with its description, embeds the (already truncated)
/// sample text, and instructs the model to answer with exactly one label
/// token — the classifier reads the answer from the token candidates, so
/// anything beyond one token would be wasted.
pub fn classification_prompt(content: &str) -> String {
    let label_lines = DocumentType::ALL
        .iter()
        .map(|t| format!("- {}: {}", t.as_str(), t.description()))
        .collect::<Vec<_>>()
        .join("\n");
    let label_list = DocumentType::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a document classification system. Your task is to classify a business document \
         into one of the following types:\n\n\
         {label_lines}\n\n\
         Document content:\n\
         {content}\n\n\
         Respond with only one of the following labels: {label_list}."
    )
}

/// Build the type-specific extraction user message.
pub fn extraction_prompt(doc_type: DocumentType, content: &str) -> String {
    match doc_type {
        DocumentType::Invoice => invoice_prompt(content),
        DocumentType::Contract => contract_prompt(content),
        DocumentType::Earnings => report_prompt(content),
        DocumentType::Other => other_prompt(content),
    }
}

fn invoice_prompt(content: &str) -> String {
    format!(
        "You are an intelligent data extractor for business invoices.\n\n\
         Extract the following fields:\n\
         - vendor: name of the vendor or company issuing the invoice\n\
         - amount: total amount in the invoice\n\
         - due_date: in YYYY-MM-DD format (e.g., 2024-03-25). Only include if explicitly \
         mentioned and applicable.\n\
         - line_items: a list of items, each containing a description, quantity, and total \
         amount of the line item, if available. Include all items explicitly mentioned in the \
         text, even if some fields are missing or have a value of 0.\n\n\
         Do not infer the actual values, just extract what is present in the text.\n\n\
         {}\n\n\
         Invoice text:\n{content}",
        shape_instructions(
            r#"{"vendor": string | null, "amount": number | null, "due_date": string | null, "line_items": [{"description": string, "quantity": number | null, "amount": number | null}] | null}"#
        )
    )
}

fn contract_prompt(content: &str) -> String {
    format!(
        "You are a document intelligence system focused on contracts.\n\n\
         Extract the following metadata:\n\
         - parties involved\n\
         - effective_date: in YYYY-MM-DD format (e.g., 2024-03-25)\n\
         - termination_date: in YYYY-MM-DD format (e.g., 2024-03-25)\n\
         - key_terms (as a list of strings)\n\n\
         {}\n\n\
         Contract content:\n{content}",
        shape_instructions(
            r#"{"parties": [string] | null, "effective_date": string | null, "termination_date": string | null, "key_terms": [string] | null}"#
        )
    )
}

fn report_prompt(content: &str) -> String {
    format!(
        "You are an AI system extracting key information from business earnings reports.\n\n\
         Extract the following fields:\n\
         - reporting_period\n\
         - key_metrics: named figures with their values as written in the text (keep values \
         like \"$1.2B\" or \"15%\" as strings)\n\
         - executive_summary (a short paragraph)\n\n\
         {}\n\n\
         Report content:\n{content}",
        shape_instructions(
            r#"{"reporting_period": string | null, "key_metrics": [{"name": string, "value": string | null}] | null, "executive_summary": string | null}"#
        )
    )
}

fn other_prompt(content: &str) -> String {
    format!(
        "You are an AI system summarizing general business documents that do not fit a \
         specific category.\n\n\
         Extract the following fields:\n\
         - summary: a concise 3-5 sentence overview of the document\n\n\
         {}\n\n\
         Document content:\n{content}",
        shape_instructions(r#"{"summary": string | null}"#)
    )
}

/// Shared output-format contract appended to every extraction prompt.
fn shape_instructions(shape: &str) -> String {
    format!(
        "Respond with a single JSON object and nothing else — no markdown fences, no \
         commentary. Use null for fields not present in the text. The object must have \
         exactly this shape:\n{shape}"
    )
}
