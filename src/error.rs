//! Error types for the docpipe library.
//!
//! The pipeline distinguishes two broad failure families:
//!
//! * **Malformed oracle output** — the model answered, but the answer is
//!   unusable ([`DocPipeError::ClassificationFormat`],
//!   [`DocPipeError::MetadataParse`]). These are worth retrying: at
//!   temperature 0 the model is deterministic per request, but the retry
//!   happens at a different wall-clock moment and providers do occasionally
//!   return differently-tokenised responses.
//!
//! * **Everything else** — bad input files, transport failures, wrong
//!   configuration. Retrying these from inside the pipeline would either
//!   never help (missing file, unknown type) or trample on transport-level
//!   policy (rate limiting wants backoff, not a fixed delay), so they
//!   propagate immediately.
//!
//! [`DocPipeError::is_retryable`] encodes the split; the orchestrator's
//! retry combinator consults it rather than matching variants inline.

use crate::labels::DocumentType;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docpipe library.
#[derive(Debug, Error)]
pub enum DocPipeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── Oracle errors ─────────────────────────────────────────────────────
    /// No oracle could be constructed (missing API key etc.).
    #[error("LLM oracle is not configured.\n{hint}")]
    OracleNotConfigured { hint: String },

    /// The request never produced a usable HTTP response.
    #[error("LLM transport error: {detail}")]
    OracleTransport { detail: String },

    /// The LLM API returned a non-success status.
    #[error("LLM API error (HTTP {status}): {message}")]
    OracleApi { status: u16, message: String },

    /// The LLM API returned HTTP 429 — caller should back off.
    ///
    /// Check `retry_after_secs` for a server-specified delay. The pipeline
    /// itself never retries this; backoff policy belongs to the caller.
    #[error("Rate limit exceeded by LLM API")]
    RateLimitExceeded { retry_after_secs: Option<u64> },

    /// The LLM API rejected the credentials (401/403).
    #[error("Authentication failed against LLM API: {detail}")]
    AuthFailed { detail: String },

    /// Transport succeeded but the response body violates the API contract
    /// (e.g. missing the per-token candidate structure).
    #[error("Unexpected LLM response shape: {detail}")]
    UnexpectedOracleResponse { detail: String },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// None of the oracle's top candidate tokens matched a known label.
    #[error(
        "Classification failed: no candidate token matched a known label.\n\
         Candidates seen: {candidates:?}"
    )]
    ClassificationFormat { candidates: Vec<String> },

    /// A document-type string with no registered schema was requested.
    #[error("Unsupported document type: '{doc_type}'")]
    UnsupportedDocumentType { doc_type: String },

    /// The oracle's free text could not be validated against the expected
    /// metadata schema. Carries the raw text for diagnosis.
    #[error("Failed to parse {doc_type} metadata: {source}\nRaw response:\n{raw}")]
    MetadataParse {
        doc_type: DocumentType,
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocPipeError {
    /// Whether the orchestrator's bounded retry applies to this error.
    ///
    /// Only malformed-output failures qualify; transport and input errors
    /// propagate to the caller on the first occurrence.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DocPipeError::ClassificationFormat { .. } | DocPipeError::MetadataParse { .. }
        )
    }
}
