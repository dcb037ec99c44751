//! # docpipe
//!
//! Classify business documents and extract typed metadata using LLMs.
//!
//! ## Why this crate?
//!
//! Hand-written rules for telling invoices from contracts break on the
//! first unusual layout, while free-form "ask the model" pipelines return
//! unauditable prose. This crate takes a middle road: the model is used as
//! a narrow oracle — one token's log-likelihoods for classification, one
//! schema-validated JSON object for extraction — and everything around it
//! is deterministic, typed Rust that either returns a well-formed record
//! or a precise error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Load      extract per-page text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 2. Classify  one-token oracle call → softmax over label candidates
//!  ├─ 3. Extract   type-specific prompt → strict JSON parse into the schema
//!  └─ 4. Actions   fixed per-type rules derive follow-up tasks on demand
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docpipe::{analyze, derive_actions, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Oracle constructed from OPENAI_API_KEY
//!     let config = PipelineConfig::default();
//!     let output = analyze("invoice.pdf", &config).await?;
//!     println!(
//!         "{} ({:.0}%)",
//!         output.entry.classification.doc_type,
//!         output.entry.classification.confidence * 100.0
//!     );
//!     for action in derive_actions(&output.entry.metadata) {
//!         println!("→ {} [{}]", action.kind, action.priority);
//!     }
//!     eprintln!(
//!         "tokens: {} in / {} out (~${:.4})",
//!         output.stats.input_tokens,
//!         output.stats.output_tokens,
//!         output.stats.estimated_cost_usd
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docpipe` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docpipe = { version = "0.3", default-features = false }
//! ```
//!
//! ## Determinism and retries
//!
//! Both oracle calls run at temperature 0; identical input against the
//! same model yields identical output. When the model nonetheless returns
//! something unusable — no label among the token candidates, or free text
//! that fails the metadata schema — the pipeline retries up to 3 attempts
//! with a fixed 500 ms delay, then surfaces the last error with the raw
//! response attached. Transport errors are never retried here; backoff
//! policy belongs to the transport layer.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod actions;
pub mod analyze;
pub mod config;
pub mod error;
pub mod labels;
pub mod manager;
pub mod metadata;
pub mod oracle;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use actions::{derive_actions, filter_by_priority, Action, Priority};
pub use analyze::{analyze, analyze_bytes, analyze_many, analyze_sync};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::DocPipeError;
pub use labels::DocumentType;
pub use manager::DocumentPipeline;
pub use metadata::{
    ContractMetadata, DocumentMetadata, InvoiceMetadata, KeyMetric, LineItem, OtherMetadata,
    ReportMetadata,
};
pub use oracle::{MockOracle, OpenAiOracle, Oracle, Usage};
pub use output::{AnalysisOutput, AnalysisStats, Classification, DocumentEntry};
pub use pipeline::load::Page;
