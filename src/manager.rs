//! The pipeline orchestrator: owns the oracle, the classifier, the four
//! extractors, and the token accounting.
//!
//! ## Retry scope
//!
//! `classify` and `extract_metadata` wrap their stage in the bounded retry
//! combinator, which fires only on malformed oracle output. Transport
//! failures pass through untouched — request-level backoff belongs to a
//! transport policy, not here — and unsupported types never reach the
//! oracle at all because the type is already an enum by the time these
//! methods are callable.
//!
//! ## Token accounting
//!
//! The accumulator is the orchestrator's only shared mutable state, so it
//! uses atomics: a pipeline shared across concurrent analyses must not
//! under-count. Counters start at zero on construction and are never reset
//! during the pipeline's lifetime; [`DocumentPipeline::estimated_cost`] is
//! a pure read over them and can be called any number of times.

use crate::config::PipelineConfig;
use crate::error::DocPipeError;
use crate::labels::DocumentType;
use crate::metadata::DocumentMetadata;
use crate::oracle::{OpenAiOracle, Oracle, Usage};
use crate::output::Classification;
use crate::pipeline::classify::Classifier;
use crate::pipeline::extract::Extractor;
use crate::pipeline::load::{self, Page};
use crate::pipeline::retry_parse_failures;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// One classifier, four extractors, one token ledger.
pub struct DocumentPipeline {
    config: PipelineConfig,
    oracle: Arc<dyn Oracle>,
    classifier: Classifier,
    // In canonical label order; `extractor_for` relies on it.
    extractors: [Extractor; 4],
    total_input_tokens: AtomicU64,
    total_output_tokens: AtomicU64,
}

impl DocumentPipeline {
    /// Build a pipeline from configuration.
    ///
    /// Uses the pre-constructed oracle from `config.oracle` when present;
    /// otherwise constructs an [`OpenAiOracle`] from `OPENAI_API_KEY`.
    pub fn new(config: PipelineConfig) -> Result<Self, DocPipeError> {
        let oracle: Arc<dyn Oracle> = match &config.oracle {
            Some(oracle) => Arc::clone(oracle),
            None => Arc::new(
                OpenAiOracle::from_env(config.model.clone())?
                    .with_timeout(Duration::from_secs(config.api_timeout_secs)),
            ),
        };
        Ok(Self::with_oracle(config, oracle))
    }

    /// Build a pipeline around an explicit oracle.
    pub fn with_oracle(config: PipelineConfig, oracle: Arc<dyn Oracle>) -> Self {
        let classifier = Classifier::new(&config);
        let extractors = DocumentType::ALL.map(|t| Extractor::new(t, &config));
        Self {
            config,
            oracle,
            classifier,
            extractors,
            total_input_tokens: AtomicU64::new(0),
            total_output_tokens: AtomicU64::new(0),
        }
    }

    /// Extract per-page text from a PDF on disk.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Vec<Page>, DocPipeError> {
        load::load_pages(path.as_ref(), self.config.password.as_deref()).await
    }

    /// Classify the document, retrying on malformed oracle output.
    pub async fn classify(&self, pages: &[Page]) -> Result<Classification, DocPipeError> {
        let (classification, usage) = retry_parse_failures(
            self.config.max_attempts,
            Duration::from_millis(self.config.retry_delay_ms),
            || self.classifier.classify(self.oracle.as_ref(), pages),
        )
        .await?;

        self.record_usage(usage);
        info!(
            doc_type = classification.doc_type.as_str(),
            confidence = classification.confidence,
            "classification complete"
        );
        Ok(classification)
    }

    /// Extract the metadata schema for `doc_type`, retrying on malformed
    /// oracle output.
    pub async fn extract_metadata(
        &self,
        pages: &[Page],
        doc_type: DocumentType,
    ) -> Result<DocumentMetadata, DocPipeError> {
        let extractor = self.extractor_for(doc_type);

        let (metadata, usage) = retry_parse_failures(
            self.config.max_attempts,
            Duration::from_millis(self.config.retry_delay_ms),
            || extractor.extract(self.oracle.as_ref(), pages),
        )
        .await?;

        self.record_usage(usage);
        info!(doc_type = doc_type.as_str(), "extraction complete");
        Ok(metadata)
    }

    /// The document types this pipeline can extract, in label order.
    pub fn supported_types(&self) -> &'static [DocumentType] {
        &DocumentType::ALL
    }

    /// USD cost estimate of all accumulated usage at the configured rates.
    pub fn estimated_cost(&self) -> f64 {
        self.estimated_cost_at(
            self.config.input_cost_per_million,
            self.config.output_cost_per_million,
        )
    }

    /// USD cost estimate at explicit per-million-token rates.
    pub fn estimated_cost_at(&self, input_rate: f64, output_rate: f64) -> f64 {
        let input = self.total_input_tokens.load(Ordering::Relaxed) as f64;
        let output = self.total_output_tokens.load(Ordering::Relaxed) as f64;
        (input / 1_000_000.0) * input_rate + (output / 1_000_000.0) * output_rate
    }

    /// Prompt tokens accumulated across all successful oracle calls.
    pub fn total_input_tokens(&self) -> u64 {
        self.total_input_tokens.load(Ordering::Relaxed)
    }

    /// Completion tokens accumulated across all successful oracle calls.
    pub fn total_output_tokens(&self) -> u64 {
        self.total_output_tokens.load(Ordering::Relaxed)
    }

    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn extractor_for(&self, doc_type: DocumentType) -> &Extractor {
        let index = DocumentType::ALL
            .iter()
            .position(|t| *t == doc_type)
            .expect("extractors cover every DocumentType variant");
        &self.extractors[index]
    }

    fn record_usage(&self, usage: Usage) {
        self.total_input_tokens
            .fetch_add(usage.input_tokens, Ordering::Relaxed);
        self.total_output_tokens
            .fetch_add(usage.output_tokens, Ordering::Relaxed);
    }
}
