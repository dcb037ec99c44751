//! Configuration types for the document pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built
//! via its [`PipelineConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, log them, and diff two runs
//! to understand why their outputs differ.
//!
//! Classification and extraction carry *independent* truncation caps:
//! classification only needs enough text to recognise the document's shape,
//! so it caps both pages and characters aggressively, while extraction
//! defaults to the full document because missing a line item on page 14 is
//! worse than a larger prompt.

use crate::error::DocPipeError;
use crate::oracle::Oracle;
use std::fmt;
use std::sync::Arc;

/// Configuration for a [`crate::DocumentPipeline`].
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use docpipe::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .model("gpt-4o-mini")
///     .max_pages_classification(5)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Model identifier, e.g. "gpt-4o-mini". Default: "gpt-4o-mini".
    pub model: String,

    /// Pre-constructed oracle. When set, `model` and the environment API key
    /// are ignored; useful in tests and for custom middleware.
    pub oracle: Option<Arc<dyn Oracle>>,

    /// Page cap for classification input. Default: 10.
    ///
    /// The opening pages almost always identify a business document's type;
    /// feeding all 80 pages of a contract would multiply cost for no
    /// accuracy gain. `None` lifts the cap.
    pub max_pages_classification: Option<usize>,

    /// Character cap for the classification sample text. Default: 5500.
    ///
    /// A hard byte-prefix cut, deliberately not word-boundary-aware: the
    /// classifier reads enough intact text before the cut that a clipped
    /// final word never changes the predicted label, and the simple rule
    /// keeps prompt size exactly predictable.
    pub max_prompt_chars_classification: Option<usize>,

    /// Page cap for extraction input. Default: unlimited.
    pub max_pages_extraction: Option<usize>,

    /// Character cap for extraction content. Default: unlimited.
    ///
    /// More permissive than classification on purpose: extraction fidelity
    /// usually improves with full content.
    pub max_prompt_chars_extraction: Option<usize>,

    /// Upper bound on generated tokens per extraction call. Default: 1000.
    pub max_extraction_tokens: usize,

    /// How many candidate tokens to request for the classification
    /// position. Default: 10.
    ///
    /// Confidence is normalised over the labels found among these
    /// candidates, so shrinking this below the label-set size degrades the
    /// score's meaning.
    pub top_candidates: usize,

    /// Total attempts for classify / extract on malformed-output failures.
    /// Default: 3. The first attempt counts, so 3 means two retries.
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds. Default: 500.
    pub retry_delay_ms: u64,

    /// Per-oracle-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Cost per million input tokens in USD. Default: 0.60 (gpt-4o-mini).
    pub input_cost_per_million: f64,

    /// Cost per million output tokens in USD. Default: 2.40 (gpt-4o-mini).
    pub output_cost_per_million: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            oracle: None,
            max_pages_classification: Some(10),
            max_prompt_chars_classification: Some(5500),
            max_pages_extraction: None,
            max_prompt_chars_extraction: None,
            max_extraction_tokens: 1000,
            top_candidates: 10,
            max_attempts: 3,
            retry_delay_ms: 500,
            api_timeout_secs: 60,
            password: None,
            input_cost_per_million: 0.60,
            output_cost_per_million: 2.40,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("model", &self.model)
            .field("oracle", &self.oracle.as_ref().map(|_| "<dyn Oracle>"))
            .field("max_pages_classification", &self.max_pages_classification)
            .field(
                "max_prompt_chars_classification",
                &self.max_prompt_chars_classification,
            )
            .field("max_pages_extraction", &self.max_pages_extraction)
            .field("max_prompt_chars_extraction", &self.max_prompt_chars_extraction)
            .field("max_extraction_tokens", &self.max_extraction_tokens)
            .field("top_candidates", &self.top_candidates)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("input_cost_per_million", &self.input_cost_per_million)
            .field("output_cost_per_million", &self.output_cost_per_million)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn oracle(mut self, oracle: Arc<dyn Oracle>) -> Self {
        self.config.oracle = Some(oracle);
        self
    }

    pub fn max_pages_classification(mut self, pages: usize) -> Self {
        self.config.max_pages_classification = Some(pages);
        self
    }

    /// Lift the classification page cap entirely.
    pub fn unlimited_pages_classification(mut self) -> Self {
        self.config.max_pages_classification = None;
        self
    }

    pub fn max_prompt_chars_classification(mut self, chars: usize) -> Self {
        self.config.max_prompt_chars_classification = Some(chars);
        self
    }

    pub fn max_pages_extraction(mut self, pages: usize) -> Self {
        self.config.max_pages_extraction = Some(pages);
        self
    }

    pub fn max_prompt_chars_extraction(mut self, chars: usize) -> Self {
        self.config.max_prompt_chars_extraction = Some(chars);
        self
    }

    pub fn max_extraction_tokens(mut self, tokens: usize) -> Self {
        self.config.max_extraction_tokens = tokens;
        self
    }

    pub fn top_candidates(mut self, k: usize) -> Self {
        self.config.top_candidates = k;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts.max(1);
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_delay_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn input_cost_per_million(mut self, usd: f64) -> Self {
        self.config.input_cost_per_million = usd;
        self
    }

    pub fn output_cost_per_million(mut self, usd: f64) -> Self {
        self.config.output_cost_per_million = usd;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocPipeError> {
        let c = &self.config;
        if c.model.is_empty() {
            return Err(DocPipeError::InvalidConfig("model must not be empty".into()));
        }
        if c.top_candidates == 0 || c.top_candidates > 20 {
            return Err(DocPipeError::InvalidConfig(format!(
                "top_candidates must be 1–20, got {}",
                c.top_candidates
            )));
        }
        if c.max_attempts == 0 {
            return Err(DocPipeError::InvalidConfig("max_attempts must be ≥ 1".into()));
        }
        if c.max_extraction_tokens == 0 {
            return Err(DocPipeError::InvalidConfig(
                "max_extraction_tokens must be ≥ 1".into(),
            ));
        }
        if c.input_cost_per_million < 0.0 || c.output_cost_per_million < 0.0 {
            return Err(DocPipeError::InvalidConfig(
                "token costs must not be negative".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_caps_match_documented_values() {
        let c = PipelineConfig::default();
        assert_eq!(c.max_pages_classification, Some(10));
        assert_eq!(c.max_prompt_chars_classification, Some(5500));
        assert_eq!(c.max_pages_extraction, None);
        assert_eq!(c.max_prompt_chars_extraction, None);
        assert_eq!(c.top_candidates, 10);
        assert_eq!(c.max_attempts, 3);
        assert_eq!(c.retry_delay_ms, 500);
    }

    #[test]
    fn builder_rejects_zero_top_candidates() {
        let r = PipelineConfig::builder().top_candidates(0).build();
        assert!(matches!(r, Err(DocPipeError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_oversized_top_candidates() {
        let r = PipelineConfig::builder().top_candidates(21).build();
        assert!(r.is_err());
    }

    #[test]
    fn builder_clamps_attempts_to_at_least_one() {
        let c = PipelineConfig::builder().max_attempts(0).build().unwrap();
        assert_eq!(c.max_attempts, 1);
    }

    #[test]
    fn builder_round_trips_caps() {
        let c = PipelineConfig::builder()
            .max_pages_classification(3)
            .max_pages_extraction(7)
            .max_prompt_chars_extraction(9000)
            .build()
            .unwrap();
        assert_eq!(c.max_pages_classification, Some(3));
        assert_eq!(c.max_pages_extraction, Some(7));
        assert_eq!(c.max_prompt_chars_extraction, Some(9000));
    }

    #[test]
    fn debug_does_not_require_oracle_debug() {
        let c = PipelineConfig::default();
        let s = format!("{c:?}");
        assert!(s.contains("gpt-4o-mini"));
    }
}
