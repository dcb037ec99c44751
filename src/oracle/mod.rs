//! The LLM oracle boundary.
//!
//! The pipeline treats the language model as a black box reachable through
//! the [`Oracle`] trait, in two modes:
//!
//! * [`Oracle::classify_token`] — generate exactly one token and return the
//!   top-K candidate tokens with their log-likelihoods. Classification
//!   turns these into a probability distribution over the label set.
//! * [`Oracle::complete`] — ordinary system+user free-text completion,
//!   used for metadata extraction.
//!
//! Keeping the seam at a trait object (`Arc<dyn Oracle>`) means tests run
//! against [`MockOracle`] with scripted responses and zero network I/O,
//! and a different provider can be slotted in without touching any
//! pipeline stage.

pub mod mock;
pub mod openai;

use crate::error::DocPipeError;
use async_trait::async_trait;

pub use mock::MockOracle;
pub use openai::OpenAiOracle;

/// One candidate for a generated token position.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenCandidate {
    /// The raw token text, untrimmed (leading spaces are part of the token).
    pub token: String,
    /// Natural-log likelihood of this token at this position.
    pub logprob: f64,
}

/// Token counts reported by the provider for a single call.
///
/// Zero when the provider omits usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Request for a single-token generation with candidate log-likelihoods.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub prompt: String,
    /// How many candidates to return for the generated position.
    pub top_k: usize,
}

/// Response to a [`TokenRequest`].
#[derive(Debug, Clone, Default)]
pub struct TokenResponse {
    /// Candidates for the single generated position, most likely first.
    pub candidates: Vec<TokenCandidate>,
    pub usage: Usage,
}

/// Request for a free-text completion.
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub system: String,
    pub user: String,
    /// Upper bound on generated tokens.
    pub max_tokens: usize,
}

/// Response to a [`TextRequest`].
#[derive(Debug, Clone, Default)]
pub struct TextResponse {
    pub text: String,
    pub usage: Usage,
}

/// A language-model backend.
///
/// Both calls run at sampling temperature 0 so that identical inputs give
/// identical outputs; the pipeline's determinism rests on it.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generate one token and report the top-K candidates for it.
    async fn classify_token(&self, request: &TokenRequest) -> Result<TokenResponse, DocPipeError>;

    /// Generate free text from a system + user message pair.
    async fn complete(&self, request: &TextRequest) -> Result<TextResponse, DocPipeError>;
}
