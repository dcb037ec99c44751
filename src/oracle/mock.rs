//! Deterministic scripted oracle for tests.
//!
//! No network, no model: each call pops the next scripted response from a
//! queue and records the prompt it was given. Tests assert on both sides —
//! what the pipeline sent (page truncation, prompt contents) and how it
//! handled what came back (retries, parse failures, accounting).
//!
//! The mock is part of the public API, not `#[cfg(test)]`, so downstream
//! crates can exercise their own integration against the pipeline without
//! an API key.

use crate::error::DocPipeError;
use crate::oracle::{Oracle, TextRequest, TextResponse, TokenCandidate, TokenRequest, TokenResponse, Usage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A scripted [`Oracle`] with recorded prompts and call counts.
#[derive(Default)]
pub struct MockOracle {
    token_script: Mutex<VecDeque<Result<TokenResponse, DocPipeError>>>,
    text_script: Mutex<VecDeque<Result<TextResponse, DocPipeError>>>,
    token_prompts: Mutex<Vec<String>>,
    text_prompts: Mutex<Vec<(String, String)>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next `classify_token` response as a candidate list.
    pub fn push_candidates(&self, candidates: Vec<(&str, f64)>, usage: Usage) {
        let response = TokenResponse {
            candidates: candidates
                .into_iter()
                .map(|(token, logprob)| TokenCandidate {
                    token: token.to_string(),
                    logprob,
                })
                .collect(),
            usage,
        };
        self.token_script.lock().unwrap().push_back(Ok(response));
    }

    /// Script the next `classify_token` call to fail.
    pub fn push_token_error(&self, error: DocPipeError) {
        self.token_script.lock().unwrap().push_back(Err(error));
    }

    /// Script the next `complete` response.
    pub fn push_text(&self, text: &str, usage: Usage) {
        self.text_script.lock().unwrap().push_back(Ok(TextResponse {
            text: text.to_string(),
            usage,
        }));
    }

    /// Script the next `complete` call to fail.
    pub fn push_text_error(&self, error: DocPipeError) {
        self.text_script.lock().unwrap().push_back(Err(error));
    }

    /// Number of `classify_token` calls received so far.
    pub fn token_calls(&self) -> usize {
        self.token_prompts.lock().unwrap().len()
    }

    /// Number of `complete` calls received so far.
    pub fn text_calls(&self) -> usize {
        self.text_prompts.lock().unwrap().len()
    }

    /// Prompts received by `classify_token`, in call order.
    pub fn token_prompts(&self) -> Vec<String> {
        self.token_prompts.lock().unwrap().clone()
    }

    /// `(system, user)` message pairs received by `complete`, in call order.
    pub fn text_prompts(&self) -> Vec<(String, String)> {
        self.text_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn classify_token(&self, request: &TokenRequest) -> Result<TokenResponse, DocPipeError> {
        self.token_prompts
            .lock()
            .unwrap()
            .push(request.prompt.clone());
        self.token_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(DocPipeError::Internal(
                    "MockOracle: no scripted classify_token response left".to_string(),
                ))
            })
    }

    async fn complete(&self, request: &TextRequest) -> Result<TextResponse, DocPipeError> {
        self.text_prompts
            .lock()
            .unwrap()
            .push((request.system.clone(), request.user.clone()));
        self.text_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(DocPipeError::Internal(
                    "MockOracle: no scripted complete response left".to_string(),
                ))
            })
    }
}
