//! Pipeline stages for document analysis.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different PDF text backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! load ──▶ classify ──▶ extract
//! (pdfium)  (logprobs    (free text
//!            → softmax)   → schema)
//! ```
//!
//! 1. [`load`]     — extract per-page text from the PDF; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`classify`] — one-token oracle call, label probabilities from the
//!    candidate log-likelihoods
//! 3. [`extract`]  — type-specific free-text oracle call, strict JSON
//!    parse into the matching metadata schema

pub mod classify;
pub mod extract;
pub mod load;

use crate::error::DocPipeError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Run `op` up to `max_attempts` times, sleeping `delay` between attempts.
///
/// Only errors for which [`DocPipeError::is_retryable`] holds are retried —
/// i.e. malformed oracle output. Anything else (transport, unsupported
/// type, bad input) aborts on first occurrence, and after the final attempt
/// the last error propagates to the caller unmodified.
pub(crate) async fn retry_parse_failures<T, F, Fut>(
    max_attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T, DocPipeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DocPipeError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %e, "retrying after malformed oracle output");
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
