//! Whole-document analysis entry points.
//!
//! [`analyze`] is the one-call API: load → classify → extract, returning a
//! [`DocumentEntry`] plus run statistics. Each call constructs its own
//! [`DocumentPipeline`], so the statistics describe exactly one document;
//! callers that want a shared token ledger across many documents hold a
//! pipeline themselves and drive the stages directly.

use crate::config::PipelineConfig;
use crate::error::DocPipeError;
use crate::manager::DocumentPipeline;
use crate::output::{AnalysisOutput, AnalysisStats, DocumentEntry};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Analyse a PDF document: classify it and extract typed metadata.
///
/// # Errors
/// Fails on unreadable/invalid input files, on oracle transport problems,
/// and when the oracle's output stays malformed through all retry
/// attempts. There is no partial success: either the full entry is
/// produced or the error tells you which stage gave up.
pub async fn analyze(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<AnalysisOutput, DocPipeError> {
    let path = path.as_ref();
    let total_start = Instant::now();
    info!("analysing {}", path.display());

    let pipeline = DocumentPipeline::new(config.clone())?;

    let load_start = Instant::now();
    let pages = pipeline.load(path).await?;
    let load_duration_ms = load_start.elapsed().as_millis() as u64;
    info!("loaded {} pages in {}ms", pages.len(), load_duration_ms);

    let classify_start = Instant::now();
    let classification = pipeline.classify(&pages).await?;
    let classify_duration_ms = classify_start.elapsed().as_millis() as u64;

    let extract_start = Instant::now();
    let metadata = pipeline
        .extract_metadata(&pages, classification.doc_type)
        .await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    let stats = AnalysisStats {
        pages: pages.len(),
        input_tokens: pipeline.total_input_tokens(),
        output_tokens: pipeline.total_output_tokens(),
        load_duration_ms,
        classify_duration_ms,
        extract_duration_ms,
        estimated_cost_usd: pipeline.estimated_cost(),
    };

    info!(
        "analysis complete: {} ({:.2}) in {}ms",
        classification.doc_type,
        classification.confidence,
        total_start.elapsed().as_millis()
    );

    Ok(AnalysisOutput {
        entry: DocumentEntry {
            id: Uuid::new_v4(),
            classification,
            metadata,
        },
        stats,
    })
}

/// Analyse PDF bytes held in memory.
///
/// Writes `bytes` to a managed [`tempfile`] first — the PDF backend needs
/// a file-system path — and cleans it up on return or panic. This is the
/// right entry point when the document arrives as an upload or out of a
/// blob store rather than from disk.
pub async fn analyze_bytes(
    bytes: &[u8],
    config: &PipelineConfig,
) -> Result<AnalysisOutput, DocPipeError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| DocPipeError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| DocPipeError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `analyze` returns
    analyze(tmp.path(), config).await
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<AnalysisOutput, DocPipeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocPipeError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(analyze(path, config))
}

/// Analyse a batch of PDFs with bounded concurrency.
///
/// Results come back in input order, each paired with its path; one bad
/// document does not abort the rest.
pub async fn analyze_many(
    paths: &[PathBuf],
    config: &PipelineConfig,
    concurrency: usize,
) -> Vec<(PathBuf, Result<AnalysisOutput, DocPipeError>)> {
    stream::iter(paths.iter().cloned().map(|path| async move {
        let result = analyze(&path, config).await;
        (path, result)
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{MockOracle, Usage};
    use std::sync::Arc;

    #[tokio::test]
    async fn analyze_missing_file_fails_before_touching_the_oracle() {
        let oracle = Arc::new(MockOracle::new());
        let config = PipelineConfig::builder()
            .oracle(oracle.clone())
            .build()
            .unwrap();

        let err = analyze("/no/such/document.pdf", &config).await.unwrap_err();
        assert!(matches!(err, DocPipeError::FileNotFound { .. }));
        assert_eq!(oracle.token_calls(), 0);
        assert_eq!(oracle.text_calls(), 0);
    }

    #[tokio::test]
    async fn analyze_bytes_rejects_non_pdf_payloads() {
        let oracle = Arc::new(MockOracle::new());
        oracle.push_candidates(vec![("Other", -0.1)], Usage::default());
        let config = PipelineConfig::builder().oracle(oracle).build().unwrap();

        let err = analyze_bytes(b"plain text, no magic", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, DocPipeError::NotAPdf { .. }));
    }
}
