//! Label classification from next-token log-likelihoods.
//!
//! Rather than asking the model to explain itself, the classifier requests
//! a single output token with its top-K candidates and reads the label
//! distribution straight out of the log-likelihoods. One token costs the
//! minimum possible, cannot ramble, and the candidate list yields an
//! honest confidence score instead of a self-reported one.
//!
//! The score is the softmax-normalised probability mass of the winning
//! label **among the labels that appeared in the candidate list**. If a
//! label never shows up in the top K its mass is silently excluded, which
//! inflates the remaining scores; the classifier logs when that happens so
//! a skewed candidate set is visible in traces rather than indistinguishable
//! from a genuinely confident call.

use crate::config::PipelineConfig;
use crate::error::DocPipeError;
use crate::labels::DocumentType;
use crate::oracle::{Oracle, TokenRequest, Usage};
use crate::output::Classification;
use crate::pipeline::load::Page;
use crate::prompts;
use tracing::{debug, warn};

/// Classifies page text into one of the known document types.
#[derive(Debug, Clone)]
pub struct Classifier {
    max_pages: Option<usize>,
    max_prompt_chars: Option<usize>,
    top_k: usize,
}

impl Classifier {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            max_pages: config.max_pages_classification,
            max_prompt_chars: config.max_prompt_chars_classification,
            top_k: config.top_candidates,
        }
    }

    /// Assemble the classification prompt from (capped) page text.
    ///
    /// Public within the crate so tests can verify truncation without an
    /// oracle round trip.
    pub(crate) fn build_prompt(&self, pages: &[Page]) -> String {
        let sample = sample_text(pages, self.max_pages, self.max_prompt_chars);
        prompts::classification_prompt(&sample)
    }

    /// Classify the document and return the winning label with confidence,
    /// along with the oracle call's token usage.
    pub async fn classify(
        &self,
        oracle: &dyn Oracle,
        pages: &[Page],
    ) -> Result<(Classification, Usage), DocPipeError> {
        let request = TokenRequest {
            prompt: self.build_prompt(pages),
            top_k: self.top_k,
        };

        let response = oracle.classify_token(&request).await?;

        // Keep the first candidate per label: candidates arrive most likely
        // first, so the first spelling of a label is its best tokenisation.
        let mut label_logprobs: [Option<f64>; 4] = [None; 4];
        for candidate in &response.candidates {
            let trimmed = candidate.token.trim();
            for (slot, label) in label_logprobs.iter_mut().zip(DocumentType::ALL) {
                if label.as_str() == trimmed && slot.is_none() {
                    *slot = Some(candidate.logprob);
                }
            }
        }

        // (label, logprob) pairs in canonical label order; the order is the
        // tie-break rule.
        let matched: Vec<(DocumentType, f64)> = DocumentType::ALL
            .iter()
            .zip(label_logprobs)
            .filter_map(|(label, lp)| lp.map(|lp| (*label, lp)))
            .collect();

        if matched.is_empty() {
            return Err(DocPipeError::ClassificationFormat {
                candidates: response
                    .candidates
                    .iter()
                    .map(|c| c.token.trim().to_string())
                    .collect(),
            });
        }

        if matched.len() == 1 {
            warn!(
                label = matched[0].0.as_str(),
                "only one label among token candidates; confidence is trivially 1.0"
            );
        } else if matched.len() < DocumentType::ALL.len() {
            debug!(
                matched = matched.len(),
                "confidence renormalised over a truncated label subset"
            );
        }

        let logprobs: Vec<f64> = matched.iter().map(|(_, lp)| *lp).collect();
        let probs = softmax(&logprobs);

        let mut best = 0;
        for i in 1..probs.len() {
            if probs[i] > probs[best] {
                best = i;
            }
        }

        debug!(
            label = matched[best].0.as_str(),
            confidence = probs[best],
            "classified document"
        );

        Ok((
            Classification {
                doc_type: matched[best].0,
                confidence: probs[best],
            },
            response.usage,
        ))
    }
}

/// Join page texts in order and apply the page / character caps.
///
/// The character cut is a plain prefix — cheap, predictable, and safe
/// because it can only ever clip the tail of the sample.
pub(crate) fn sample_text(
    pages: &[Page],
    max_pages: Option<usize>,
    max_chars: Option<usize>,
) -> String {
    let capped = match max_pages {
        Some(n) => &pages[..pages.len().min(n)],
        None => pages,
    };

    let mut sample = capped
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    if let Some(limit) = max_chars {
        if sample.len() > limit {
            // Back off to a char boundary so the cut never splits a
            // multi-byte character.
            let mut cut = limit;
            while !sample.is_char_boundary(cut) {
                cut -= 1;
            }
            sample.truncate(cut);
        }
    }

    sample
}

/// Numerically stable softmax: shift by the maximum before exponentiating
/// so large-magnitude log-likelihoods cannot overflow.
fn softmax(logprobs: &[f64]) -> Vec<f64> {
    let max = logprobs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logprobs.iter().map(|lp| (lp - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockOracle;

    fn page(number: usize, text: &str) -> Page {
        Page {
            number,
            text: text.to_string(),
        }
    }

    fn classifier() -> Classifier {
        Classifier::new(&PipelineConfig::default())
    }

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(&[-0.2, -1.5, -3.0, -8.0]);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn softmax_is_shift_invariant() {
        let a = softmax(&[-0.5, -2.0, -4.0]);
        let b = softmax(&[99.5, 98.0, 96.0]);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn softmax_survives_extreme_magnitudes() {
        let probs = softmax(&[-1000.0, -1001.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sample_text_caps_pages_in_order() {
        let pages: Vec<Page> = (1..=15).map(|i| page(i, &format!("page-{i}"))).collect();
        let sample = sample_text(&pages, Some(10), None);
        assert!(sample.contains("page-1"));
        assert!(sample.contains("page-10"));
        assert!(!sample.contains("page-11"));
        // Order preserved
        let p1 = sample.find("page-1").unwrap();
        let p9 = sample.find("page-9").unwrap();
        assert!(p1 < p9);
    }

    #[test]
    fn sample_text_char_cap_is_a_prefix() {
        let pages = vec![page(1, &"abcdefgh".repeat(100))];
        let full = sample_text(&pages, None, None);
        let cut = sample_text(&pages, None, Some(33));
        assert_eq!(cut.len(), 33);
        assert_eq!(cut, &full[..33]);
    }

    #[test]
    fn sample_text_char_cap_respects_utf8_boundaries() {
        let pages = vec![page(1, &"é".repeat(100))];
        let cut = sample_text(&pages, None, Some(5));
        assert!(cut.len() <= 5);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn sample_text_joins_with_blank_line() {
        let pages = vec![page(1, "alpha"), page(2, "beta")];
        assert_eq!(sample_text(&pages, None, None), "alpha\n\nbeta");
    }

    #[tokio::test]
    async fn picks_argmax_label_with_softmax_confidence() {
        let oracle = MockOracle::new();
        oracle.push_candidates(
            vec![("Invoice", -0.1), (" Contract", -3.0), ("Other", -5.0)],
            Usage {
                input_tokens: 100,
                output_tokens: 1,
            },
        );

        let (c, usage) = classifier()
            .classify(&oracle, &[page(1, "INVOICE #42")])
            .await
            .unwrap();
        assert_eq!(c.doc_type, DocumentType::Invoice);
        assert!(c.confidence > 0.9 && c.confidence < 1.0);
        assert_eq!(usage.input_tokens, 100);
    }

    #[tokio::test]
    async fn matching_trims_token_whitespace() {
        let oracle = MockOracle::new();
        oracle.push_candidates(vec![(" Earnings", -0.2)], Usage::default());

        let (c, _) = classifier()
            .classify(&oracle, &[page(1, "Q3 results")])
            .await
            .unwrap();
        assert_eq!(c.doc_type, DocumentType::Earnings);
        assert!((c.confidence - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn first_spelling_of_a_label_wins() {
        let oracle = MockOracle::new();
        // Both spellings trim to "Invoice"; the first (more likely) one
        // must supply the logprob.
        oracle.push_candidates(
            vec![("Invoice", -0.1), (" Invoice", -6.0), ("Other", -0.1)],
            Usage::default(),
        );

        let (c, _) = classifier().classify(&oracle, &[page(1, "x")]).await.unwrap();
        // Equal logprobs for Invoice and Other: label order breaks the tie.
        assert_eq!(c.doc_type, DocumentType::Invoice);
        assert!((c.confidence - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn ties_break_in_label_order() {
        let oracle = MockOracle::new();
        oracle.push_candidates(
            vec![("Other", -1.0), ("Contract", -1.0)],
            Usage::default(),
        );

        let (c, _) = classifier().classify(&oracle, &[page(1, "x")]).await.unwrap();
        assert_eq!(c.doc_type, DocumentType::Contract);
    }

    #[tokio::test]
    async fn no_matching_label_is_a_format_error() {
        let oracle = MockOracle::new();
        oracle.push_candidates(vec![("Inv", -0.1), ("##", -0.5)], Usage::default());

        let err = classifier()
            .classify(&oracle, &[page(1, "x")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DocPipeError::ClassificationFormat { candidates }
                if candidates == vec!["Inv".to_string(), "##".to_string()]
        ));
    }

    #[tokio::test]
    async fn prompt_contains_only_capped_pages() {
        let oracle = MockOracle::new();
        oracle.push_candidates(vec![("Other", -0.1)], Usage::default());

        let pages: Vec<Page> = (1..=15).map(|i| page(i, &format!("marker-{i}-end"))).collect();
        classifier().classify(&oracle, &pages).await.unwrap();

        let sent = &oracle.token_prompts()[0];
        assert!(sent.contains("marker-10-end"));
        assert!(!sent.contains("marker-11-end"));
    }
}
