//! Integration tests for the document pipeline, driven end-to-end through
//! [`DocumentPipeline`] against a scripted [`MockOracle`]. No network, no
//! API key, no PDFs: pages are constructed in memory and the oracle
//! replies are scripted per test.

use docpipe::{
    derive_actions, DocPipeError, DocumentMetadata, DocumentPipeline, DocumentType, MockOracle,
    Page, PipelineConfig, Priority, Usage,
};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn pages(texts: &[&str]) -> Vec<Page> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| Page {
            number: i + 1,
            text: t.to_string(),
        })
        .collect()
}

/// Pipeline over a mock oracle with a 1 ms retry delay so retry tests
/// stay fast.
fn mock_pipeline() -> (Arc<MockOracle>, DocumentPipeline) {
    let oracle = Arc::new(MockOracle::new());
    let config = PipelineConfig::builder()
        .retry_delay_ms(1)
        .build()
        .unwrap();
    let pipeline = DocumentPipeline::with_oracle(config, oracle.clone());
    (oracle, pipeline)
}

fn no_label_candidates(oracle: &MockOracle) {
    oracle.push_candidates(vec![("Inv", -0.1), ("oice", -0.2), ("##", -3.0)], Usage::default());
}

// ── Classification ───────────────────────────────────────────────────────────

#[tokio::test]
async fn classify_returns_top_label_and_confidence() {
    let (oracle, pipeline) = mock_pipeline();
    oracle.push_candidates(
        vec![("Invoice", -0.05), (" Contract", -3.5), ("Other", -6.0)],
        Usage {
            input_tokens: 750,
            output_tokens: 1,
        },
    );

    let c = pipeline
        .classify(&pages(&["INVOICE #1234", "Net 30"]))
        .await
        .unwrap();

    assert_eq!(c.doc_type, DocumentType::Invoice);
    assert!(c.confidence > 0.9 && c.confidence <= 1.0);
    assert_eq!(pipeline.total_input_tokens(), 750);
}

#[tokio::test]
async fn classify_retries_three_times_then_propagates_format_error() {
    let (oracle, pipeline) = mock_pipeline();
    no_label_candidates(&oracle);
    no_label_candidates(&oracle);
    no_label_candidates(&oracle);

    let err = pipeline.classify(&pages(&["gibberish"])).await.unwrap_err();

    assert_eq!(oracle.token_calls(), 3);
    assert!(matches!(err, DocPipeError::ClassificationFormat { .. }));
    // Nothing accumulated from failed attempts.
    assert_eq!(pipeline.total_input_tokens(), 0);
}

#[tokio::test]
async fn classify_recovers_when_a_retry_succeeds() {
    let (oracle, pipeline) = mock_pipeline();
    no_label_candidates(&oracle);
    oracle.push_candidates(vec![("Contract", -0.2)], Usage::default());

    let c = pipeline.classify(&pages(&["AGREEMENT"])).await.unwrap();

    assert_eq!(oracle.token_calls(), 2);
    assert_eq!(c.doc_type, DocumentType::Contract);
}

#[tokio::test]
async fn classify_does_not_retry_transport_errors() {
    let (oracle, pipeline) = mock_pipeline();
    oracle.push_token_error(DocPipeError::OracleTransport {
        detail: "connection refused".into(),
    });

    let err = pipeline.classify(&pages(&["text"])).await.unwrap_err();

    assert_eq!(oracle.token_calls(), 1);
    assert!(matches!(err, DocPipeError::OracleTransport { .. }));
}

#[tokio::test]
async fn classify_does_not_retry_unexpected_response_shape() {
    let (oracle, pipeline) = mock_pipeline();
    oracle.push_token_error(DocPipeError::UnexpectedOracleResponse {
        detail: "no logprobs".into(),
    });

    let err = pipeline.classify(&pages(&["text"])).await.unwrap_err();

    assert_eq!(oracle.token_calls(), 1);
    assert!(matches!(err, DocPipeError::UnexpectedOracleResponse { .. }));
}

#[tokio::test]
async fn classifier_prompt_contains_only_first_ten_pages_in_order() {
    let (oracle, pipeline) = mock_pipeline();
    oracle.push_candidates(vec![("Other", -0.1)], Usage::default());

    let texts: Vec<String> = (1..=15).map(|i| format!("page-{i}-marker")).collect();
    let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
    pipeline.classify(&pages(&refs)).await.unwrap();

    let prompt = &oracle.token_prompts()[0];
    for i in 1..=10 {
        assert!(prompt.contains(&format!("page-{i}-marker")), "page {i} missing");
    }
    for i in 11..=15 {
        assert!(!prompt.contains(&format!("page-{i}-marker")), "page {i} leaked");
    }
    let first = prompt.find("page-1-marker").unwrap();
    let tenth = prompt.find("page-10-marker").unwrap();
    assert!(first < tenth);
}

#[tokio::test]
async fn classifier_prompt_is_char_truncated_to_an_exact_prefix() {
    let oracle = Arc::new(MockOracle::new());
    let config = PipelineConfig::builder()
        .max_prompt_chars_classification(120)
        .retry_delay_ms(1)
        .build()
        .unwrap();
    let pipeline = DocumentPipeline::with_oracle(config, oracle.clone());
    oracle.push_candidates(vec![("Other", -0.1)], Usage::default());

    let long_text: String = ('a'..='z').cycle().take(500).collect();
    pipeline.classify(&pages(&[&long_text])).await.unwrap();

    let prompt = &oracle.token_prompts()[0];
    // The embedded sample is exactly the first 120 characters, and the
    // 121st character of the original text appears nowhere.
    assert!(prompt.contains(&long_text[..120]));
    assert!(!prompt.contains(&long_text[..121]));
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn extract_parses_schema_for_classified_type() {
    let (oracle, pipeline) = mock_pipeline();
    oracle.push_text(
        r#"{"vendor": "Acme Corp", "amount": 500, "due_date": "2024-05-01", "line_items": null}"#,
        Usage {
            input_tokens: 1200,
            output_tokens: 35,
        },
    );

    let metadata = pipeline
        .extract_metadata(&pages(&["INVOICE #1234"]), DocumentType::Invoice)
        .await
        .unwrap();

    match &metadata {
        DocumentMetadata::Invoice(inv) => {
            assert_eq!(inv.vendor.as_deref(), Some("Acme Corp"));
            assert_eq!(inv.amount, Some(500.0));
        }
        other => panic!("wrong variant: {other:?}"),
    }
    assert_eq!(pipeline.total_output_tokens(), 35);
}

#[tokio::test]
async fn extract_retries_on_unparsable_text_then_propagates_with_raw() {
    let (oracle, pipeline) = mock_pipeline();
    for _ in 0..3 {
        oracle.push_text("Sorry, I can't help with that.", Usage::default());
    }

    let err = pipeline
        .extract_metadata(&pages(&["doc"]), DocumentType::Contract)
        .await
        .unwrap_err();

    assert_eq!(oracle.text_calls(), 3);
    match err {
        DocPipeError::MetadataParse { doc_type, raw, .. } => {
            assert_eq!(doc_type, DocumentType::Contract);
            assert_eq!(raw, "Sorry, I can't help with that.");
        }
        other => panic!("wrong error: {other:?}"),
    }
}

#[tokio::test]
async fn unsupported_type_string_fails_without_any_oracle_call() {
    let (oracle, _pipeline) = mock_pipeline();

    // The string boundary is where an unknown type is rejected; it never
    // constructs a DocumentType, so extraction cannot even be requested.
    let err = "PurchaseOrder".parse::<DocumentType>().unwrap_err();

    assert!(matches!(
        err,
        DocPipeError::UnsupportedDocumentType { doc_type } if doc_type == "PurchaseOrder"
    ));
    assert_eq!(oracle.token_calls(), 0);
    assert_eq!(oracle.text_calls(), 0);
}

#[tokio::test]
async fn report_parses_as_earnings_and_uses_the_report_schema() {
    let (oracle, pipeline) = mock_pipeline();
    oracle.push_text(
        r#"{"reporting_period": "FY2024", "key_metrics": [{"name": "Revenue", "value": "$1.2B"}], "executive_summary": null}"#,
        Usage::default(),
    );

    let doc_type: DocumentType = "Report".parse().unwrap();
    assert_eq!(doc_type, DocumentType::Earnings);

    let metadata = pipeline
        .extract_metadata(&pages(&["FY2024 results"]), doc_type)
        .await
        .unwrap();
    assert_eq!(metadata.doc_type(), DocumentType::Earnings);
}

#[tokio::test]
async fn fenced_json_replies_still_extract() {
    let (oracle, pipeline) = mock_pipeline();
    oracle.push_text(
        "```json\n{\"summary\": \"An internal memo about parking.\"}\n```",
        Usage::default(),
    );

    let metadata = pipeline
        .extract_metadata(&pages(&["memo"]), DocumentType::Other)
        .await
        .unwrap();
    match metadata {
        DocumentMetadata::Other(o) => {
            assert_eq!(o.summary.as_deref(), Some("An internal memo about parking."));
        }
        other => panic!("wrong variant: {other:?}"),
    }
    assert_eq!(oracle.text_calls(), 1);
}

// ── Cost accounting ──────────────────────────────────────────────────────────

#[tokio::test]
async fn estimated_cost_uses_the_per_million_rate_table() {
    let (oracle, pipeline) = mock_pipeline();
    // 2M input / 0.5M output across two calls.
    oracle.push_candidates(
        vec![("Other", -0.1)],
        Usage {
            input_tokens: 1_500_000,
            output_tokens: 300_000,
        },
    );
    oracle.push_text(
        "{}",
        Usage {
            input_tokens: 500_000,
            output_tokens: 200_000,
        },
    );

    let p = pages(&["text"]);
    let c = pipeline.classify(&p).await.unwrap();
    pipeline.extract_metadata(&p, c.doc_type).await.unwrap();

    // 2 * 0.60 + 0.5 * 2.40 = 2.40
    assert!((pipeline.estimated_cost_at(0.60, 2.40) - 2.40).abs() < 1e-9);
}

// ── Full flow and actions ────────────────────────────────────────────────────

#[tokio::test]
async fn classify_extract_derive_full_flow() {
    let (oracle, pipeline) = mock_pipeline();
    oracle.push_candidates(
        vec![("Invoice", -0.02), ("Other", -4.5)],
        Usage {
            input_tokens: 640,
            output_tokens: 1,
        },
    );
    oracle.push_text(
        r#"{"vendor": "Acme", "amount": 500, "due_date": "2024-05-01",
            "line_items": [{"description": "Consulting", "quantity": 1, "amount": 500}]}"#,
        Usage {
            input_tokens: 700,
            output_tokens: 60,
        },
    );

    let p = pages(&["INVOICE\nAcme\nTotal: $500\nDue: 2024-05-01"]);
    let classification = pipeline.classify(&p).await.unwrap();
    let metadata = pipeline
        .extract_metadata(&p, classification.doc_type)
        .await
        .unwrap();

    let actions = derive_actions(&metadata);
    let kinds: Vec<&str> = actions.iter().map(|a| a.kind.as_str()).collect();
    assert_eq!(kinds, ["talk_to_finance_team", "payment_due"]);
    assert_eq!(actions[0].priority, Priority::Medium);
    assert_eq!(actions[1].priority, Priority::High);
    assert_eq!(actions[1].deadline.as_deref(), Some("2024-05-01"));

    assert_eq!(pipeline.total_input_tokens(), 1340);
    assert_eq!(pipeline.total_output_tokens(), 61);
    assert_eq!(pipeline.supported_types().len(), 4);
}
