use super::*;
use scrubgate_core::{EntityRecognizer, LanguageDetector, MaskingMode};
use scrubgate_pii::RecognizerRegistry;
use std::time::Duration;

/// Finds fixed PERSON names and anything shaped like an email.
struct StubRecognizer {
    language: &'static str,
    delay: Option<Duration>,
}

const NAMES: &[&str] = &["John Doe", "Jane Roe", "Hans Müller"];

impl EntityRecognizer for StubRecognizer {
    fn language(&self) -> &str {
        self.language
    }

    fn analyze(&self, text: &str, entities: Option<&[String]>) -> Result<Vec<EntitySpan>> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let wanted = |ty: &str| entities.is_none_or(|list| list.iter().any(|e| e == ty));
        let mut spans = Vec::new();

        if wanted("PERSON") {
            for name in NAMES {
                for (start, _) in text.match_indices(name) {
                    spans.push(EntitySpan::new("PERSON", start, start + name.len(), 0.85));
                }
            }
        }

        if wanted("EMAIL_ADDRESS") {
            let mut offset = 0;
            for word in text.split(' ') {
                if word.contains('@') {
                    spans.push(EntitySpan::new(
                        "EMAIL_ADDRESS",
                        offset,
                        offset + word.len(),
                        1.0,
                    ));
                }
                offset += word.len() + 1;
            }
        }

        spans.sort_by_key(|s| s.start);
        Ok(spans)
    }

    fn supported_entities(&self) -> Vec<String> {
        vec!["PERSON".to_string(), "EMAIL_ADDRESS".to_string()]
    }
}

struct NoDetection;

impl LanguageDetector for NoDetection {
    fn detect(&self, _text: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

fn orchestrator_with(delay: Option<Duration>, limits: ResourceLimits) -> Orchestrator {
    let registry = RecognizerRegistry::builder()
        .with_recognizer(Arc::new(StubRecognizer {
            language: "en",
            delay: None,
        }))
        .with_recognizer(Arc::new(StubRecognizer {
            language: "de",
            delay,
        }))
        .build()
        .unwrap();

    let selector = LanguageSelector::new(
        vec!["en".to_string(), "de".to_string()],
        "en",
        true,
        Arc::new(NoDetection),
    );

    Orchestrator::new(
        Arc::new(registry),
        selector,
        limits,
        PipelineDefaults::default(),
    )
    .unwrap()
}

fn orchestrator() -> Orchestrator {
    orchestrator_with(None, ResourceLimits::default())
}

fn request(json: serde_json::Value) -> AnalysisRequest {
    serde_json::from_value(json).unwrap()
}

const SCENARIO: &str = "Contact John Doe at john@example.com";

#[tokio::test]
async fn test_replace_scenario() {
    let outcome = orchestrator()
        .process(request(serde_json::json!({
            "text": SCENARIO,
            "masking_mode": "replace"
        })))
        .await
        .unwrap();

    assert_eq!(outcome.masked_text, "Contact <PERSON> at <EMAIL_ADDRESS>");
    assert_eq!(outcome.entities_found.len(), 2);
    assert_eq!(outcome.entities_found[0].entity_type, "PERSON");
    assert_eq!(outcome.entities_found[1].entity_type, "EMAIL_ADDRESS");
    assert!(outcome.entities_found[0].start < outcome.entities_found[1].start);
    assert_eq!(outcome.detected_language, "en");
    assert!(outcome.processing_time_ms >= 0.0);
}

#[tokio::test]
async fn test_processing_time_counts_from_acceptance() {
    let accepted_at = Instant::now()
        .checked_sub(Duration::from_millis(50))
        .unwrap();

    let outcome = orchestrator()
        .process_since(request(serde_json::json!({ "text": SCENARIO })), accepted_at)
        .await
        .unwrap();

    assert!(outcome.processing_time_ms >= 50.0);
}

#[tokio::test]
async fn test_detect_returns_text_unchanged() {
    let outcome = orchestrator()
        .process(request(serde_json::json!({ "text": SCENARIO, "mode": "detect" })))
        .await
        .unwrap();

    assert_eq!(outcome.masked_text, SCENARIO);
    assert_eq!(outcome.entities_found.len(), 2);
    for span in &outcome.entities_found {
        let slice = &SCENARIO[span.start..span.end];
        match span.entity_type.as_str() {
            "PERSON" => assert_eq!(slice, "John Doe"),
            "EMAIL_ADDRESS" => assert_eq!(slice, "john@example.com"),
            other => panic!("unexpected entity {other}"),
        }
    }
}

#[tokio::test]
async fn test_default_mode_is_redact_mask() {
    let outcome = orchestrator()
        .process(request(serde_json::json!({ "text": SCENARIO })))
        .await
        .unwrap();

    assert_eq!(outcome.masked_text, "Contact ██████ at ██████");
}

#[tokio::test]
async fn test_skip_wins_over_allow() {
    let outcome = orchestrator()
        .process(request(serde_json::json!({
            "text": SCENARIO,
            "masking_mode": "replace",
            "entities": ["PERSON", "EMAIL_ADDRESS"],
            "skip_entities": ["EMAIL_ADDRESS"]
        })))
        .await
        .unwrap();

    assert!(outcome.entities_found.iter().all(|s| s.entity_type == "PERSON"));
    assert_eq!(outcome.entities_found.len(), 1);
    assert_eq!(outcome.masked_text, "Contact <PERSON> at john@example.com");
}

#[tokio::test]
async fn test_hash_consistency_within_request() {
    let outcome = orchestrator()
        .process(request(serde_json::json!({
            "text": "a john@example.com b john@example.com c jane@example.com",
            "masking_mode": "hash"
        })))
        .await
        .unwrap();

    assert_eq!(
        outcome.masked_text,
        "a <HASH:855f96e9> b <HASH:855f96e9> c <HASH:8c87b489>"
    );
}

#[tokio::test]
async fn test_preprocessing_offsets_refer_to_normalized_text() {
    let raw = "Contact\\n\\n  John Doe   at john@example.com";
    let outcome = orchestrator()
        .process(request(serde_json::json!({
            "text": raw,
            "mode": "detect",
            "enable_preprocessing": true
        })))
        .await
        .unwrap();

    assert_eq!(outcome.masked_text, SCENARIO);
    let person = &outcome.entities_found[0];
    assert_eq!(&outcome.masked_text[person.start..person.end], "John Doe");
}

#[tokio::test]
async fn test_explicit_language_routes_to_recognizer() {
    let outcome = orchestrator()
        .process(request(serde_json::json!({
            "text": "Mein Name ist Hans Müller",
            "language": "de",
            "masking_mode": "replace"
        })))
        .await
        .unwrap();

    assert_eq!(outcome.detected_language, "de");
    assert_eq!(outcome.masked_text, "Mein Name ist <PERSON>");
}

#[tokio::test]
async fn test_unsupported_language_falls_back_to_default() {
    let outcome = orchestrator()
        .process(request(serde_json::json!({ "text": SCENARIO, "language": "ja" })))
        .await
        .unwrap();
    assert_eq!(outcome.detected_language, "en");
}

#[tokio::test]
async fn test_empty_text_is_validation_error() {
    let err = orchestrator()
        .process(request(serde_json::json!({ "text": "" })))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::Validation("Missing text in request body".to_string())
    );
}

#[tokio::test]
async fn test_size_boundary() {
    let orch = orchestrator_with(
        None,
        ResourceLimits {
            max_text_chars: 20,
            ..Default::default()
        },
    );

    let at_limit = "x".repeat(20);
    assert!(orch
        .process(request(serde_json::json!({ "text": at_limit })))
        .await
        .is_ok());

    let over = "x".repeat(21);
    assert_eq!(
        orch.process(request(serde_json::json!({ "text": over })))
            .await
            .unwrap_err(),
        Error::PayloadTooLarge { size: 21, max: 20 }
    );
}

#[tokio::test]
async fn test_entity_ceiling_fails_whole_request() {
    let orch = orchestrator_with(
        None,
        ResourceLimits {
            max_entities: 1,
            ..Default::default()
        },
    );

    let err = orch
        .process(request(serde_json::json!({ "text": SCENARIO })))
        .await
        .unwrap_err();
    assert_eq!(err, Error::TooManyEntities { found: 2, max: 1 });
}

#[tokio::test]
async fn test_deadline_aborts_slow_recognizer() {
    let orch = orchestrator_with(
        Some(Duration::from_millis(500)),
        ResourceLimits {
            processing_timeout_ms: 30,
            ..Default::default()
        },
    );

    let err = orch
        .process(request(serde_json::json!({ "text": "Hans Müller", "language": "de" })))
        .await
        .unwrap_err();
    assert_eq!(err, Error::ProcessingTimeout { timeout_ms: 30 });

    // Other languages keep working after an abandoned run
    assert!(orch
        .process(request(serde_json::json!({ "text": SCENARIO, "language": "en" })))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_invalid_masking_char_rejected_before_analysis() {
    let err = orchestrator()
        .process(request(serde_json::json!({ "text": SCENARIO, "masking_char": "##" })))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_idempotent_redact() {
    let orch = orchestrator();
    let req = serde_json::json!({ "text": SCENARIO, "masking_mode": "redact", "masking_char": "*" });

    let first = orch.process(request(req.clone())).await.unwrap();
    let second = orch.process(request(req)).await.unwrap();
    assert_eq!(first.masked_text, second.masked_text);
    assert_eq!(first.masked_text, "Contact ****** at ******");
}

#[test]
fn test_missing_recognizer_rejected_at_construction() {
    let registry = RecognizerRegistry::builder()
        .with_recognizer(Arc::new(StubRecognizer {
            language: "en",
            delay: None,
        }))
        .build()
        .unwrap();
    let selector = LanguageSelector::new(
        vec!["en".to_string(), "de".to_string()],
        "en",
        false,
        Arc::new(NoDetection),
    );

    let result = Orchestrator::new(
        Arc::new(registry),
        selector,
        ResourceLimits::default(),
        PipelineDefaults {
            masking_mode: MaskingMode::Replace,
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(Error::Config(_))));
}
