use diagreport::core::{DiagnosticPayload, ReadinessVerdict};
use diagreport::generate::{FixedClock, InputRecord, PayloadGenerator};
use time::macros::datetime;

fn generator() -> PayloadGenerator<FixedClock> {
    PayloadGenerator::new(FixedClock(datetime!(2026-01-01 00:00:00 UTC)))
}

fn input(json: &str) -> InputRecord {
    serde_json::from_str(json).expect("parse input")
}

fn golden_payload(name: &str) -> DiagnosticPayload {
    let path = format!("{}/tests/golden/{name}.json", env!("CARGO_MANIFEST_DIR"));
    let text = std::fs::read_to_string(&path).expect("read golden payload");
    serde_json::from_str(&text).expect("parse golden payload")
}

#[test]
fn codes_and_detailed_symptoms_are_ready_without_uplift() {
    let symptoms = "s".repeat(150);
    let p = generator().generate(&input(&format!(
        r#"{{"codes": ["P0301"], "symptoms": "{symptoms}"}}"#
    )));

    assert_eq!(p.confidence.score_pct, 88);
    assert_eq!(p.confidence.threshold_pct, 85);
    assert!(p.confidence_uplift_requirements.is_empty());
    assert_eq!(
        p.customer_readiness_check.verdict,
        Some(ReadinessVerdict::ReadyForCustomer)
    );
    assert_eq!(
        p.customer_readiness_check.short_reason,
        "Confidence at 88%, actionable steps provided, safety covered, cost estimates present"
    );
}

#[test]
fn sparse_input_needs_revision_and_lists_uplift() {
    let p = generator().generate(&input(r#"{"codes": [], "symptoms": "short"}"#));

    assert_eq!(p.confidence.score_pct, 72);
    assert_eq!(
        p.customer_readiness_check.verdict,
        Some(ReadinessVerdict::NeedsRevision)
    );
    assert!(!p.confidence_uplift_requirements.is_empty());
    assert!(p.confidence_uplift_requirements.len() <= 8);
}

#[test]
fn high_caller_threshold_adds_uplift_but_keeps_verdict() {
    let symptoms = "s".repeat(150);
    let p = generator().generate(&input(&format!(
        r#"{{"codes": ["P0301"], "symptoms": "{symptoms}", "confidence_threshold_pct": 95}}"#
    )));

    assert_eq!(p.confidence.score_pct, 88);
    assert_eq!(p.confidence.threshold_pct, 95);
    assert!(!p.confidence_uplift_requirements.is_empty());
    assert_eq!(
        p.customer_readiness_check.verdict,
        Some(ReadinessVerdict::ReadyForCustomer)
    );
}

#[test]
fn generated_lists_respect_caps() {
    let p = generator().generate(&InputRecord::default());
    assert!(p.root_cause_hypotheses.len() <= 5);
    assert!(p.recommended_actions.len() <= 8);
    assert!(p.tools_parts.len() <= 12);
    assert!(p.safety_notes.len() <= 6);
    assert!(p.warranty_or_tsb_refs.len() <= 8);
    assert!(p.disclaimers.len() <= 10);
    assert!(p.confidence_uplift_requirements.len() <= 8);
    assert!(p.customer_readiness_check.short_reason.chars().count() <= 220);
}

#[test]
fn generator_reproduces_corpus_payloads() {
    let a = generator().generate(&input(
        r#"{
            "submissionId": "DP-2026-0001",
            "customer": {"email": "dana@example.com", "name": "Dana Reyes"},
            "equipment": {"type": "vehicle", "make": "Ford", "model": "F-150", "year": "2006"},
            "symptoms": "Engine misfires at idle and under light load, check engine light flashing intermittently, rough acceleration between 1500 and 2500 rpm, worse when cold.",
            "codes": ["P0301"]
        }"#,
    ));
    assert_eq!(a, golden_payload("mock_A"));

    let b = generator().generate(&input(
        r#"{
            "submissionId": "DP-2026-0002",
            "customer": {"email": "sam@example.com", "name": "Sam Ortiz"},
            "equipment": {"type": "generator"},
            "symptoms": "short",
            "codes": []
        }"#,
    ));
    assert_eq!(b, golden_payload("mock_B"));
}

#[test]
fn serialized_payload_uses_schema_field_names() {
    let p = generator().generate(&InputRecord::default());
    let v = serde_json::to_value(&p).expect("serialize");

    assert_eq!(v["submissionId"], "MOCK-0001");
    assert_eq!(v["equipment"]["type"], "vehicle");
    assert!(v["equipment"]["year"].is_null());
    assert_eq!(v["customer_readiness_check"]["verdict"], "needs_revision");
    assert_eq!(v["root_cause_hypotheses"][0]["likelihood"], "high");
    assert_eq!(v["meta"]["generated_at_iso"], "2026-01-01T00:00:00Z");
}
