use diagreport::core::{
    Action, Confidence, CostRange, DiagnosticPayload, Hypothesis, Likelihood,
};
use diagreport::render::render;

fn golden_payload(name: &str) -> DiagnosticPayload {
    let path = format!("{}/tests/golden/{name}.json", env!("CARGO_MANIFEST_DIR"));
    let text = std::fs::read_to_string(&path).expect("read golden payload");
    serde_json::from_str(&text).expect("parse golden payload")
}

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}.md", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).expect("read fixture")
}

fn numbered_sections(lines: &[String]) -> Vec<(u32, Vec<String>)> {
    let mut out: Vec<(u32, Vec<String>)> = Vec::new();
    let mut current: Option<(u32, Vec<String>)> = None;
    for line in lines {
        if let Some(rest) = line.strip_prefix("## ") {
            if let Some(done) = current.take() {
                out.push(done);
            }
            let number = rest
                .split_once(". ")
                .and_then(|(n, _)| n.parse::<u32>().ok());
            if let Some(n) = number {
                current = Some((n, Vec::new()));
            }
            continue;
        }
        if let Some((_, body)) = current.as_mut() {
            let t = line.trim();
            if !t.is_empty() && t != "---" {
                body.push(t.to_string());
            }
        }
    }
    if let Some(done) = current {
        out.push(done);
    }
    out
}

fn assert_fourteen_non_empty_sections(lines: &[String]) {
    let sections = numbered_sections(lines);
    let numbers: Vec<u32> = sections.iter().map(|(n, _)| *n).collect();
    assert_eq!(numbers, (1..=14).collect::<Vec<_>>());
    for (n, body) in &sections {
        assert!(!body.is_empty(), "section {n} is empty\n{}", lines.join("\n"));
    }
}

#[test]
fn rendered_reports_match_fixtures() {
    for name in ["mock_A", "mock_B", "mock_H_overflow"] {
        let actual = render(&golden_payload(name)).to_markdown();
        let expected = fixture(name);
        assert_eq!(actual, expected, "fixture mismatch for {name}");
    }
}

#[test]
fn rendering_twice_is_byte_identical_and_leaves_payload_untouched() {
    let payload = golden_payload("mock_H_overflow");
    let before = payload.clone();
    let first = render(&payload).to_markdown();
    let second = render(&payload).to_markdown();
    assert_eq!(first, second);
    assert_eq!(payload, before);
}

#[test]
fn overflowing_lists_are_capped_with_notes() {
    let md = render(&golden_payload("mock_H_overflow")).to_markdown();

    for note in [
        "*+2 more requirements omitted for brevity*",
        "*+2 more hypotheses omitted for brevity*",
        "*+2 more actions omitted for brevity*",
        "*+3 more tools/parts omitted for brevity*",
        "*+2 more safety notes omitted for brevity*",
        "*+2 more references omitted for brevity*",
        "*+2 more disclaimers omitted for brevity*",
    ] {
        assert_eq!(md.matches(note).count(), 1, "note={note}\n{md}");
    }

    assert!(md.contains("**5. Hypothesis 5**"));
    assert!(!md.contains("Hypothesis 6"));
    assert!(md.contains("8. **Step 8**"));
    assert!(!md.contains("Step 9"));
    assert!(md.contains("- Tool 12"));
    assert!(!md.contains("Tool 13"));
    assert!(md.contains("- Safety note 6"));
    assert!(!md.contains("Safety note 7"));
    assert!(md.contains("- TSB ref 8"));
    assert!(!md.contains("TSB ref 9"));
    assert!(md.contains("- Disclaimer 10"));
    assert!(!md.contains("Disclaimer 11"));
    assert!(md.contains("- Requirement 8"));
    assert!(!md.contains("Requirement 9"));
}

#[test]
fn lists_exactly_at_cap_get_no_note() {
    let payload = DiagnosticPayload {
        root_cause_hypotheses: (1..=5)
            .map(|i| Hypothesis {
                hypothesis: format!("H{i}"),
                evidence: "e".to_string(),
                likelihood: Some(Likelihood::Medium),
            })
            .collect(),
        recommended_actions: (1..=8)
            .map(|i| Action {
                step: format!("S{i}"),
                why: "w".to_string(),
            })
            .collect(),
        tools_parts: (1..=12).map(|i| format!("T{i}")).collect(),
        safety_notes: (1..=6).map(|i| format!("N{i}")).collect(),
        warranty_or_tsb_refs: (1..=8).map(|i| format!("R{i}")).collect(),
        disclaimers: (1..=10).map(|i| format!("D{i}")).collect(),
        confidence_uplift_requirements: (1..=8).map(|i| format!("U{i}")).collect(),
        confidence: Confidence {
            score_pct: 50,
            threshold_pct: 85,
            assessment: String::new(),
        },
        ..DiagnosticPayload::default()
    };
    let md = render(&payload).to_markdown();
    assert!(!md.contains("omitted for brevity"), "{md}");
    assert!(md.contains("- U8"));
}

#[test]
fn raise_confidence_needs_requirements_and_a_low_score() {
    let mut payload = DiagnosticPayload {
        confidence_uplift_requirements: vec!["Freeze-frame data".to_string()],
        confidence: Confidence {
            score_pct: 72,
            threshold_pct: 85,
            assessment: "ok".to_string(),
        },
        ..DiagnosticPayload::default()
    };
    assert!(render(&payload).to_markdown().contains("### To Raise Confidence:"));

    payload.confidence.score_pct = 85;
    assert!(!render(&payload).to_markdown().contains("To Raise Confidence"));

    payload.confidence.score_pct = 72;
    payload.confidence_uplift_requirements.clear();
    assert!(!render(&payload).to_markdown().contains("To Raise Confidence"));
}

#[test]
fn empty_payload_still_has_fourteen_non_empty_sections() {
    let doc = render(&DiagnosticPayload::default());
    assert_fourteen_non_empty_sections(doc.lines());

    let md = doc.to_markdown();
    assert!(md.contains("**Submission ID:** UNKNOWN"));
    assert!(md.contains("**Customer:** N/A (N/A)"));
    assert!(md.contains("**Equipment:** Unknown equipment"));
    assert!(md.contains("**Diagnostic Codes:** None reported"));
    assert!(md.contains("**Customer Readiness Status:** unknown"));
    assert!(md.contains("*Reason:* No reason provided"));
    assert!(md.contains("- OEM Service Manual (specific VIN lookup required)"));
    assert!(doc.lines().iter().any(|l| {
        l == "- No active TSBs or warranty coverage identified for this symptom pattern"
    }));
}

#[test]
fn null_fields_render_like_absent_ones() {
    let payload: DiagnosticPayload = serde_json::from_str(
        r#"{
            "submissionId": null,
            "customer": null,
            "equipment": null,
            "symptoms": null,
            "codes": null,
            "root_cause_hypotheses": [{"hypothesis": "Coil", "evidence": null, "likelihood": null}],
            "most_likely_cause": null,
            "recommended_actions": null,
            "tools_parts": null,
            "safety_notes": null,
            "estimated_cost_range_usd": {"low": null, "high": null},
            "estimated_time_hours": null,
            "warranty_or_tsb_refs": null,
            "disclaimers": null,
            "confidence": null,
            "confidence_uplift_requirements": null,
            "customer_readiness_check": null,
            "meta": null
        }"#,
    )
    .expect("null fields are tolerated");

    let doc = render(&payload);
    assert_fourteen_non_empty_sections(doc.lines());
    let expected = DiagnosticPayload {
        root_cause_hypotheses: payload.root_cause_hypotheses.clone(),
        ..DiagnosticPayload::default()
    };
    assert_eq!(doc, render(&expected));

    let md = doc.to_markdown();
    assert!(md.contains("**Diagnostic Codes:** None reported"));
    assert!(md.contains("**1. Coil** — *UNKNOWN likelihood*"), "{md}");
    assert!(md.contains("   Evidence: No evidence provided"), "{md}");
}

#[test]
fn derived_costs_use_floor() {
    let payload = DiagnosticPayload {
        estimated_cost_range_usd: CostRange {
            low: 120.0,
            high: 450.0,
        },
        ..DiagnosticPayload::default()
    };
    let md = render(&payload).to_markdown();
    assert!(md.contains("Any quote exceeding $675 without additional failures found"));
    assert!(md.contains("| Quote exceeds $585 | 🔴 **SECOND OPINION REQUIRED** |"));
    assert!(md.contains("- **Parts & Labor Range:** $120 – $450 USD"));
}

#[test]
fn renderer_reuses_payload_timestamp() {
    let payload = golden_payload("mock_A");
    let md = render(&payload).to_markdown();
    assert!(md.contains("**Generated:** 2026-01-01T00:00:00Z"));
    assert!(md.ends_with("| Submission ID: DP-2026-0001 | 2026-01-01T00:00:00Z*"));
}

#[test]
fn overlong_short_reason_is_cut_at_render_time() {
    let mut payload = DiagnosticPayload::default();
    payload.customer_readiness_check.short_reason = "r".repeat(300);
    let md = render(&payload).to_markdown();
    let line = md
        .lines()
        .find(|l| l.starts_with("*Reason:* "))
        .expect("reason line");
    assert_eq!(line.trim_start_matches("*Reason:* ").chars().count(), 220);
}
