use crate::core::caps::{
    self, MAX_ACTIONS, MAX_DISCLAIMERS, MAX_HYPOTHESES, MAX_SAFETY_NOTES,
    MAX_SHORT_REASON_CHARS, MAX_TOOLS_PARTS, MAX_UPLIFT_REQUIREMENTS, MAX_WARRANTY_REFS,
};
use crate::core::{DiagnosticPayload, Equipment, Hypothesis};

mod document;

pub use document::Document;

pub const REPORT_TITLE: &str = "# DiagnosticPro Diagnostic Report";

pub fn truncate_list<'a, T>(
    items: &'a [T],
    cap: usize,
    label: &str,
) -> (&'a [T], Option<String>) {
    if items.len() <= cap {
        return (items, None);
    }
    let remaining = items.len() - cap;
    (
        &items[..cap],
        Some(format!("*+{remaining} more {label} omitted for brevity*")),
    )
}

pub fn render(payload: &DiagnosticPayload) -> Document {
    let mut doc = Document::default();

    let generated_at = or_fallback(&payload.meta.generated_at_iso, "unknown");
    let submission_id = or_fallback(&payload.submission_id, "UNKNOWN");

    let (hypotheses, hypotheses_note) =
        truncate_list(&payload.root_cause_hypotheses, MAX_HYPOTHESES, "hypotheses");
    let (actions, actions_note) =
        truncate_list(&payload.recommended_actions, MAX_ACTIONS, "actions");
    let (warranty_refs, warranty_note) = truncate_list(
        &payload.warranty_or_tsb_refs,
        MAX_WARRANTY_REFS,
        "references",
    );
    let cost = payload.estimated_cost_range_usd;
    let cost_low = format_number(cost.low);
    let cost_high = format_number(cost.high);

    doc.push(REPORT_TITLE);
    doc.blank();
    doc.push(format!("**Generated:** {generated_at}"));
    doc.push(format!("**Submission ID:** {submission_id}"));
    doc.rule();

    doc.push("## Customer & Equipment Information");
    doc.blank();
    let customer_name = payload
        .customer
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("N/A");
    doc.push(format!(
        "**Customer:** {customer_name} ({})",
        or_fallback(&payload.customer.email, "N/A")
    ));
    doc.push(format!(
        "**Equipment:** {}",
        describe_equipment(&payload.equipment)
    ));
    doc.blank();
    doc.push(format!(
        "**Reported Symptoms:** {}",
        or_fallback(&payload.symptoms, "None provided")
    ));
    doc.blank();
    if payload.codes.is_empty() {
        doc.push("**Diagnostic Codes:** None reported");
    } else {
        doc.push(format!("**Diagnostic Codes:** {}", payload.codes.join(", ")));
    }
    doc.rule();

    doc.push("## 1. PRIMARY DIAGNOSIS");
    doc.blank();
    doc.push("**Most Likely Root Cause:**");
    doc.blank();
    doc.push(or_fallback(&payload.most_likely_cause, "Analysis incomplete"));
    doc.blank();
    let confidence = &payload.confidence;
    doc.push(format!(
        "**Confidence:** {}% (Target: {}%)",
        confidence.score_pct, confidence.threshold_pct
    ));
    doc.push(format!(
        "*{}*",
        or_fallback(&confidence.assessment, "No assessment provided")
    ));
    doc.blank();
    if !payload.confidence_uplift_requirements.is_empty() && confidence.below_threshold() {
        doc.push("### To Raise Confidence:");
        doc.blank();
        let (reqs, note) = truncate_list(
            &payload.confidence_uplift_requirements,
            MAX_UPLIFT_REQUIREMENTS,
            "requirements",
        );
        for req in reqs {
            doc.push(format!("- {req}"));
        }
        if let Some(note) = note {
            doc.blank();
            doc.push(note);
        }
        doc.blank();
    }
    doc.push("---");
    doc.blank();

    doc.push("## 2. DIFFERENTIAL DIAGNOSIS");
    doc.blank();
    doc.push("**Alternative Causes Ranked by Likelihood:**");
    doc.blank();
    if hypotheses.is_empty() {
        doc.push("- No alternative causes identified; further diagnostic data required");
        doc.blank();
    }
    for (idx, hyp) in hypotheses.iter().enumerate() {
        doc.push(format!(
            "**{}. {}** — *{} likelihood*",
            idx + 1,
            or_fallback(&hyp.hypothesis, "Unknown"),
            likelihood_label(hyp)
        ));
        doc.push(format!(
            "   Evidence: {}",
            or_fallback(&hyp.evidence, "No evidence provided")
        ));
        doc.blank();
    }
    if let Some(note) = hypotheses_note {
        doc.push(note);
        doc.blank();
    }
    doc.push("---");
    doc.blank();

    doc.push("## 3. DIAGNOSTIC VERIFICATION");
    doc.blank();
    doc.push("**Required Tests & Procedures:**");
    doc.blank();
    if actions.is_empty() {
        doc.push("- No specific procedures identified; request a full diagnostic scan");
        doc.blank();
    }
    for (idx, action) in actions.iter().enumerate() {
        doc.push(format!(
            "{}. **{}**",
            idx + 1,
            or_fallback(&action.step, "Unknown step")
        ));
        doc.push(format!(
            "   *Why:* {}",
            or_fallback(&action.why, "No reason provided")
        ));
        doc.blank();
    }
    if let Some(note) = actions_note {
        doc.push(note);
        doc.blank();
    }
    doc.push("---");
    doc.blank();

    doc.push("## 4. SHOP INTERROGATION");
    doc.blank();
    doc.push("**Critical Questions to Ask Your Mechanic:**");
    doc.blank();
    for (idx, question) in SHOP_QUESTIONS.iter().enumerate() {
        doc.push(format!("{}. {question}", idx + 1));
    }
    doc.rule();

    doc.push("## 5. CONVERSATION SCRIPTING");
    doc.blank();
    doc.push("**What to Say to Protect Yourself:**");
    doc.blank();
    doc.push(format!(
        "- \"Before authorizing any repair over ${cost_low}, I need to see the diagnostic data that confirms this issue.\""
    ));
    doc.push("- \"Can you explain why [alternative hypothesis] isn't the cause?\"");
    doc.push(format!(
        "- \"I'd like a second opinion before proceeding with repairs exceeding ${cost_high}.\""
    ));
    doc.push(
        "- \"Show me the exact test results that rule out warranty coverage or TSB applicability.\"",
    );
    doc.rule();

    doc.push("## 6. COST BREAKDOWN");
    doc.blank();
    doc.push("**Fair Price Expectations:**");
    doc.blank();
    doc.push(format!(
        "- **Parts & Labor Range:** ${cost_low} – ${cost_high} USD"
    ));
    doc.push(format!(
        "- **Estimated Time:** {} hours",
        format_number(payload.estimated_time_hours)
    ));
    doc.push(format!(
        "- **Red Flags:** Any quote exceeding ${} without additional failures found",
        cost.red_flag_cost()
    ));
    doc.rule();

    doc.push("## 7. RIPOFF DETECTION");
    doc.blank();
    doc.push("**Watch Out For:**");
    doc.blank();
    let (safety, safety_note) =
        truncate_list(&payload.safety_notes, MAX_SAFETY_NOTES, "safety notes");
    if safety.is_empty() {
        doc.push("- No specific safety concerns noted; follow standard shop safety practices");
    }
    for note in safety {
        doc.push(format!("- {note}"));
    }
    if let Some(note) = safety_note {
        doc.blank();
        doc.push(note);
    }
    doc.blank();
    doc.push("**Common Scams:**");
    doc.blank();
    for scam in COMMON_SCAMS {
        doc.push(format!("- {scam}"));
    }
    doc.rule();

    doc.push("## 8. AUTHORIZATION GUIDE");
    doc.blank();
    doc.push("**Decision Matrix:**");
    doc.blank();
    doc.push("| Scenario | Your Response |");
    doc.push("|----------|---------------|");
    doc.push("| Diagnosis matches this report + cost within range | ✅ **APPROVE** with confidence |");
    doc.push("| Diagnosis differs but mechanic shows test data | ⚠️ **REQUEST EXPLANATION** before proceeding |");
    doc.push(format!(
        "| Quote exceeds ${} | 🔴 **SECOND OPINION REQUIRED** |",
        cost.second_opinion_threshold()
    ));
    doc.push("| Shop refuses to show diagnostic data | 🚫 **REJECT & LEAVE** immediately |");
    doc.rule();

    doc.push("## 9. TECHNICAL EDUCATION");
    doc.blank();
    doc.push("**How This System Works & Why It Fails:**");
    doc.blank();
    doc.push(or_fallback(
        &payload.symptoms,
        "Symptom information not provided",
    ));
    doc.blank();
    doc.push("**Failure Mechanisms:**");
    doc.blank();
    if hypotheses.is_empty() {
        doc.push("- Failure mechanism not determined from available data");
    }
    for hyp in hypotheses {
        doc.push(format!(
            "- {}: {}",
            or_fallback(&hyp.hypothesis, "Unknown"),
            or_fallback(&hyp.evidence, "No evidence")
        ));
    }
    doc.rule();

    doc.push("## 10. OEM PARTS STRATEGY");
    doc.blank();
    doc.push("**Recommended Parts & Tools:**");
    doc.blank();
    let (tools, tools_note) = truncate_list(&payload.tools_parts, MAX_TOOLS_PARTS, "tools/parts");
    if tools.is_empty() {
        doc.push("- No specialized tools or parts identified");
    }
    for tool in tools {
        doc.push(format!("- {tool}"));
    }
    if let Some(note) = tools_note {
        doc.blank();
        doc.push(note);
    }
    doc.blank();
    doc.push("### Warranty & Technical Service Bulletins:");
    doc.blank();
    if warranty_refs.is_empty() {
        doc.push("- No active TSBs or warranty coverage identified for this symptom pattern");
    }
    for reference in warranty_refs {
        doc.push(format!("- {reference}"));
    }
    if let Some(note) = warranty_note {
        doc.blank();
        doc.push(note);
    }
    doc.rule();

    doc.push("## 11. NEGOTIATION TACTICS");
    doc.blank();
    doc.push("**Professional Price Discussion:**");
    doc.blank();
    doc.push(format!(
        "1. **Establish Baseline:** \"Your quote of $X is above the industry average of ${cost_high} for this repair.\""
    ));
    doc.push("2. **Request Itemization:** \"Can you break down parts cost vs labor separately?\"");
    doc.push("3. **Leverage Competition:** \"I have quotes from two other shops—can you match or explain the difference?\"");
    doc.push("4. **Time-Based Discounts:** \"If I authorize this today, can you reduce the rate?\"");
    doc.rule();

    doc.push("## 12. LIKELY CAUSES (RANKED BY CONFIDENCE)");
    doc.blank();
    if hypotheses.is_empty() {
        doc.push("- Insufficient data to rank likely causes");
    }
    for (idx, hyp) in hypotheses.iter().enumerate() {
        doc.push(format!(
            "{}. **{}** — {} ({})",
            idx + 1,
            or_fallback(&hyp.hypothesis, "Unknown"),
            likelihood_label(hyp),
            or_fallback(&hyp.evidence, "No evidence")
        ));
    }
    doc.rule();

    doc.push("## 13. RECOMMENDATIONS");
    doc.blank();
    doc.push("**Immediate Actions:**");
    doc.blank();
    if actions.is_empty() {
        doc.push("- Obtain a complete diagnostic scan before authorizing repairs");
    }
    for action in actions {
        doc.push(format!("- {}", or_fallback(&action.step, "Unknown step")));
    }
    doc.blank();
    doc.push("**Future Preventive Maintenance:**");
    doc.blank();
    for item in PREVENTIVE_MAINTENANCE {
        doc.push(format!("- {item}"));
    }
    doc.rule();

    doc.push("## 14. SOURCE VERIFICATION");
    doc.blank();
    doc.push("**Authoritative References:**");
    doc.blank();
    if warranty_refs.is_empty() {
        for source in FALLBACK_SOURCES {
            doc.push(format!("- {source}"));
        }
    }
    for reference in warranty_refs {
        doc.push(format!("- {reference}"));
    }
    doc.rule();

    doc.push("## DISCLAIMERS");
    doc.blank();
    let (disclaimers, disclaimers_note) =
        truncate_list(&payload.disclaimers, MAX_DISCLAIMERS, "disclaimers");
    if disclaimers.is_empty() {
        doc.push("- This report is informational and does not replace a physical inspection");
    }
    for disclaimer in disclaimers {
        doc.push(format!("- {disclaimer}"));
    }
    if let Some(note) = disclaimers_note {
        doc.blank();
        doc.push(note);
    }
    doc.rule();

    let readiness = &payload.customer_readiness_check;
    let verdict = readiness
        .verdict
        .map(|v| v.as_str())
        .unwrap_or("unknown");
    let reason = caps::truncate_chars(&readiness.short_reason, MAX_SHORT_REASON_CHARS);
    doc.push(format!("**Customer Readiness Status:** {verdict}"));
    doc.push(format!(
        "*Reason:* {}",
        or_fallback(&reason, "No reason provided")
    ));
    doc.rule();

    doc.push(format!(
        "*Report generated by DiagnosticPro AI | Submission ID: {submission_id} | {generated_at}*"
    ));

    doc
}

const SHOP_QUESTIONS: &[&str] = &[
    "What exact diagnostic tests did you perform to isolate this issue?",
    "Can you show me the freeze-frame data or live sensor readings?",
    "What are the specific test values that confirm your diagnosis?",
    "Have you checked TSBs and known failure patterns for this symptom?",
    "What's your confidence level, and what would increase it to 100%?",
];

const COMMON_SCAMS: &[&str] = &[
    "Replacing parts \"just in case\" without diagnostic confirmation",
    "Charging diagnostic fees without isolating root cause",
    "Recommending unnecessary preventive maintenance during urgent repairs",
];

const PREVENTIVE_MAINTENANCE: &[&str] = &[
    "Monitor related systems for early warning signs",
    "Document all repairs for pattern analysis",
    "Follow OEM maintenance intervals strictly",
];

const FALLBACK_SOURCES: &[&str] = &[
    "OEM Service Manual (specific VIN lookup required)",
    "NHTSA Complaints Database",
    "Technical Service Bulletin Archives",
];

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn likelihood_label(hyp: &Hypothesis) -> String {
    hyp.likelihood
        .map(|l| l.as_str().to_ascii_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

fn describe_equipment(equipment: &Equipment) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(year) = equipment.year.filter(|y| *y > 0) {
        parts.push(year.to_string());
    }
    for part in [&equipment.make, &equipment.model].into_iter().flatten() {
        let part = part.trim();
        if !part.is_empty() {
            parts.push(part.to_string());
        }
    }
    if parts.is_empty() {
        format!(
            "{} equipment",
            or_fallback(&equipment.equipment_type, "Unknown")
        )
    } else {
        parts.join(" ")
    }
}

/// Integral values print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_list_notes_only_when_cut() {
        let items = vec![1, 2, 3, 4, 5, 6, 7];
        let (shown, note) = truncate_list(&items, 5, "hypotheses");
        assert_eq!(shown, &[1, 2, 3, 4, 5]);
        assert_eq!(
            note.as_deref(),
            Some("*+2 more hypotheses omitted for brevity*")
        );

        let (again, note) = truncate_list(shown, 5, "hypotheses");
        assert_eq!(again, shown);
        assert!(note.is_none());
    }

    #[test]
    fn format_number_drops_integral_fraction() {
        assert_eq!(format_number(450.0), "450");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn equipment_falls_back_to_type() {
        let bare = Equipment {
            equipment_type: "boat".to_string(),
            ..Equipment::default()
        };
        assert_eq!(describe_equipment(&bare), "boat equipment");
        assert_eq!(describe_equipment(&Equipment::default()), "Unknown equipment");

        let full = Equipment {
            equipment_type: "vehicle".to_string(),
            make: Some("Ford".to_string()),
            model: Some("F-150".to_string()),
            year: Some(2006),
        };
        assert_eq!(describe_equipment(&full), "2006 Ford F-150");
    }

    #[test]
    fn missing_likelihood_renders_unknown() {
        let hyp = Hypothesis::default();
        assert_eq!(likelihood_label(&hyp), "UNKNOWN");
    }
}
