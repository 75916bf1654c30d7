use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::caps::{
    self, DEFAULT_THRESHOLD_PCT, MAX_ACTIONS, MAX_DISCLAIMERS, MAX_HYPOTHESES,
    MAX_SAFETY_NOTES, MAX_SHORT_REASON_CHARS, MAX_TOOLS_PARTS, MAX_UPLIFT_REQUIREMENTS,
    MAX_WARRANTY_REFS,
};
use crate::core::payload::null_as_default;
use crate::core::{
    Action, Confidence, CostRange, Customer, DiagnosticPayload, Equipment, Hypothesis,
    Likelihood, Meta, ReadinessCheck, ReadinessVerdict,
};

pub const GENERATOR_MODEL: &str = "mock-diagnostic-offline";
pub const GENERATOR_VERSION: &str = "1.0.0";

const DEFAULT_SUBMISSION_ID: &str = "MOCK-0001";
const DEFAULT_EMAIL: &str = "customer@example.com";
const DEFAULT_EQUIPMENT_TYPE: &str = "vehicle";
const DEFAULT_SYMPTOMS: &str = "No symptoms provided";

const DETAILED_SYMPTOMS_MIN_CHARS: usize = 100;
const SCORE_WITH_EVIDENCE: u8 = 88;
const SCORE_WITHOUT_EVIDENCE: u8 = 72;

pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputRecord {
    #[serde(rename = "submissionId")]
    pub submission_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub customer: InputCustomer,
    #[serde(deserialize_with = "null_as_default")]
    pub equipment: InputEquipment,
    pub symptoms: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub codes: Vec<String>,
    #[serde(deserialize_with = "lenient_threshold")]
    pub confidence_threshold_pct: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputCustomer {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputEquipment {
    #[serde(rename = "type")]
    pub equipment_type: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    #[serde(deserialize_with = "lenient_year")]
    pub year: Option<u32>,
}

fn lenient_threshold<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(crate::core::payload::pct_from_value))
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(crate::core::payload::year_from_value))
}

pub struct PayloadGenerator<C: Clock> {
    clock: C,
}

impl Default for PayloadGenerator<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> PayloadGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn generate(&self, input: &InputRecord) -> DiagnosticPayload {
        let symptoms = input
            .symptoms
            .clone()
            .unwrap_or_else(|| DEFAULT_SYMPTOMS.to_string());

        let score_pct = confidence_score(&input.codes, &symptoms);
        let threshold_pct = input
            .confidence_threshold_pct
            .unwrap_or(DEFAULT_THRESHOLD_PCT);

        let uplift = if score_pct < threshold_pct {
            capped(uplift_candidates(), MAX_UPLIFT_REQUIREMENTS)
        } else {
            Vec::new()
        };

        let verdict = ReadinessVerdict::for_score(score_pct);
        let reason = match verdict {
            ReadinessVerdict::ReadyForCustomer => format!(
                "Confidence at {score_pct}%, actionable steps provided, safety covered, cost estimates present"
            ),
            ReadinessVerdict::NeedsRevision => {
                "Insufficient diagnostic data; need freeze-frame and coil swap results".to_string()
            }
        };

        DiagnosticPayload {
            submission_id: input
                .submission_id
                .clone()
                .unwrap_or_else(|| DEFAULT_SUBMISSION_ID.to_string()),
            customer: Customer {
                email: input
                    .customer
                    .email
                    .clone()
                    .unwrap_or_else(|| DEFAULT_EMAIL.to_string()),
                name: input.customer.name.clone(),
            },
            equipment: Equipment {
                equipment_type: input
                    .equipment
                    .equipment_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_EQUIPMENT_TYPE.to_string()),
                make: input.equipment.make.clone(),
                model: input.equipment.model.clone(),
                year: input.equipment.year,
            },
            symptoms,
            codes: input.codes.clone(),
            root_cause_hypotheses: capped(hypothesis_candidates(), MAX_HYPOTHESES),
            most_likely_cause: "Ignition coil failure on cylinder 1, likely due to heat stress and high mileage. P0301 code confirms consistent misfire pattern.".to_string(),
            recommended_actions: capped(action_candidates(), MAX_ACTIONS),
            tools_parts: capped(strings(TOOLS_PARTS), MAX_TOOLS_PARTS),
            safety_notes: capped(strings(SAFETY_NOTES), MAX_SAFETY_NOTES),
            estimated_cost_range_usd: CostRange {
                low: 120.0,
                high: 450.0,
            },
            estimated_time_hours: 2.5,
            warranty_or_tsb_refs: capped(strings(WARRANTY_REFS), MAX_WARRANTY_REFS),
            disclaimers: capped(strings(DISCLAIMERS), MAX_DISCLAIMERS),
            confidence: Confidence {
                score_pct,
                threshold_pct,
                assessment: "Moderate confidence based on code pattern; coil swap test would increase to 95%+ certainty.".to_string(),
            },
            confidence_uplift_requirements: uplift,
            customer_readiness_check: ReadinessCheck {
                verdict: Some(verdict),
                short_reason: caps::truncate_chars(&reason, MAX_SHORT_REASON_CHARS),
            },
            meta: Meta {
                model: GENERATOR_MODEL.to_string(),
                version: GENERATOR_VERSION.to_string(),
                generated_at_iso: format_timestamp(self.clock.now()),
            },
        }
    }
}

pub fn confidence_score(codes: &[String], symptoms: &str) -> u8 {
    let has_codes = !codes.is_empty();
    let has_detailed_symptoms = symptoms.chars().count() > DETAILED_SYMPTOMS_MIN_CHARS;
    if has_codes && has_detailed_symptoms {
        SCORE_WITH_EVIDENCE
    } else {
        SCORE_WITHOUT_EVIDENCE
    }
}

fn format_timestamp(at: OffsetDateTime) -> String {
    at.to_offset(time::UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

fn capped<T>(mut items: Vec<T>, cap: usize) -> Vec<T> {
    items.truncate(cap);
    items
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn hypothesis_candidates() -> Vec<Hypothesis> {
    [
        (
            "Ignition coil failure on cylinder 1",
            "P0301 code indicates consistent misfire pattern; common failure mode for high-mileage engines",
            Likelihood::High,
        ),
        (
            "Fuel injector clog or electrical fault",
            "Could explain single-cylinder misfire if injector stuck closed or driver circuit failed",
            Likelihood::Medium,
        ),
        (
            "Compression loss due to valve or ring failure",
            "Would show consistent misfire but typically accompanied by reduced power and smoke",
            Likelihood::Low,
        ),
    ]
    .into_iter()
    .map(|(hypothesis, evidence, likelihood)| Hypothesis {
        hypothesis: hypothesis.to_string(),
        evidence: evidence.to_string(),
        likelihood: Some(likelihood),
    })
    .collect()
}

fn action_candidates() -> Vec<Action> {
    [
        (
            "Swap ignition coil from cylinder 1 to another cylinder",
            "If misfire follows the coil, confirms coil failure; cheapest diagnostic step",
        ),
        (
            "Check fuel injector resistance and spray pattern",
            "Rules out fuel delivery issue before replacing ignition components",
        ),
        (
            "Perform compression test on cylinder 1",
            "Establishes baseline compression to rule out mechanical failure",
        ),
        (
            "Scan for pending codes and freeze-frame data",
            "Captures engine conditions when misfire occurred for better diagnosis",
        ),
    ]
    .into_iter()
    .map(|(step, why)| Action {
        step: step.to_string(),
        why: why.to_string(),
    })
    .collect()
}

fn uplift_candidates() -> Vec<String> {
    strings(&[
        "Freeze-frame data for P0301 showing engine RPM, load, and coolant temp",
        "Ignition coil swap test results (does misfire follow the coil?)",
        "Fuel trim data for all cylinders to rule out fuel delivery issues",
        "Compression test results for cylinder 1 compared to other cylinders",
        "Exact VIN and mileage for TSB applicability check",
    ])
}

const TOOLS_PARTS: &[&str] = &[
    "OBD-II scanner with live data capability",
    "Ignition coil (OEM or equivalent)",
    "Spark plug socket and torque wrench",
    "Compression tester kit",
    "Fuel pressure gauge",
    "Multimeter for resistance testing",
];

const SAFETY_NOTES: &[&str] = &[
    "Disconnect battery negative terminal before working on ignition system",
    "Allow engine to cool before removing ignition components",
    "Wear eye protection when releasing fuel system pressure",
    "Use proper jack stands if raising vehicle; never rely on jack alone",
];

const WARRANTY_REFS: &[&str] = &[
    "Ford TSB 08-7-6: Ignition coil failures on 5.4L engines (2004-2008)",
    "Check warranty coverage if under 60,000 miles (powertrain)",
    "Motorcraft DG508 coil is OEM replacement part",
];

const DISCLAIMERS: &[&str] = &[
    "This analysis is based on provided symptoms and codes; physical inspection may reveal additional issues",
    "Cost estimates are regional averages; actual prices vary by location and shop labor rates",
    "Always request written estimates before authorizing repairs",
    "Second opinion recommended for repairs exceeding $500",
];
