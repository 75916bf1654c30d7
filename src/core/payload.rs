use serde::{Deserialize, Deserializer, Serialize};

use crate::core::caps::DEFAULT_THRESHOLD_PCT;
use crate::core::{Likelihood, ReadinessVerdict};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticPayload {
    #[serde(rename = "submissionId", deserialize_with = "null_as_default")]
    pub submission_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub customer: Customer,
    #[serde(deserialize_with = "null_as_default")]
    pub equipment: Equipment,
    #[serde(deserialize_with = "null_as_default")]
    pub symptoms: String,
    #[serde(deserialize_with = "null_as_default")]
    pub codes: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub root_cause_hypotheses: Vec<Hypothesis>,
    #[serde(deserialize_with = "null_as_default")]
    pub most_likely_cause: String,
    #[serde(deserialize_with = "null_as_default")]
    pub recommended_actions: Vec<Action>,
    #[serde(deserialize_with = "null_as_default")]
    pub tools_parts: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub safety_notes: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub estimated_cost_range_usd: CostRange,
    #[serde(deserialize_with = "null_as_default")]
    pub estimated_time_hours: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub warranty_or_tsb_refs: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub disclaimers: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub confidence: Confidence,
    #[serde(deserialize_with = "null_as_default")]
    pub confidence_uplift_requirements: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub customer_readiness_check: ReadinessCheck,
    #[serde(deserialize_with = "null_as_default")]
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Equipment {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub equipment_type: String,
    pub make: Option<String>,
    pub model: Option<String>,
    #[serde(deserialize_with = "lenient_year")]
    pub year: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Hypothesis {
    #[serde(deserialize_with = "null_as_default")]
    pub hypothesis: String,
    #[serde(deserialize_with = "null_as_default")]
    pub evidence: String,
    #[serde(deserialize_with = "lenient_likelihood")]
    pub likelihood: Option<Likelihood>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    #[serde(deserialize_with = "null_as_default")]
    pub step: String,
    #[serde(deserialize_with = "null_as_default")]
    pub why: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRange {
    #[serde(deserialize_with = "null_as_default")]
    pub low: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub high: f64,
}

impl CostRange {
    pub fn red_flag_cost(&self) -> i64 {
        (self.high * 1.5).floor() as i64
    }

    pub fn second_opinion_threshold(&self) -> i64 {
        (self.high * 1.3).floor() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Confidence {
    #[serde(deserialize_with = "lenient_score")]
    pub score_pct: u8,
    #[serde(deserialize_with = "lenient_threshold")]
    pub threshold_pct: u8,
    #[serde(deserialize_with = "null_as_default")]
    pub assessment: String,
}

impl Default for Confidence {
    fn default() -> Self {
        Self {
            score_pct: 0,
            threshold_pct: DEFAULT_THRESHOLD_PCT,
            assessment: String::new(),
        }
    }
}

impl Confidence {
    pub fn below_threshold(&self) -> bool {
        self.score_pct < self.threshold_pct
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessCheck {
    #[serde(deserialize_with = "lenient_verdict")]
    pub verdict: Option<ReadinessVerdict>,
    #[serde(deserialize_with = "null_as_default")]
    pub short_reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    #[serde(deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub generated_at_iso: String,
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn lenient_likelihood<'de, D>(deserializer: D) -> Result<Option<Likelihood>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse().ok()))
}

fn lenient_verdict<'de, D>(deserializer: D) -> Result<Option<ReadinessVerdict>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(year_from_value))
}

pub(crate) fn year_from_value(v: &serde_json::Value) -> Option<u32> {
    match v {
        serde_json::Value::Number(n) => n.as_u64().and_then(|y| u32::try_from(y).ok()),
        serde_json::Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(pct_from_value(&raw).unwrap_or(0))
}

fn lenient_threshold<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(pct_from_value(&raw).unwrap_or(DEFAULT_THRESHOLD_PCT))
}

pub(crate) fn pct_from_value(v: &serde_json::Value) -> Option<u8> {
    let n = v.as_f64()?;
    Some(n.clamp(0.0, 100.0).floor() as u8)
}
