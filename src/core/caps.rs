pub const MAX_HYPOTHESES: usize = 5;
pub const MAX_ACTIONS: usize = 8;
pub const MAX_TOOLS_PARTS: usize = 12;
pub const MAX_SAFETY_NOTES: usize = 6;
pub const MAX_WARRANTY_REFS: usize = 8;
pub const MAX_DISCLAIMERS: usize = 10;
pub const MAX_UPLIFT_REQUIREMENTS: usize = 8;
pub const MAX_SHORT_REASON_CHARS: usize = 220;

/// Scores at or above this are ready for the customer, whatever the target.
pub const READINESS_CUTOFF_PCT: u8 = 75;

pub const DEFAULT_THRESHOLD_PCT: u8 = 85;

pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
