use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::caps::READINESS_CUTOFF_PCT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessVerdict {
    ReadyForCustomer,
    NeedsRevision,
}

impl ReadinessVerdict {
    pub const fn for_score(score_pct: u8) -> Self {
        if score_pct >= READINESS_CUTOFF_PCT {
            ReadinessVerdict::ReadyForCustomer
        } else {
            ReadinessVerdict::NeedsRevision
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ReadinessVerdict::ReadyForCustomer => "ready_for_customer",
            ReadinessVerdict::NeedsRevision => "needs_revision",
        }
    }
}

impl fmt::Display for ReadinessVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
