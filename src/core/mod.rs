pub mod caps;
mod likelihood;
pub(crate) mod payload;
mod readiness;

pub use likelihood::Likelihood;
pub use payload::{
    Action, Confidence, CostRange, Customer, DiagnosticPayload, Equipment, Hypothesis, Meta,
    ReadinessCheck,
};
pub use readiness::ReadinessVerdict;
