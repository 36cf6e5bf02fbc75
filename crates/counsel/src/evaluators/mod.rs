mod calibration;
mod checks;
mod claims;

pub use calibration::CalibrationAssessor;
pub use checks::{BiasSentinel, EthicsCheck, EvidenceCheck, PriorityScorer, SafetyGate};
pub use claims::ClaimGuard;

use crate::pipeline::context::RequestContext;
use serde::Serialize;
use serde_json::Value;

/// Outcome of one evaluator, mirrored verbatim into the summary. Payloads
/// are opaque to the orchestrator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "payload", rename_all = "snake_case")]
pub enum EvaluatorVerdict {
    Ok(Value),
    Error(String),
    Unavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    /// The request lacks the data this evaluator needs; reported as
    /// unavailable rather than failed.
    #[error("missing input: {0}")]
    MissingInput(&'static str),
    #[error("{0}")]
    Failed(String),
}

/// Cross-cutting check over the assembled report text and/or the request
/// context. Each evaluator runs exactly once per pipeline run, isolated.
pub trait Evaluator: Send + Sync {
    fn name(&self) -> &'static str;

    fn assess(&self, report_text: &str, ctx: &RequestContext)
        -> Result<Value, EvaluatorError>;
}

/// The default evaluator set, in reporting order.
pub fn standard_evaluators() -> Vec<Box<dyn Evaluator>> {
    vec![
        Box::new(EthicsCheck),
        Box::new(EvidenceCheck),
        Box::new(PriorityScorer),
        Box::new(CalibrationAssessor),
        Box::new(ClaimGuard),
        Box::new(BiasSentinel),
        Box::new(SafetyGate),
    ]
}
