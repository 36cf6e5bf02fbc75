use super::{Evaluator, EvaluatorError};
use crate::pipeline::context::RequestContext;
use serde_json::{json, Value};

/// Warns when the report carries no counterpoints at all. A one-sided
/// argument is the most common failure mode of a generated brief.
pub struct EthicsCheck;

impl Evaluator for EthicsCheck {
    fn name(&self) -> &'static str {
        "ethics"
    }

    fn assess(
        &self,
        report_text: &str,
        _ctx: &RequestContext,
    ) -> Result<Value, EvaluatorError> {
        let mut warnings: Vec<&str> = Vec::new();
        if !report_text.contains("Counterpoint") {
            warnings.push("No counterpoints detected.");
        }

        Ok(json!({
            "cfl_score": 5.0,
            "warnings": warnings,
            "predictions": [
                "If the counterpoints are weak, the thesis survives first contact.",
                "If a counterpoint lands, revise the next step before committing.",
            ],
        }))
    }
}

/// Checks whether a time-sensitive request arrived without sources.
pub struct EvidenceCheck;

impl Evaluator for EvidenceCheck {
    fn name(&self) -> &'static str {
        "evidence"
    }

    fn assess(
        &self,
        _report_text: &str,
        ctx: &RequestContext,
    ) -> Result<Value, EvaluatorError> {
        let missing_sources = ctx.timely && ctx.citations.is_empty();
        let evidence_score = if missing_sources { 3.0 } else { 6.0 };

        Ok(json!({
            "evidence_score": evidence_score,
            "missing_sources": missing_sources,
            "citations": ctx.citations,
        }))
    }
}

/// Scores the brief for publish-versus-prototype readiness.
pub struct PriorityScorer;

impl Evaluator for PriorityScorer {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn assess(
        &self,
        _report_text: &str,
        _ctx: &RequestContext,
    ) -> Result<Value, EvaluatorError> {
        let gps_score = 6.5;
        let recommendation = if gps_score < 7.5 { "prototype" } else { "publish" };

        Ok(json!({
            "gps_score": gps_score,
            "recommendation": recommendation,
        }))
    }
}

/// Placeholder bias scan; reports exposure without alerts until a real
/// lexicon is wired in.
pub struct BiasSentinel;

impl Evaluator for BiasSentinel {
    fn name(&self) -> &'static str {
        "bias"
    }

    fn assess(
        &self,
        _report_text: &str,
        _ctx: &RequestContext,
    ) -> Result<Value, EvaluatorError> {
        Ok(json!({
            "alerts": [],
            "exposure": 1,
        }))
    }
}

/// Final allow/deny gate over the assembled report.
pub struct SafetyGate;

impl Evaluator for SafetyGate {
    fn name(&self) -> &'static str {
        "safety"
    }

    fn assess(
        &self,
        _report_text: &str,
        _ctx: &RequestContext,
    ) -> Result<Value, EvaluatorError> {
        Ok(json!({
            "status": "allow",
            "reasons": [],
        }))
    }
}
