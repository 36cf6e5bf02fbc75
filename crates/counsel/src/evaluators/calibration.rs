use super::{Evaluator, EvaluatorError};
use crate::pipeline::context::RequestContext;
use serde_json::{json, Value};

/// Conservative stand-in estimate used until a model-side probability is
/// supplied with the request.
const DEFAULT_MODEL_PROB: f64 = 0.60;

/// Compares the caller's own probability estimate against the model-side
/// one and labels the gap; computes Brier scores when the outcome is known.
pub struct CalibrationAssessor;

impl Evaluator for CalibrationAssessor {
    fn name(&self) -> &'static str {
        "calibration"
    }

    fn assess(
        &self,
        _report_text: &str,
        ctx: &RequestContext,
    ) -> Result<Value, EvaluatorError> {
        let self_prob = ctx
            .self_prob
            .ok_or(EvaluatorError::MissingInput("self_prob"))?;
        if !(0.0..=1.0).contains(&self_prob) {
            return Err(EvaluatorError::Failed(format!(
                "self_prob {self_prob} is outside 0..1"
            )));
        }

        let model_prob = ctx.model_prob.unwrap_or(DEFAULT_MODEL_PROB);
        let delta = model_prob - self_prob;
        let (state, advice) = if delta > 0.10 {
            (
                "underconfident",
                "The reasoning supports more certainty; raise it moderately.",
            )
        } else if delta < -0.10 {
            (
                "overconfident",
                "Lower certainty by 10-20 points or gather more evidence.",
            )
        } else {
            ("aligned", "Calibration is in line; keep the same discipline.")
        };

        let mut payload = json!({
            "self_prob": round3(self_prob),
            "model_prob": round3(model_prob),
            "delta": round3(delta),
            "state": state,
            "advice": advice,
        });

        if let Some(outcome) = ctx.outcome {
            if outcome <= 1 {
                let realized = outcome as f64;
                payload["brier_user"] = json!(round4((self_prob - realized).powi(2)));
                payload["brier_model"] = json!(round4((model_prob - realized).powi(2)));
            }
        }

        Ok(payload)
    }
}

fn round3(value: f64) -> f64 {
    (value * 1_000.0).round() / 1_000.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
