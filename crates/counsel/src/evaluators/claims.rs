use super::{Evaluator, EvaluatorError};
use crate::pipeline::context::RequestContext;
use crate::pipeline::router::tokenize;
use serde_json::{json, Value};

/// Absolute words that usually signal an overreaching claim.
const STRONG_CLAIMS: [&str; 7] = [
    "always",
    "never",
    "must",
    "guarantee",
    "guaranteed",
    "aina",
    "pakko",
];

/// Flags absolute claims in the assembled report and proposes a rebuttal
/// scaffold plus a spaced-reinforcement schedule.
pub struct ClaimGuard;

impl Evaluator for ClaimGuard {
    fn name(&self) -> &'static str {
        "claims"
    }

    fn assess(
        &self,
        report_text: &str,
        _ctx: &RequestContext,
    ) -> Result<Value, EvaluatorError> {
        let tokens = tokenize(report_text);
        let findings: Vec<&str> = STRONG_CLAIMS
            .iter()
            .copied()
            .filter(|claim| tokens.iter().any(|token| token == claim))
            .collect();

        if findings.is_empty() {
            return Ok(json!({
                "status": "clean",
                "findings": [],
                "recommendation": "No strong claims detected.",
            }));
        }

        Ok(json!({
            "status": "flagged",
            "findings": findings,
            "rebuttal": "Scope the claim: name the conditions where it holds and a testable condition where it breaks.",
            "reinforcement": {
                "suggested_days": [7, 60],
                "note": "Revisit after 7 and 60 days to check the claim still holds.",
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_wording_is_flagged() {
        let ctx = RequestContext::default();
        let verdict = ClaimGuard
            .assess("This plan will always work, guaranteed.", &ctx)
            .expect("claim guard never fails");

        assert_eq!(verdict["status"], "flagged");
        let findings = verdict["findings"].as_array().expect("findings list");
        assert!(findings.iter().any(|f| f == "always"));
        assert!(findings.iter().any(|f| f == "guaranteed"));
    }

    #[test]
    fn measured_wording_is_clean() {
        let ctx = RequestContext::default();
        let verdict = ClaimGuard
            .assess("This plan should usually work under the stated constraints.", &ctx)
            .expect("claim guard never fails");
        assert_eq!(verdict["status"], "clean");
    }

    #[test]
    fn matches_whole_words_only() {
        let ctx = RequestContext::default();
        // "mustard" must not trip the "must" pattern.
        let verdict = ClaimGuard
            .assess("Add mustard to the recipe.", &ctx)
            .expect("claim guard never fails");
        assert_eq!(verdict["status"], "clean");
    }
}
