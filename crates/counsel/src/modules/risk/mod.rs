mod simulation;

pub use simulation::TailEstimate;

use super::{ModuleContext, ModuleError, ModuleId, ModuleReport, ReportModule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mitigation {
    #[serde(default)]
    pub delta_probability: f64,
    #[serde(default)]
    pub delta_loss: f64,
    #[serde(default)]
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Risk {
    pub name: String,
    pub probability: f64,
    pub loss: f64,
    #[serde(default)]
    pub mitigation: Option<Mitigation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskInput {
    pub risks: Vec<Risk>,
    #[serde(default = "default_apply_mitigation")]
    pub apply_mitigation: bool,
    #[serde(default)]
    pub simulate: bool,
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_apply_mitigation() -> bool {
    true
}

fn default_trials() -> usize {
    20_000
}

/// Mitigation return on investment. A zero-cost mitigation with positive
/// reduction has unbounded ROI, never zero; with nothing to divide the
/// figure is simply not applicable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Roi {
    Ratio(f64),
    Unbounded,
    NotApplicable,
}

impl Roi {
    fn render(self) -> String {
        match self {
            Self::Ratio(ratio) => format!("{ratio:.2}"),
            Self::Unbounded => "inf".to_string(),
            Self::NotApplicable => "-".to_string(),
        }
    }
}

/// One risk's expected-loss accounting, before and after mitigation.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    pub name: String,
    pub probability: f64,
    pub loss: f64,
    pub probability_after: f64,
    pub loss_after: f64,
    pub el_before: f64,
    pub el_after: f64,
    pub reduction: f64,
    pub cost: f64,
    pub roi: Roi,
    pub net_gain: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiskTotals {
    pub el_before: f64,
    pub el_after: f64,
    pub reduction: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub trials: usize,
    pub baseline: TailEstimate,
    pub mitigated: TailEstimate,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskEvaluation {
    /// Rows ranked by `el_before` descending (largest exposure first).
    pub ledger: Vec<LedgerRow>,
    pub totals: RiskTotals,
    pub simulation: Option<SimulationSummary>,
}

/// Post-mitigation probability and loss, clamped to valid ranges. Inputs are
/// clamped here too, so malformed figures never propagate.
pub(super) fn effective_exposure(risk: &Risk, mitigated: bool) -> (f64, f64) {
    let probability = risk.probability.clamp(0.0, 1.0);
    let loss = risk.loss.max(0.0);

    match (&risk.mitigation, mitigated) {
        (Some(mitigation), true) => (
            (probability - mitigation.delta_probability.max(0.0)).clamp(0.0, 1.0),
            (loss - mitigation.delta_loss.max(0.0)).max(0.0),
        ),
        _ => (probability, loss),
    }
}

/// Deterministic expected-loss ledger plus optional Monte Carlo tail
/// estimate. The simulation assumes risk independence; that assumption is
/// surfaced in the report rather than corrected.
pub struct RiskEngine;

impl RiskEngine {
    pub fn evaluate(input: &RiskInput) -> Result<RiskEvaluation, ModuleError> {
        if input.risks.is_empty() {
            return Err(ModuleError::InvalidInput {
                module: ModuleId::RiskExpectedLoss.label(),
                reason: "at least one risk is required".to_string(),
            });
        }

        let mut ledger = Vec::with_capacity(input.risks.len());
        let mut totals = RiskTotals {
            el_before: 0.0,
            el_after: 0.0,
            reduction: 0.0,
        };

        for risk in &input.risks {
            let (probability, loss) = effective_exposure(risk, false);
            let (probability_after, loss_after) =
                effective_exposure(risk, input.apply_mitigation);

            let el_before = probability * loss;
            let el_after = probability_after * loss_after;
            let reduction = (el_before - el_after).max(0.0);
            let cost = risk
                .mitigation
                .as_ref()
                .map(|mitigation| mitigation.cost.max(0.0))
                .unwrap_or(0.0);

            let roi = if cost > 0.0 {
                Roi::Ratio(reduction / cost)
            } else if reduction > 0.0 {
                Roi::Unbounded
            } else {
                Roi::NotApplicable
            };

            totals.el_before += el_before;
            totals.el_after += el_after;

            ledger.push(LedgerRow {
                name: risk.name.clone(),
                probability,
                loss,
                probability_after,
                loss_after,
                el_before,
                el_after,
                reduction,
                cost,
                roi,
                net_gain: reduction - cost,
            });
        }

        totals.reduction = (totals.el_before - totals.el_after).max(0.0);
        ledger.sort_by(|a, b| {
            b.el_before
                .partial_cmp(&a.el_before)
                .expect("expected losses are finite")
        });

        let simulation = if input.simulate {
            let trials = input.trials.max(1);
            Some(SimulationSummary {
                trials,
                baseline: simulation::simulate(&input.risks, trials, false, input.seed),
                mitigated: simulation::simulate(
                    &input.risks,
                    trials,
                    input.apply_mitigation,
                    input.seed,
                ),
            })
        } else {
            None
        };

        Ok(RiskEvaluation {
            ledger,
            totals,
            simulation,
        })
    }
}

/// Built-in risk register used when the request carries no risk input.
pub fn sample_input() -> RiskInput {
    let risk = |name: &str, probability: f64, loss: f64, mitigation: Mitigation| Risk {
        name: name.to_string(),
        probability,
        loss,
        mitigation: Some(mitigation),
    };

    RiskInput {
        risks: vec![
            risk(
                "Supply delay",
                0.30,
                15_000.0,
                Mitigation {
                    delta_probability: 0.08,
                    delta_loss: 2_000.0,
                    cost: 1_200.0,
                },
            ),
            risk(
                "Data loss",
                0.05,
                80_000.0,
                Mitigation {
                    delta_probability: 0.02,
                    delta_loss: 20_000.0,
                    cost: 5_000.0,
                },
            ),
            risk(
                "Key hire quits",
                0.15,
                22_000.0,
                Mitigation {
                    delta_probability: 0.04,
                    delta_loss: 5_000.0,
                    cost: 3_000.0,
                },
            ),
        ],
        apply_mitigation: true,
        simulate: false,
        trials: default_trials(),
        seed: None,
    }
}

/// Expected-loss report backed by [`RiskEngine`].
pub struct RiskExpectedLossModule;

impl ReportModule for RiskExpectedLossModule {
    fn id(&self) -> ModuleId {
        ModuleId::RiskExpectedLoss
    }

    fn generate(
        &self,
        _user_text: &str,
        ctx: &ModuleContext<'_>,
    ) -> Result<ModuleReport, ModuleError> {
        let (input, fallback) = match &ctx.request.risk {
            Some(input) => (input.clone(), false),
            None => (sample_input(), true),
        };

        let evaluation = RiskEngine::evaluate(&input)?;
        Ok(render(&evaluation, fallback))
    }
}

fn render(evaluation: &RiskEvaluation, fallback: bool) -> ModuleReport {
    let mut lines = vec!["# RiskExpectedLoss".to_string(), "**Top Risks:**".to_string()];
    for row in &evaluation.ledger {
        lines.push(format!(
            "- {}: p={:.2}, L={}, EL={}",
            row.name,
            row.probability,
            format_currency(row.loss),
            format_currency(row.el_before)
        ));
    }

    lines.push(String::new());
    lines.push("**Expected Loss:**".to_string());
    lines.push(format!(
        "EL_total_before = {}",
        format_currency(evaluation.totals.el_before)
    ));
    lines.push(format!(
        "EL_total_after  = {}",
        format_currency(evaluation.totals.el_after)
    ));
    lines.push(format!(
        "Risk reduction  = {}",
        format_currency(evaluation.totals.reduction)
    ));

    lines.push(String::new());
    lines.push("**Mitigation:**".to_string());
    for row in &evaluation.ledger {
        lines.push(format!(
            "- {}: EL_before={} -> EL_after={} (reduction={}); cost={}; ROI={}; net_gain={}",
            row.name,
            format_currency(row.el_before),
            format_currency(row.el_after),
            format_currency(row.reduction),
            format_currency(row.cost),
            row.roi.render(),
            format_currency(row.net_gain)
        ));
    }

    lines.push(String::new());
    lines.push("**Uncertainty:**".to_string());
    lines.push("- Assumes independent risks (simulation and ledger alike).".to_string());
    lines.push("- Delta and cost estimates should be sourced; apply +/-20% sensitivity.".to_string());
    if let Some(simulation) = &evaluation.simulation {
        lines.push(format!(
            "- Sim (n={}): VaR95 before={}, after={}; ES95 before={}, after={}.",
            simulation.trials,
            format_currency(simulation.baseline.var95),
            format_currency(simulation.mitigated.var95),
            format_currency(simulation.baseline.es95),
            format_currency(simulation.mitigated.es95)
        ));
    }
    if fallback {
        lines.push("- No structured risks supplied; using the built-in register.".to_string());
    }

    ModuleReport {
        markdown: lines.join("\n"),
        sections_present: vec!["Top Risks", "Expected Loss", "Mitigation", "Uncertainty"],
        sections_missing: Vec::new(),
    }
}

/// Currency figures are rendered with thousands separators and no decimals.
fn format_currency(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::context::RequestContext;

    fn bare_risk(name: &str, probability: f64, loss: f64) -> Risk {
        Risk {
            name: name.to_string(),
            probability,
            loss,
            mitigation: None,
        }
    }

    fn input_of(risks: Vec<Risk>) -> RiskInput {
        RiskInput {
            risks,
            apply_mitigation: true,
            simulate: false,
            trials: 100,
            seed: Some(7),
        }
    }

    #[test]
    fn expected_loss_totals_match_the_reference_scenario() {
        let input = input_of(vec![
            bare_risk("a", 0.30, 15_000.0),
            bare_risk("b", 0.05, 80_000.0),
        ]);
        let evaluation = RiskEngine::evaluate(&input).expect("valid risks");
        assert!((evaluation.totals.el_before - 8_500.0).abs() < 1e-9);
        assert!((evaluation.totals.el_after - 8_500.0).abs() < 1e-9);
    }

    #[test]
    fn ledger_is_ranked_by_exposure_descending() {
        let input = input_of(vec![
            bare_risk("small", 0.10, 1_000.0),
            bare_risk("large", 0.50, 50_000.0),
        ]);
        let evaluation = RiskEngine::evaluate(&input).expect("valid risks");
        assert_eq!(evaluation.ledger[0].name, "large");
    }

    #[test]
    fn mitigation_never_increases_expected_loss() {
        let mut risk = bare_risk("r", 0.4, 10_000.0);
        risk.mitigation = Some(Mitigation {
            delta_probability: 0.1,
            delta_loss: 2_000.0,
            cost: 500.0,
        });
        let evaluation = RiskEngine::evaluate(&input_of(vec![risk])).expect("valid risks");
        let row = &evaluation.ledger[0];
        assert!(row.el_after <= row.el_before);
        assert!(row.el_before <= row.loss);
        assert!((row.el_before - 4_000.0).abs() < 1e-9);
        assert!((row.el_after - 0.3 * 8_000.0).abs() < 1e-9);
        assert!((row.net_gain - (row.reduction - 500.0)).abs() < 1e-9);
    }

    #[test]
    fn inputs_are_clamped_to_valid_ranges() {
        let mut risk = bare_risk("r", 1.7, -50.0);
        risk.mitigation = Some(Mitigation {
            delta_probability: 2.0,
            delta_loss: 0.0,
            cost: 0.0,
        });
        let evaluation = RiskEngine::evaluate(&input_of(vec![risk])).expect("valid risks");
        let row = &evaluation.ledger[0];
        assert_eq!(row.probability, 1.0);
        assert_eq!(row.loss, 0.0);
        assert_eq!(row.probability_after, 0.0);
    }

    #[test]
    fn zero_cost_mitigation_with_reduction_reports_unbounded_roi() {
        let mut risk = bare_risk("r", 0.5, 1_000.0);
        risk.mitigation = Some(Mitigation {
            delta_probability: 0.2,
            delta_loss: 0.0,
            cost: 0.0,
        });
        let evaluation = RiskEngine::evaluate(&input_of(vec![risk])).expect("valid risks");
        assert_eq!(evaluation.ledger[0].roi, Roi::Unbounded);
    }

    #[test]
    fn no_reduction_and_no_cost_reports_not_applicable() {
        let evaluation =
            RiskEngine::evaluate(&input_of(vec![bare_risk("r", 0.5, 1_000.0)])).expect("valid");
        assert_eq!(evaluation.ledger[0].roi, Roi::NotApplicable);
    }

    #[test]
    fn disabled_mitigation_keeps_expected_loss_unchanged() {
        let mut risk = bare_risk("r", 0.4, 10_000.0);
        risk.mitigation = Some(Mitigation {
            delta_probability: 0.2,
            delta_loss: 5_000.0,
            cost: 100.0,
        });
        let mut input = input_of(vec![risk]);
        input.apply_mitigation = false;
        let evaluation = RiskEngine::evaluate(&input).expect("valid risks");
        let row = &evaluation.ledger[0];
        assert!((row.el_after - row.el_before).abs() < 1e-9);
    }

    #[test]
    fn empty_register_is_rejected() {
        assert!(RiskEngine::evaluate(&input_of(Vec::new())).is_err());
    }

    #[test]
    fn currency_rendering_groups_thousands() {
        assert_eq!(format_currency(0.0), "0");
        assert_eq!(format_currency(8_500.0), "8,500");
        assert_eq!(format_currency(1_234_567.4), "1,234,567");
        assert_eq!(format_currency(-2_500.0), "-2,500");
    }

    #[test]
    fn module_renders_required_sections_from_fallback_data() {
        let request = RequestContext::default();
        let ctx = ModuleContext { request: &request };
        let report = RiskExpectedLossModule
            .generate("what are the risks", &ctx)
            .expect("fallback data renders");

        for section in ModuleId::RiskExpectedLoss.required_sections() {
            assert!(report.sections_present.contains(section));
        }
        assert!(report.markdown.contains("built-in register"));
    }
}
