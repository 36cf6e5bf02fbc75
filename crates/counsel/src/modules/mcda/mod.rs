mod scoring;
mod weights;

pub use weights::ConsistencyReport;

use super::{ModuleContext, ModuleError, ModuleId, ModuleReport, ReportModule};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Direction of preference for a criterion's raw values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    Benefit,
    Cost,
}

impl Polarity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Benefit => "benefit",
            Self::Cost => "cost",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    #[serde(default)]
    pub polarity: Polarity,
    /// Direct weight; ignored when a pairwise matrix is supplied.
    #[serde(default)]
    pub weight: Option<f64>,
}

/// A named alternative with raw attribute values keyed by criterion name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McdaOption {
    pub name: String,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McdaInput {
    pub criteria: Vec<Criterion>,
    pub options: Vec<McdaOption>,
    /// Optional n x n reciprocal comparison matrix over `criteria`, in the
    /// same order. When present, weights are derived via the geometric-mean
    /// method instead of the direct weights.
    #[serde(default)]
    pub pairwise: Option<Vec<Vec<f64>>>,
}

/// Criterion as actually used after weight derivation and imputation.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveCriterion {
    pub name: String,
    pub polarity: Polarity,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct McdaEvaluation {
    pub criteria: Vec<EffectiveCriterion>,
    /// Options with imputed values filled in; input order preserved.
    pub options: Vec<McdaOption>,
    /// Normalized scores indexed `[criterion][option]`, matching the order
    /// of `criteria` and `options`.
    pub normalized: Vec<Vec<f64>>,
    /// `(option name, utility)` ranked descending; ties keep first-seen order.
    pub utilities: Vec<(String, f64)>,
    pub winner: String,
    pub consistency: Option<ConsistencyReport>,
    pub sensitivity: Vec<String>,
    pub diagnostics: Vec<String>,
}

/// Weighted-utility scorer over min-max normalized criteria.
pub struct McdaEngine;

impl McdaEngine {
    pub fn evaluate(input: &McdaInput) -> Result<McdaEvaluation, ModuleError> {
        if input.criteria.is_empty() {
            return Err(invalid("at least one criterion is required"));
        }
        if input.options.is_empty() {
            return Err(invalid("at least one option is required"));
        }

        let mut diagnostics = Vec::new();

        let (raw_weights, consistency) = match &input.pairwise {
            Some(matrix) => {
                let (w, report) = weights::derive_pairwise(matrix, input.criteria.len())
                    .map_err(invalid)?;
                if !report.acceptable {
                    diagnostics.push(format!(
                        "Pairwise consistency ratio {:.3} >= 0.10; derived weights are unreliable but still applied.",
                        report.cr
                    ));
                }
                (w, Some(report))
            }
            None => {
                let (w, mut notes) = weights::derive_direct(&input.criteria);
                diagnostics.append(&mut notes);
                (w, None)
            }
        };

        let prepared = scoring::prepare(&input.criteria, &raw_weights, &input.options);
        diagnostics.extend(prepared.diagnostics);
        let criteria = prepared.criteria;
        let options = prepared.options;
        if criteria.is_empty() {
            return Err(invalid("no criterion has a value for any option"));
        }

        let normalized = scoring::normalize(&criteria, &options);
        let utilities = scoring::rank_utilities(&criteria, &normalized, &options);
        let winner = utilities[0].0.clone();
        let sensitivity = scoring::sensitivity(&criteria, &normalized, &options, &winner);

        Ok(McdaEvaluation {
            criteria,
            options,
            normalized,
            utilities,
            winner,
            consistency,
            sensitivity,
            diagnostics,
        })
    }
}

fn invalid(reason: impl Into<String>) -> ModuleError {
    ModuleError::InvalidInput {
        module: ModuleId::StrategyMcda.label(),
        reason: reason.into(),
    }
}

/// Built-in comparison set used when the request carries no MCDA input.
pub fn sample_input() -> McdaInput {
    let criteria = vec![
        Criterion {
            name: "Impact".to_string(),
            polarity: Polarity::Benefit,
            weight: Some(0.5),
        },
        Criterion {
            name: "Cost".to_string(),
            polarity: Polarity::Cost,
            weight: Some(0.3),
        },
        Criterion {
            name: "Risk".to_string(),
            polarity: Polarity::Cost,
            weight: Some(0.2),
        },
    ];

    let option = |name: &str, impact: f64, cost: f64, risk: f64| McdaOption {
        name: name.to_string(),
        values: BTreeMap::from([
            ("Impact".to_string(), impact),
            ("Cost".to_string(), cost),
            ("Risk".to_string(), risk),
        ]),
    };

    McdaInput {
        criteria,
        options: vec![
            option("A", 8.0, 7000.0, 0.25),
            option("B", 7.0, 5500.0, 0.30),
            option("C", 6.0, 4800.0, 0.40),
        ],
        pairwise: None,
    }
}

/// Multi-criteria comparison report backed by [`McdaEngine`].
pub struct StrategyMcdaModule;

impl ReportModule for StrategyMcdaModule {
    fn id(&self) -> ModuleId {
        ModuleId::StrategyMcda
    }

    fn generate(
        &self,
        _user_text: &str,
        ctx: &ModuleContext<'_>,
    ) -> Result<ModuleReport, ModuleError> {
        let (input, mut preamble) = match &ctx.request.mcda {
            Some(input) => (input.clone(), Vec::new()),
            None => (
                sample_input(),
                vec!["No structured options supplied; using the built-in A/B/C comparison set.".to_string()],
            ),
        };

        let evaluation = McdaEngine::evaluate(&input)?;
        preamble.extend(evaluation.diagnostics.iter().cloned());

        Ok(render(&evaluation, &preamble))
    }
}

fn render(evaluation: &McdaEvaluation, diagnostics: &[String]) -> ModuleReport {
    let mut lines = vec!["# StrategyMCDA".to_string(), "**Criteria:**".to_string()];
    for criterion in &evaluation.criteria {
        lines.push(format!(
            "- {} ({})",
            criterion.name,
            criterion.polarity.label()
        ));
    }

    lines.push(String::new());
    lines.push("**Weights:**".to_string());
    for criterion in &evaluation.criteria {
        lines.push(format!("- {}: {:.3}", criterion.name, criterion.weight));
    }

    lines.push(String::new());
    lines.push("**Options:**".to_string());
    for option in &evaluation.options {
        let values = evaluation
            .criteria
            .iter()
            .filter_map(|criterion| {
                option
                    .values
                    .get(&criterion.name)
                    .map(|value| format!("{}={}", criterion.name, value))
            })
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("- {}: {}", option.name, values));
    }

    lines.push(String::new());
    lines.push("**Scores:**".to_string());
    for (name, utility) in &evaluation.utilities {
        let index = evaluation
            .options
            .iter()
            .position(|option| &option.name == name)
            .unwrap_or(0);
        let parts = evaluation
            .criteria
            .iter()
            .enumerate()
            .map(|(c, criterion)| format!("{}:{:.3}", criterion.name, evaluation.normalized[c][index]))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("- {name}: U={utility:.3} | [{parts}]"));
    }

    lines.push(String::new());
    lines.push("**Recommendation:**".to_string());
    lines.push(format!(
        "Choose {} (highest weighted utility).",
        evaluation.winner
    ));

    let mut sections = vec!["Criteria", "Weights", "Options", "Scores", "Recommendation"];

    if let Some(report) = &evaluation.consistency {
        lines.push(String::new());
        lines.push("**Consistency:**".to_string());
        let verdict = if report.acceptable {
            "acceptable"
        } else {
            "weights unreliable"
        };
        lines.push(format!(
            "- lambda_max={:.3}, CI={:.3}, CR={:.3} ({verdict})",
            report.lambda_max, report.ci, report.cr
        ));
        sections.push("Consistency");
    }

    lines.push(String::new());
    lines.push("**Sensitivity:**".to_string());
    for note in &evaluation.sensitivity {
        lines.push(format!("- {note}"));
    }
    sections.push("Sensitivity");

    lines.push(String::new());
    lines.push("**Diagnostics:**".to_string());
    if diagnostics.is_empty() {
        lines.push("- Input used as provided.".to_string());
    } else {
        for note in diagnostics {
            lines.push(format!("- {note}"));
        }
    }
    sections.push("Diagnostics");

    ModuleReport {
        markdown: lines.join("\n"),
        sections_present: sections,
        sections_missing: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::context::RequestContext;

    fn two_option_input() -> McdaInput {
        let mut input = sample_input();
        input.options.truncate(2);
        input
    }

    #[test]
    fn cost_polarity_rewards_the_cheaper_option() {
        let evaluation = McdaEngine::evaluate(&two_option_input()).expect("valid input");
        let cost_index = evaluation
            .criteria
            .iter()
            .position(|criterion| criterion.name == "Cost")
            .expect("cost criterion kept");
        // B (5500) is cheaper than A (7000), so its normalized Cost score
        // must exceed A's.
        let a = evaluation.normalized[cost_index][0];
        let b = evaluation.normalized[cost_index][1];
        assert!(b > a, "expected B ({b}) > A ({a})");
    }

    #[test]
    fn weights_sum_to_one_after_normalization() {
        let evaluation = McdaEngine::evaluate(&sample_input()).expect("valid input");
        let total: f64 = evaluation
            .criteria
            .iter()
            .map(|criterion| criterion.weight)
            .sum();
        assert!((total - 1.0).abs() < 1e-9, "weights sum to {total}");
    }

    #[test]
    fn utilities_are_invariant_under_uniform_rescaling() {
        let base = McdaEngine::evaluate(&two_option_input()).expect("valid input");

        let mut rescaled = two_option_input();
        for option in &mut rescaled.options {
            if let Some(value) = option.values.get_mut("Cost") {
                *value *= 1000.0;
            }
        }
        let scaled = McdaEngine::evaluate(&rescaled).expect("valid input");

        for ((name_a, utility_a), (name_b, utility_b)) in
            base.utilities.iter().zip(scaled.utilities.iter())
        {
            assert_eq!(name_a, name_b);
            assert!((utility_a - utility_b).abs() < 1e-9);
        }
    }

    #[test]
    fn equal_raw_values_score_neutral() {
        let mut input = two_option_input();
        for option in &mut input.options {
            option.values.insert("Risk".to_string(), 0.3);
        }
        let evaluation = McdaEngine::evaluate(&input).expect("valid input");
        let risk_index = evaluation
            .criteria
            .iter()
            .position(|criterion| criterion.name == "Risk")
            .expect("risk criterion kept");
        for score in &evaluation.normalized[risk_index] {
            assert!((score - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn missing_value_is_imputed_with_the_median() {
        let mut input = sample_input();
        input.options[2].values.remove("Impact");
        let evaluation = McdaEngine::evaluate(&input).expect("valid input");

        let filled = evaluation.options[2]
            .values
            .get("Impact")
            .copied()
            .expect("value imputed");
        // Values 7 and 8 remain; sorted[len/2] picks 8.
        assert!((filled - 8.0).abs() < 1e-9);
        assert!(evaluation
            .diagnostics
            .iter()
            .any(|note| note.contains("Imputed")));
    }

    #[test]
    fn criterion_without_any_value_is_dropped() {
        let mut input = sample_input();
        input.criteria.push(Criterion {
            name: "Morale".to_string(),
            polarity: Polarity::Benefit,
            weight: Some(0.2),
        });
        let evaluation = McdaEngine::evaluate(&input).expect("valid input");

        assert!(evaluation
            .criteria
            .iter()
            .all(|criterion| criterion.name != "Morale"));
        assert!(evaluation
            .diagnostics
            .iter()
            .any(|note| note.contains("Morale")));
        let total: f64 = evaluation
            .criteria
            .iter()
            .map(|criterion| criterion.weight)
            .sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_options_are_rejected() {
        let mut input = sample_input();
        input.options.clear();
        assert!(McdaEngine::evaluate(&input).is_err());
    }

    #[test]
    fn module_renders_required_sections_from_fallback_data() {
        let request = RequestContext::default();
        let ctx = ModuleContext { request: &request };
        let report = StrategyMcdaModule
            .generate("compare a and b", &ctx)
            .expect("fallback data renders");

        for section in ModuleId::StrategyMcda.required_sections() {
            assert!(report.sections_present.contains(section));
        }
        assert!(report.markdown.contains("built-in A/B/C"));
    }
}
