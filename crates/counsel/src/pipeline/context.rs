use crate::modules::mcda::McdaInput;
use crate::modules::risk::RiskInput;
use serde::Deserialize;

/// Structured side-channel accompanying the free-text request. Every field
/// is optional on the wire; missing data degrades individual modules and
/// evaluators, never the run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    /// Memory key. Requests without one share the anonymous bucket.
    pub project_id: String,
    pub mcda: Option<McdaInput>,
    pub risk: Option<RiskInput>,
    pub mode: ResponseMode,
    /// Caller's own probability of success, 0..1.
    pub self_prob: Option<f64>,
    pub model_prob: Option<f64>,
    /// Realized outcome (0 or 1) of a previously stated prediction.
    pub outcome: Option<u8>,
    /// Marks the request as time-sensitive, which makes missing citations
    /// an evidence finding.
    pub timely: bool,
    pub citations: Vec<String>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            mcda: None,
            risk: None,
            mode: ResponseMode::default(),
            self_prob: None,
            model_prob: None,
            outcome: None,
            timely: false,
            citations: Vec::new(),
        }
    }
}

fn default_project_id() -> String {
    "UNKNOWN".to_string()
}

/// Report verbosity. Pro mode appends a method-notes block explaining how
/// the numbers were produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    #[default]
    Standard,
    Pro,
}
