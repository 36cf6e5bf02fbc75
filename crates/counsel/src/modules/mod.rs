pub mod mcda;
pub mod risk;
pub mod structure;

use crate::pipeline::context::RequestContext;
use serde::{Deserialize, Serialize};

/// Closed set of report generators known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleId {
    Structure,
    StrategyMcda,
    RiskExpectedLoss,
}

impl ModuleId {
    pub const fn ordered() -> [Self; 3] {
        [Self::Structure, Self::StrategyMcda, Self::RiskExpectedLoss]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Structure => "Structure",
            Self::StrategyMcda => "StrategyMCDA",
            Self::RiskExpectedLoss => "RiskExpectedLoss",
        }
    }

    /// Minimum headings a generator for this module is expected to produce.
    pub const fn required_sections(self) -> &'static [&'static str] {
        match self {
            Self::Structure => &["Thesis", "Key Points", "Actions", "Next Step"],
            Self::StrategyMcda => &["Criteria", "Weights", "Options", "Scores", "Recommendation"],
            Self::RiskExpectedLoss => &["Top Risks", "Expected Loss", "Mitigation"],
        }
    }

    /// Accepts both the display label and the snake_case form used in
    /// heuristics files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Structure" | "structure" => Some(Self::Structure),
            "StrategyMCDA" | "strategy_mcda" => Some(Self::StrategyMcda),
            "RiskExpectedLoss" | "risk_expected_loss" => Some(Self::RiskExpectedLoss),
            _ => None,
        }
    }
}

/// Rendered output of one generator invocation, consumed within a single
/// pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub markdown: String,
    pub sections_present: Vec<&'static str>,
    pub sections_missing: Vec<&'static str>,
}

/// Error raised inside a single generator; caught at that module's boundary.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("invalid input for {module}: {reason}")]
    InvalidInput {
        module: &'static str,
        reason: String,
    },
    #[error("{module} produced no usable output")]
    EmptyOutput { module: &'static str },
}

/// Request-scoped data handed to every generator.
pub struct ModuleContext<'a> {
    pub request: &'a RequestContext,
}

/// A report generator resolvable through the registry.
pub trait ReportModule: Send + Sync {
    fn id(&self) -> ModuleId;

    fn generate(
        &self,
        user_text: &str,
        ctx: &ModuleContext<'_>,
    ) -> Result<ModuleReport, ModuleError>;
}
