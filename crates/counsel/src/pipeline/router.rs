use crate::config::{IntentSpec, RoutingConfig, RoutingPolicies};
use crate::modules::ModuleId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Length beyond which each extra token adds a small score bonus.
const LENGTH_BONUS_FLOOR: usize = 12;
const LENGTH_BONUS_PER_TOKEN: f64 = 0.05;

/// Splits text into lowercase tokens of alphanumerics and hyphens. Shared
/// with the claim scanner so both sides agree on word boundaries.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '-' {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// One routing decision, carried through the run and mirrored into the
/// summary.
#[derive(Debug, Clone, Serialize)]
pub struct RouteResult {
    pub selected_modules: Vec<ModuleId>,
    pub intent: String,
    /// All intents with their scores, best first. Ties keep configuration
    /// order.
    pub intents_ranked: Vec<(String, f64)>,
    pub confidence: f64,
    pub keyword_hits: BTreeMap<String, Vec<String>>,
    /// Intents with at least one keyword hit, in configuration order.
    pub triggers_hit: Vec<String>,
    /// "ok", or an advisory when confidence falls below the threshold.
    pub self_check: String,
    pub max_modules: usize,
}

/// Keyword router. Scores every configured intent against the tokenized
/// request and picks the winner's module list.
#[derive(Debug, Clone)]
pub struct Router {
    intents: Vec<IntentSpec>,
    policies: RoutingPolicies,
}

impl Router {
    pub fn new(config: &RoutingConfig) -> Self {
        Self {
            intents: config.intents.clone(),
            policies: config.policies.clone(),
        }
    }

    pub fn evaluate(&self, user_text: &str) -> RouteResult {
        let tokens = tokenize(user_text);
        let length_bonus = LENGTH_BONUS_PER_TOKEN
            * tokens.len().saturating_sub(LENGTH_BONUS_FLOOR) as f64;

        let mut keyword_hits = BTreeMap::new();
        let mut triggers_hit = Vec::new();
        let mut ranked: Vec<(String, f64)> = Vec::with_capacity(self.intents.len());
        let mut any_hits = false;

        for intent in &self.intents {
            let hits: Vec<String> = intent
                .keywords
                .iter()
                .filter(|keyword| tokens.iter().any(|token| token == *keyword))
                .cloned()
                .collect();
            if !hits.is_empty() {
                any_hits = true;
                triggers_hit.push(intent.name.clone());
            }
            let score = hits.len() as f64 + length_bonus;
            keyword_hits.insert(intent.name.clone(), hits);
            ranked.push((intent.name.clone(), score));
        }

        // Stable sort keeps configuration order among equal scores.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let (intent, top_score) = ranked
            .first()
            .map(|(name, score)| (name.clone(), *score))
            .unwrap_or_else(|| ("strategic".to_string(), 0.0));
        let second_score = ranked.get(1).map(|(_, score)| *score).unwrap_or(0.0);

        // Without a single keyword hit the length bonus alone must not
        // manufacture confidence or a winner.
        let confidence = if !any_hits {
            0.0
        } else {
            let denom = if top_score + second_score > 0.0 {
                top_score + second_score
            } else {
                1.0
            };
            round2(top_score / denom)
        };

        let max_modules = self.policies.max_modules;
        let selected_modules = if self.policies.auto_detect && any_hits && top_score > 0.0 {
            let winner = self
                .intents
                .iter()
                .find(|spec| spec.name == intent)
                .map(|spec| spec.modules.clone())
                .unwrap_or_else(|| self.policies.default_modules.clone());
            truncate(winner, max_modules)
        } else {
            truncate(self.policies.default_modules.clone(), max_modules)
        };

        let self_check = if confidence < self.policies.confidence_threshold {
            "low-confidence: ask clarifiers (goal/constraints/timeframe)".to_string()
        } else {
            "ok".to_string()
        };

        RouteResult {
            selected_modules,
            intent,
            intents_ranked: ranked,
            confidence,
            keyword_hits,
            triggers_hit,
            self_check,
            max_modules,
        }
    }
}

fn truncate(mut modules: Vec<ModuleId>, max: usize) -> Vec<ModuleId> {
    modules.truncate(max);
    modules
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
