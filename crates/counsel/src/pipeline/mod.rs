pub mod context;
pub mod registry;
pub mod router;
pub mod validator;

use crate::config::RoutingConfig;
use crate::evaluators::{standard_evaluators, Evaluator, EvaluatorError, EvaluatorVerdict};
use crate::memory::ProjectMemory;
use crate::modules::{ModuleContext, ModuleId};
use context::{RequestContext, ResponseMode};
use registry::ModuleRegistry;
use router::{RouteResult, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Full result of one pipeline run: the rendered report, the structured
/// summary, and the stage trace.
#[derive(Debug, Serialize)]
pub struct PipelineOutcome {
    pub markdown: String,
    pub summary: PipelineSummary,
    pub telemetry: Vec<&'static str>,
}

/// Machine-readable mirror of the run, suitable for callers that never
/// render the markdown.
#[derive(Debug, Serialize)]
pub struct PipelineSummary {
    pub triggers_hit: Vec<String>,
    pub applied_modules: Vec<&'static str>,
    pub sections_present: Vec<String>,
    pub missing_sections: Vec<String>,
    pub confidence: f64,
    pub intent: String,
    pub intents_ranked: Vec<(String, f64)>,
    pub keyword_hits: BTreeMap<String, Vec<String>>,
    pub self_check: String,
    pub max_modules: usize,
    pub evaluations: BTreeMap<&'static str, EvaluatorVerdict>,
}

/// Orchestrates routing, module execution, validation, evaluation, assembly
/// and memory. Module and evaluator failures are isolated at their own
/// boundary; only routing or assembly problems would surface to the caller,
/// and both are infallible by construction.
pub struct Pipeline<M: ProjectMemory> {
    router: Router,
    registry: ModuleRegistry,
    evaluators: Vec<Box<dyn Evaluator>>,
    memory: Arc<M>,
}

impl<M: ProjectMemory> Pipeline<M> {
    pub fn new(routing: &RoutingConfig, memory: Arc<M>) -> Self {
        Self::with_parts(
            Router::new(routing),
            ModuleRegistry::standard(),
            standard_evaluators(),
            memory,
        )
    }

    /// Assembly seam for tests that substitute generators or evaluators.
    pub fn with_parts(
        router: Router,
        registry: ModuleRegistry,
        evaluators: Vec<Box<dyn Evaluator>>,
        memory: Arc<M>,
    ) -> Self {
        Self {
            router,
            registry,
            evaluators,
            memory,
        }
    }

    pub fn run(&self, user_text: &str, ctx: &RequestContext) -> PipelineOutcome {
        let mut telemetry = vec!["start"];
        info!(project_id = %ctx.project_id, "pipeline run started");

        let route = self.router.evaluate(user_text);
        info!(
            intent = %route.intent,
            confidence = route.confidence,
            modules = ?route.selected_modules,
            self_check = %route.self_check,
            "routing decision"
        );
        telemetry.push("routed");

        let module_ctx = ModuleContext { request: ctx };
        let mut blocks: Vec<String> = Vec::with_capacity(route.selected_modules.len());
        let mut sections_present: Vec<String> = Vec::new();
        let mut sections_missing: Vec<String> = Vec::new();

        for id in &route.selected_modules {
            let (markdown, present, missing) =
                self.run_module_isolated(*id, user_text, &module_ctx);
            blocks.push(markdown);
            sections_present.extend(present);
            sections_missing.extend(missing);
        }
        telemetry.push("modules_run");

        let mut missing = validator::missing_sections(&route.selected_modules, &sections_present);
        missing.extend(sections_missing);
        missing.sort();
        missing.dedup();
        telemetry.push("validated");

        let body = blocks.join("\n");
        let evaluations = self.run_evaluators_isolated(&body, ctx);
        telemetry.push("evaluated");

        let markdown = assemble(&route, &blocks, &evaluations, ctx.mode);
        telemetry.push("assembled");

        match self.remember(ctx, &route) {
            Ok(()) => telemetry.push("memorized"),
            Err(err) => {
                warn!(error = %err, "memory append failed; continuing");
                telemetry.push("memory_skipped");
            }
        }

        telemetry.push("done");
        info!(modules = route.selected_modules.len(), "pipeline run finished");

        PipelineOutcome {
            markdown,
            summary: PipelineSummary {
                triggers_hit: route.triggers_hit,
                applied_modules: route
                    .selected_modules
                    .iter()
                    .map(|id| id.label())
                    .collect(),
                sections_present,
                missing_sections: missing,
                confidence: route.confidence,
                intent: route.intent,
                intents_ranked: route.intents_ranked.into_iter().take(5).collect(),
                keyword_hits: route.keyword_hits,
                self_check: route.self_check,
                max_modules: route.max_modules,
                evaluations,
            },
            telemetry,
        }
    }

    /// Runs one generator, converting every failure mode into a placeholder
    /// block so sibling modules and the run itself always proceed.
    fn run_module_isolated(
        &self,
        id: ModuleId,
        user_text: &str,
        ctx: &ModuleContext<'_>,
    ) -> (String, Vec<String>, Vec<String>) {
        let Some(module) = self.registry.resolve(id) else {
            warn!(module = id.label(), "no generator registered");
            return (
                format!(
                    "# {}\n_Module generator unavailable; produced a minimal placeholder._\n",
                    id.label()
                ),
                Vec::new(),
                Vec::new(),
            );
        };

        match module.generate(user_text, ctx) {
            Ok(report) => {
                let markdown = if report.markdown.trim().is_empty() {
                    format!("# {}\n_(no output)_\n", id.label())
                } else {
                    report.markdown
                };
                (
                    markdown,
                    report
                        .sections_present
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    report
                        .sections_missing
                        .iter()
                        .map(|s| format!("{}: {}", id.label(), s))
                        .collect(),
                )
            }
            Err(err) => {
                warn!(module = id.label(), error = %err, "module failed; isolated");
                (
                    format!("# {}\n_Error while running module: {err}_\n", id.label()),
                    Vec::new(),
                    Vec::new(),
                )
            }
        }
    }

    fn run_evaluators_isolated(
        &self,
        report_text: &str,
        ctx: &RequestContext,
    ) -> BTreeMap<&'static str, EvaluatorVerdict> {
        let mut verdicts = BTreeMap::new();
        for evaluator in &self.evaluators {
            let verdict = match evaluator.assess(report_text, ctx) {
                Ok(payload) => EvaluatorVerdict::Ok(payload),
                Err(EvaluatorError::MissingInput(field)) => {
                    info!(evaluator = evaluator.name(), field, "skipped: input missing");
                    EvaluatorVerdict::Unavailable
                }
                Err(EvaluatorError::Failed(reason)) => {
                    warn!(evaluator = evaluator.name(), %reason, "evaluator failed; isolated");
                    EvaluatorVerdict::Error(reason)
                }
            };
            verdicts.insert(evaluator.name(), verdict);
        }
        verdicts
    }

    fn remember(
        &self,
        ctx: &RequestContext,
        route: &RouteResult,
    ) -> Result<(), crate::memory::MemoryError> {
        let decisions = vec![format!(
            "intent={} modules=[{}]",
            route.intent,
            route
                .selected_modules
                .iter()
                .map(|id| id.label())
                .collect::<Vec<_>>()
                .join(", ")
        )];
        let next_steps = if route.self_check == "ok" {
            Vec::new()
        } else {
            vec![route.self_check.clone()]
        };
        self.memory
            .append(&ctx.project_id, &route.triggers_hit, &decisions, &next_steps)
    }
}

fn assemble(
    route: &RouteResult,
    blocks: &[String],
    evaluations: &BTreeMap<&'static str, EvaluatorVerdict>,
    mode: ResponseMode,
) -> String {
    let modules = if route.selected_modules.is_empty() {
        "-".to_string()
    } else {
        route
            .selected_modules
            .iter()
            .map(|id| id.label())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let hits = route
        .keyword_hits
        .get(&route.intent)
        .filter(|hits| !hits.is_empty())
        .map(|hits| hits.join(","))
        .unwrap_or_else(|| "-".to_string());

    let mut parts = vec![
        "# COUNSEL SUMMARY OUTPUT".to_string(),
        format!("ACTIVE MODULES: {modules}"),
        format!("CORE TASK: ['{}']", route.intent),
        format!(
            "ROUTING TRACE: intent={} ({}) | keywords=[{}] | modules=[{}] | self_check={}\n",
            route.intent, route.confidence, hits, modules, route.self_check
        ),
    ];
    parts.extend(blocks.iter().cloned());

    parts.push("## Evaluator Notes".to_string());
    let mut notes = String::new();
    for (name, verdict) in evaluations {
        let rendered = match verdict {
            EvaluatorVerdict::Ok(payload) => payload.to_string(),
            EvaluatorVerdict::Error(reason) => format!("error: {reason}"),
            EvaluatorVerdict::Unavailable => "unavailable".to_string(),
        };
        notes.push_str(&format!("- **{name}**: {rendered}\n"));
    }
    parts.push(notes);

    if mode == ResponseMode::Pro {
        parts.push(method_notes().to_string());
    }

    parts.join("\n")
}

/// Extended explanation appended in pro mode.
fn method_notes() -> &'static str {
    "## Method Notes\n\
     - Routing: intents are scored by keyword hits plus a small length bonus; \
     confidence is top score over the sum of the top two.\n\
     - StrategyMCDA: weights come from direct values or pairwise comparisons \
     (geometric-mean eigenvector, consistency ratio checked against 0.10); \
     values are min-max normalized per criterion with cost criteria inverted; \
     utility is the weighted sum. Sensitivity re-runs the ranking with each \
     weight raised by 0.10 and renormalized.\n\
     - RiskExpectedLoss: expected loss is probability times loss; mitigation \
     ROI is expected-loss reduction over mitigation cost. The optional Monte \
     Carlo pass simulates independent risk realizations and reports VaR95 and \
     ES95 of total loss.\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryError, MemorySnapshot};
    use std::sync::Mutex;

    /// In-memory double capturing append calls.
    #[derive(Default)]
    struct RecordingMemory {
        appends: Mutex<Vec<String>>,
    }

    impl ProjectMemory for RecordingMemory {
        fn load(&self, _project_id: &str) -> Result<MemorySnapshot, MemoryError> {
            Ok(MemorySnapshot::default())
        }

        fn append(
            &self,
            project_id: &str,
            _topics: &[String],
            _decisions: &[String],
            _next_steps: &[String],
        ) -> Result<(), MemoryError> {
            self.appends
                .lock()
                .expect("lock")
                .push(project_id.to_string());
            Ok(())
        }
    }

    fn pipeline() -> (Arc<RecordingMemory>, Pipeline<RecordingMemory>) {
        let memory = Arc::new(RecordingMemory::default());
        let pipeline = Pipeline::new(&RoutingConfig::standard(), Arc::clone(&memory));
        (memory, pipeline)
    }

    #[test]
    fn run_records_memory_under_the_project_id() {
        let (memory, pipeline) = pipeline();
        let ctx = RequestContext {
            project_id: "PX-7".to_string(),
            ..RequestContext::default()
        };
        pipeline.run("Compare the options and decide", &ctx);
        assert_eq!(
            memory.appends.lock().expect("lock").as_slice(),
            &["PX-7".to_string()]
        );
    }

    #[test]
    fn telemetry_traces_every_stage() {
        let (_memory, pipeline) = pipeline();
        let outcome = pipeline.run("plan the roadmap", &RequestContext::default());
        assert_eq!(outcome.telemetry.first(), Some(&"start"));
        assert!(outcome.telemetry.contains(&"memorized"));
        assert_eq!(outcome.telemetry.last(), Some(&"done"));
    }

    #[test]
    fn pro_mode_appends_method_notes() {
        let (_memory, pipeline) = pipeline();
        let ctx = RequestContext {
            mode: ResponseMode::Pro,
            ..RequestContext::default()
        };
        let outcome = pipeline.run("plan the roadmap", &ctx);
        assert!(outcome.markdown.contains("## Method Notes"));

        let standard = pipeline.run("plan the roadmap", &RequestContext::default());
        assert!(!standard.markdown.contains("## Method Notes"));
    }
}
