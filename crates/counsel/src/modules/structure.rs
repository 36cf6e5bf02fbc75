use super::{ModuleContext, ModuleError, ModuleId, ModuleReport, ReportModule};

/// Template filler producing a strategic-outline skeleton. Works cold, with
/// no request data beyond the text itself.
pub struct StructureModule;

impl ReportModule for StructureModule {
    fn id(&self) -> ModuleId {
        ModuleId::Structure
    }

    fn generate(
        &self,
        _user_text: &str,
        _ctx: &ModuleContext<'_>,
    ) -> Result<ModuleReport, ModuleError> {
        let key_points = [
            "Clarify the long-term goal (2-3 years).",
            "List constraints and resources (time, money, skills).",
            "Define the decision timeline and success criteria.",
        ];
        let counterpoints = [
            "What if priorities change mid-course?",
            "What if constraints tighten (budget/time)?",
        ];
        let actions = [
            "Write down 1-3 concrete outcomes.",
            "Pick a planning horizon (e.g. 24-36 months).",
            "List the top 3 constraints and 3 resources.",
        ];

        let mut lines = vec![
            "# Structure".to_string(),
            "**Thesis:**".to_string(),
            "You are exploring a strategic overview.".to_string(),
            String::new(),
            "**Key Points:**".to_string(),
        ];
        lines.extend(key_points.iter().map(|point| format!("- {point}")));
        lines.push(String::new());
        lines.push("**Counterpoints:**".to_string());
        lines.extend(counterpoints.iter().map(|point| format!("- {point}")));
        lines.push(String::new());
        lines.push("**Actions:**".to_string());
        lines.extend(actions.iter().map(|action| format!("- {action}")));
        lines.push(String::new());
        lines.push("**Next Step:**".to_string());
        lines.push("Answer: goal, constraints, timeframe.".to_string());

        Ok(ModuleReport {
            markdown: lines.join("\n"),
            sections_present: vec![
                "Thesis",
                "Key Points",
                "Counterpoints",
                "Actions",
                "Next Step",
            ],
            sections_missing: Vec::new(),
        })
    }
}
