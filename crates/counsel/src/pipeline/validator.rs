use crate::modules::ModuleId;

/// Compares the sections each selected module was required to emit against
/// what actually appeared. Returns "Module: Section" findings, sorted and
/// deduplicated.
pub fn missing_sections(selected: &[ModuleId], present: &[String]) -> Vec<String> {
    let mut findings: Vec<String> = Vec::new();
    for module in selected {
        for section in module.required_sections() {
            if !present.iter().any(|s| s == section) {
                findings.push(format!("{}: {}", module.label(), section));
            }
        }
    }
    findings.sort();
    findings.dedup();
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_output_has_no_findings() {
        let present: Vec<String> = ModuleId::Structure
            .required_sections()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(missing_sections(&[ModuleId::Structure], &present).is_empty());
    }

    #[test]
    fn dropped_sections_are_named_per_module() {
        let present = vec!["Thesis".to_string(), "Key Points".to_string()];
        let findings = missing_sections(&[ModuleId::Structure], &present);
        assert!(findings.contains(&"Structure: Actions".to_string()));
        assert!(findings.contains(&"Structure: Next Step".to_string()));
    }

    #[test]
    fn findings_are_sorted_and_unique() {
        let findings = missing_sections(
            &[ModuleId::Structure, ModuleId::Structure],
            &[],
        );
        let mut sorted = findings.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(findings, sorted);
    }
}
