use crate::modules::mcda::StrategyMcdaModule;
use crate::modules::risk::RiskExpectedLossModule;
use crate::modules::structure::StructureModule;
use crate::modules::{ModuleId, ReportModule};

/// Maps module identifiers to their report generators. Built once at
/// startup; lookups during a run never mutate it.
pub struct ModuleRegistry {
    modules: Vec<Box<dyn ReportModule>>,
}

impl ModuleRegistry {
    /// Registry with every built-in generator.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(StructureModule),
            Box::new(StrategyMcdaModule),
            Box::new(RiskExpectedLossModule),
        ])
    }

    pub fn new(modules: Vec<Box<dyn ReportModule>>) -> Self {
        Self { modules }
    }

    pub fn resolve(&self, id: ModuleId) -> Option<&dyn ReportModule> {
        self.modules
            .iter()
            .find(|module| module.id() == id)
            .map(|module| module.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_resolves_every_module() {
        let registry = ModuleRegistry::standard();
        for id in ModuleId::ordered() {
            assert!(registry.resolve(id).is_some(), "missing generator for {id:?}");
        }
    }

    #[test]
    fn empty_registry_resolves_nothing() {
        let registry = ModuleRegistry::new(Vec::new());
        assert!(registry.resolve(ModuleId::Structure).is_none());
    }
}
