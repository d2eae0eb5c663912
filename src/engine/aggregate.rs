//! Module fact aggregation.
//!
//! Detected facts are global; the classification table tags each one with
//! the roadmap modules it belongs to, once per run. A fact may carry several
//! tags. The first tag, in roadmap order, is its primary module.

use crate::analysis::AnalysisSnapshot;
use crate::core::config::ValidatorConfig;
use crate::engine::rules::{check_rule, RuleCheck};
use crate::roadmap::{ModuleDefinition, Roadmap};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImplementationStatus {
    NotStarted,
    InProgress,
    Complete,
}

impl ImplementationStatus {
    pub fn is_started(self) -> bool {
        self != Self::NotStarted
    }

    /// Nothing satisfied means not started; nothing required left open means complete.
    fn from_counts(satisfied: usize, open_required: usize) -> Self {
        if satisfied == 0 {
            Self::NotStarted
        } else if open_required == 0 {
            Self::Complete
        } else {
            Self::InProgress
        }
    }
}

impl fmt::Display for ImplementationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Complete => "COMPLETE",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModuleStatus {
    pub module_id: String,
    pub implementation_status: ImplementationStatus,
    pub detected_entities: Vec<String>,
    pub detected_services: Vec<String>,
    pub detected_endpoints: Vec<String>,
    pub missing_dependencies: Vec<String>,
}

impl ModuleStatus {
    pub fn empty(module_id: &str) -> Self {
        Self {
            module_id: module_id.to_string(),
            implementation_status: ImplementationStatus::NotStarted,
            detected_entities: Vec::new(),
            detected_services: Vec::new(),
            detected_endpoints: Vec::new(),
            missing_dependencies: Vec::new(),
        }
    }
}

/// One detected name and the modules it was tagged with, in roadmap order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedFact {
    pub name: String,
    pub modules: Vec<String>,
}

impl TaggedFact {
    pub fn primary(&self) -> Option<&str> {
        self.modules.first().map(String::as_str)
    }

    fn belongs_to(&self, module_id: &str) -> bool {
        self.modules.iter().any(|m| m == module_id)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationTable {
    pub entities: Vec<TaggedFact>,
    pub services: Vec<TaggedFact>,
    /// Controller simple name, tagged by module id containment.
    pub controllers: Vec<TaggedFact>,
}

fn tag(name: &str, modules: &[(&str, Vec<String>)]) -> TaggedFact {
    let lower = name.to_lowercase();
    TaggedFact {
        name: name.to_string(),
        modules: modules
            .iter()
            .filter(|(_, stems)| stems.iter().any(|stem| lower.contains(stem.as_str())))
            .map(|(id, _)| id.to_string())
            .collect(),
    }
}

impl ClassificationTable {
    pub fn build(snapshot: &AnalysisSnapshot, roadmap: &Roadmap, config: &ValidatorConfig) -> Self {
        let entity_stems: Vec<(&str, Vec<String>)> = roadmap
            .modules
            .iter()
            .map(|m| (m.id.as_str(), config.entity_stems(&m.id)))
            .collect();
        let service_stems: Vec<(&str, Vec<String>)> = roadmap
            .modules
            .iter()
            .map(|m| (m.id.as_str(), config.service_stems(&m.id)))
            .collect();
        let ids: Vec<(&str, Vec<String>)> = roadmap
            .modules
            .iter()
            .map(|m| (m.id.as_str(), vec![m.id.to_lowercase()]))
            .collect();

        let table = Self {
            entities: snapshot.entities.iter().map(|e| tag(e, &entity_stems)).collect(),
            services: snapshot.service_names().map(|s| tag(s, &service_stems)).collect(),
            controllers: snapshot.endpoints.keys().map(|c| tag(c, &ids)).collect(),
        };
        tracing::debug!(
            entities = table.entities.len(),
            services = table.services.len(),
            controllers = table.controllers.len(),
            "classification table built"
        );
        table
    }

    pub fn entities_of(&self, module_id: &str) -> Vec<String> {
        names_of(&self.entities, module_id)
    }

    pub fn services_of(&self, module_id: &str) -> Vec<String> {
        names_of(&self.services, module_id)
    }

    /// Endpoint strings of every controller tagged with the module.
    pub fn endpoints_of(&self, module_id: &str, snapshot: &AnalysisSnapshot) -> Vec<String> {
        self.controllers
            .iter()
            .filter(|c| c.belongs_to(module_id))
            .filter_map(|c| snapshot.endpoints.get(&c.name))
            .flatten()
            .cloned()
            .collect()
    }

    /// Facts tagged with no module at all.
    pub fn unclassified(&self) -> impl Iterator<Item = &TaggedFact> {
        self.entities
            .iter()
            .chain(&self.services)
            .filter(|f| f.modules.is_empty())
    }
}

fn names_of(facts: &[TaggedFact], module_id: &str) -> Vec<String> {
    facts
        .iter()
        .filter(|f| f.belongs_to(module_id))
        .map(|f| f.name.clone())
        .collect()
}

fn infer_status(
    module: &ModuleDefinition,
    entities: &[String],
    services: &[String],
    snapshot: &AnalysisSnapshot,
) -> ImplementationStatus {
    let checks: Vec<(bool, RuleCheck)> = module
        .validation_rules
        .iter()
        .map(|rule| (rule.required, check_rule(rule, services, snapshot)))
        .filter(|(_, check)| *check != RuleCheck::Unsupported)
        .collect();
    if checks.is_empty() {
        if !module.validation_rules.is_empty() {
            tracing::warn!(
                module = %module.id,
                rules = module.validation_rules.len(),
                "no supported validation rule; status inferred from detected entities and services"
            );
        }
        let present = usize::from(!entities.is_empty()) + usize::from(!services.is_empty());
        return ImplementationStatus::from_counts(present, 2 - present);
    }
    let satisfied = checks.iter().filter(|(_, c)| c.is_satisfied()).count();
    let open_required = checks
        .iter()
        .filter(|(required, c)| *required && !c.is_satisfied())
        .count();
    ImplementationStatus::from_counts(satisfied, open_required)
}

pub fn aggregate(module: &ModuleDefinition, table: &ClassificationTable, snapshot: &AnalysisSnapshot) -> ModuleStatus {
    let detected_entities = table.entities_of(&module.id);
    let detected_services = table.services_of(&module.id);
    let implementation_status = infer_status(module, &detected_entities, &detected_services, snapshot);
    let missing_dependencies = module
        .dependencies
        .iter()
        .filter(|dep| !snapshot.mentions(dep))
        .cloned()
        .collect();

    ModuleStatus {
        module_id: module.id.clone(),
        implementation_status,
        detected_endpoints: table.endpoints_of(&module.id, snapshot),
        detected_entities,
        detected_services,
        missing_dependencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roadmap::{RuleKind, ValidationRule};

    fn snapshot() -> AnalysisSnapshot {
        let mut s = AnalysisSnapshot::default();
        s.entities = vec![
            "com.x.domain.model.Presupuesto".to_string(),
            "com.x.domain.model.Partida".to_string(),
            "com.x.domain.model.proyecto.Proyecto".to_string(),
            "com.x.domain.model.Billetera".to_string(),
        ];
        s.services
            .insert("com.x.domain.service.CalculoPresupuestoService".to_string(), vec![]);
        s.endpoints.insert(
            "PresupuestoController".to_string(),
            vec!["GET /presupuestos".to_string()],
        );
        s
    }

    fn roadmap() -> Roadmap {
        Roadmap::new(
            "1.0",
            vec![
                ModuleDefinition::new("proyecto", "Proyecto", "foundation", "critical"),
                ModuleDefinition::new("presupuesto", "Presupuesto", "foundation", "critical")
                    .depends_on(&["proyecto"]),
                ModuleDefinition::new("billetera", "Billetera", "execution", "high"),
            ],
        )
    }

    #[test]
    fn facts_can_carry_several_tags_with_a_primary() {
        let s = snapshot();
        let table = ClassificationTable::build(&s, &roadmap(), &ValidatorConfig::default());
        let billetera = table
            .entities
            .iter()
            .find(|f| f.name.ends_with("Billetera"))
            .unwrap();
        assert_eq!(billetera.modules, vec!["proyecto", "billetera"]);
        assert_eq!(billetera.primary(), Some("proyecto"));
        assert_eq!(
            table.entities_of("presupuesto"),
            vec!["com.x.domain.model.Presupuesto", "com.x.domain.model.Partida"]
        );
        assert_eq!(table.endpoints_of("presupuesto", &s), vec!["GET /presupuestos"]);
        assert_eq!(table.unclassified().count(), 0);
    }

    #[test]
    fn status_without_rules_counts_fact_families() {
        let s = snapshot();
        let r = roadmap();
        let table = ClassificationTable::build(&s, &r, &ValidatorConfig::default());
        let status = aggregate(r.module("presupuesto").unwrap(), &table, &s);
        assert_eq!(status.implementation_status, ImplementationStatus::Complete);
        let status = aggregate(r.module("proyecto").unwrap(), &table, &s);
        assert_eq!(status.implementation_status, ImplementationStatus::InProgress);
    }

    #[test]
    fn status_with_rules_counts_satisfied_rules() {
        let s = snapshot();
        let module = ModuleDefinition::new("presupuesto", "Presupuesto", "foundation", "critical")
            .with_rule(ValidationRule::new(RuleKind::EntityExists, "Presupuesto"))
            .with_rule(ValidationRule::new(RuleKind::StateMachineExists, "EstadoPresupuesto"));
        let r = Roadmap::new("1.0", vec![module.clone()]);
        let table = ClassificationTable::build(&s, &r, &ValidatorConfig::default());
        assert_eq!(
            aggregate(&module, &table, &s).implementation_status,
            ImplementationStatus::InProgress
        );

        let optional_gap = ModuleDefinition::new("presupuesto", "Presupuesto", "foundation", "critical")
            .with_rule(ValidationRule::new(RuleKind::EntityExists, "Presupuesto"))
            .with_rule(ValidationRule::new(RuleKind::StateMachineExists, "EstadoPresupuesto").optional());
        assert_eq!(
            aggregate(&optional_gap, &table, &s).implementation_status,
            ImplementationStatus::Complete
        );

        let optional_only = ModuleDefinition::new("presupuesto", "Presupuesto", "foundation", "critical")
            .with_rule(ValidationRule::new(RuleKind::StateMachineExists, "EstadoPresupuesto").optional());
        assert_eq!(
            aggregate(&optional_only, &table, &s).implementation_status,
            ImplementationStatus::NotStarted
        );

        let unknown_only = ModuleDefinition::new("presupuesto", "Presupuesto", "foundation", "critical")
            .with_rule(ValidationRule::new(RuleKind::Unknown("x".to_string()), "y"));
        assert_eq!(
            aggregate(&unknown_only, &table, &s).implementation_status,
            ImplementationStatus::Complete
        );
    }

    #[test]
    fn missing_dependencies_search_global_names() {
        let s = snapshot();
        let module = ModuleDefinition::new("compras", "Compras", "execution", "high")
            .depends_on(&["Presupuesto", "inventarios"]);
        let r = Roadmap::new("1.0", vec![module.clone()]);
        let table = ClassificationTable::build(&s, &r, &ValidatorConfig::default());
        let status = aggregate(&module, &table, &s);
        assert_eq!(status.missing_dependencies, vec!["inventarios"]);
        assert_eq!(status.implementation_status, ImplementationStatus::NotStarted);
    }
}
