//! Canonical roadmap model.
//!
//! The roadmap is an input owned by the project: it declares the modules, the
//! order they must be built in, the constructs each must expose, and the
//! constraints that tie modules together. The engine only reads it.

pub mod loader;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Roadmap {
    #[serde(default)]
    pub version: String,
    #[serde(default, alias = "generatedAt", skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModuleDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModuleDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub enables: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<DependencyConstraint>,
    #[serde(default, alias = "validationRules")]
    pub validation_rules: Vec<ValidationRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    EntityExists,
    ServiceExists,
    StateMachineExists,
    EnumExists,
    PortExists,
    RelationshipExists,
    ReferenceExists,
    #[serde(untagged)]
    Unknown(String),
}

impl RuleKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::EntityExists => "entity_exists",
            Self::ServiceExists => "service_exists",
            Self::StateMachineExists => "state_machine_exists",
            Self::EnumExists => "enum_exists",
            Self::PortExists => "port_exists",
            Self::RelationshipExists => "relationship_exists",
            Self::ReferenceExists => "reference_exists",
            Self::Unknown(raw) => raw,
        }
    }
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default)]
    pub target: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, alias = "requiredMethods", skip_serializing_if = "Vec::is_empty")]
    pub required_methods: Vec<String>,
    #[serde(default, alias = "requiredStates", skip_serializing_if = "Vec::is_empty")]
    pub required_states: Vec<String>,
    #[serde(default, alias = "requiredValues", skip_serializing_if = "Vec::is_empty")]
    pub required_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ValidationRule {
    pub fn new(kind: RuleKind, target: &str) -> Self {
        Self {
            kind,
            target: target.to_string(),
            required: true,
            required_methods: Vec::new(),
            required_states: Vec::new(),
            required_values: Vec::new(),
            source: None,
            field: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_states(mut self, states: &[&str]) -> Self {
        self.required_states = states.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_values(mut self, values: &[&str]) -> Self {
        self.required_values = values.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_methods(mut self, methods: &[&str]) -> Self {
        self.required_methods = methods.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    #[serde(alias = "temporal")]
    TemporalCoupling,
    #[serde(alias = "state_dependency")]
    State,
    StateTransition,
    DataIntegrity,
    #[serde(untagged)]
    Unknown(String),
}

impl ConstraintKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::TemporalCoupling => "temporal_coupling",
            Self::State => "state",
            Self::StateTransition => "state_transition",
            Self::DataIntegrity => "data_integrity",
            Self::Unknown(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependencyConstraint {
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    #[serde(default)]
    pub rule: String,
    #[serde(default, alias = "coupledWith", skip_serializing_if = "Option::is_none")]
    pub coupled_with: Option<String>,
    #[serde(default = "default_constraint_severity")]
    pub severity: String,
}

fn default_constraint_severity() -> String {
    "critical".to_string()
}

impl DependencyConstraint {
    pub fn new(kind: ConstraintKind, rule: &str) -> Self {
        Self {
            kind,
            rule: rule.to_string(),
            coupled_with: None,
            severity: default_constraint_severity(),
        }
    }

    pub fn temporal(coupled_with: &str, rule: &str) -> Self {
        Self {
            coupled_with: Some(coupled_with.to_string()),
            ..Self::new(ConstraintKind::TemporalCoupling, rule)
        }
    }

    pub fn is_temporal_coupling(&self) -> bool {
        self.kind == ConstraintKind::TemporalCoupling
    }
}

impl ModuleDefinition {
    pub fn new(id: &str, name: &str, phase: &str, priority: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            phase: phase.to_string(),
            priority: priority.to_string(),
            ..Self::default()
        }
    }

    pub fn depends_on(mut self, ids: &[&str]) -> Self {
        self.dependencies = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rules.push(rule);
        self
    }

    pub fn with_constraint(mut self, constraint: DependencyConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn has_temporal_coupling_with(&self, module_id: &str) -> bool {
        self.constraints
            .iter()
            .any(|c| c.is_temporal_coupling() && c.coupled_with.as_deref() == Some(module_id))
    }
}

impl Roadmap {
    pub fn new(version: &str, modules: Vec<ModuleDefinition>) -> Self {
        Self {
            version: version.to_string(),
            generated_at: None,
            description: None,
            modules,
        }
    }

    pub fn module(&self, id: &str) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn has_module(&self, id: &str) -> bool {
        self.module(id).is_some()
    }

    /// True when both modules exist and each declares temporal coupling with the other.
    pub fn has_temporal_coupling(&self, a: &str, b: &str) -> bool {
        match (self.module(a), self.module(b)) {
            (Some(ma), Some(mb)) => ma.has_temporal_coupling_with(b) && mb.has_temporal_coupling_with(a),
            _ => false,
        }
    }

    /// Structural problems that make the roadmap unusable.
    ///
    /// Dangling dependency ids are not reported here: the dependency validator
    /// surfaces them as violations so the rest of the run still happens.
    pub fn structural_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.version.trim().is_empty() {
            errors.push("Roadmap version is missing".to_string());
        }
        if self.modules.is_empty() {
            errors.push("Roadmap has no modules defined".to_string());
            return errors;
        }
        let mut seen = std::collections::BTreeSet::new();
        let mut duplicates = std::collections::BTreeSet::new();
        for module in &self.modules {
            if module.id.trim().is_empty() {
                errors.push("Module found without ID".to_string());
            } else if !seen.insert(module.id.as_str()) {
                duplicates.insert(module.id.as_str());
            }
        }
        for id in duplicates {
            errors.push(format!("Duplicate module ID: {}", id));
        }
        errors
    }
}
