//! Violations: the one diagnostic type every validator emits.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    StateDependency,
    DataDependency,
    TemporalDependency,
    BusinessLogic,
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StateDependency => "STATE_DEPENDENCY",
            Self::DataDependency => "DATA_DEPENDENCY",
            Self::TemporalDependency => "TEMPORAL_DEPENDENCY",
            Self::BusinessLogic => "BUSINESS_LOGIC",
        })
    }
}

/// Immutable once built; construct through [`ViolationBuilder`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Violation {
    pub module_id: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub message: String,
    pub suggestion: String,
    pub blocking: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, Value>,
}

impl Violation {
    pub fn builder(module_id: &str) -> ViolationBuilder {
        ViolationBuilder::new(module_id)
    }

    /// Prerequisite module not complete while `module_id` already progresses.
    pub fn missing_dependency(module_id: &str, dependency: &str, chain: &str) -> ViolationBuilder {
        Self::builder(module_id)
            .severity(Severity::Critical)
            .kind(ViolationType::DataDependency)
            .message(format!(
                "Module '{}' requires '{}' to be COMPLETE before it can progress",
                module_id, dependency
            ))
            .suggestion(format!(
                "Complete '{}' first. Dependency chain: {}",
                dependency, chain
            ))
            .context("missing_module", dependency)
            .context("dependency_chain", chain)
    }

    pub fn temporal_coupling(module_id: &str, coupled_with: &str, rule: &str) -> ViolationBuilder {
        Self::builder(module_id)
            .severity(Severity::Critical)
            .kind(ViolationType::TemporalDependency)
            .message(format!(
                "Temporal coupling between '{}' and '{}' is not satisfied: {}",
                module_id, coupled_with, rule
            ))
            .suggestion(format!(
                "Declare the coupling on both modules and implement a joint freeze of '{}' and '{}'",
                module_id, coupled_with
            ))
            .context("coupled_with", coupled_with)
            .context("rule", rule)
    }

    /// A failed validation rule; `required` decides severity and blocking.
    pub fn validation_rule(module_id: &str, rule_type: &str, target: &str, required: bool) -> ViolationBuilder {
        let builder = Self::builder(module_id)
            .kind(ViolationType::BusinessLogic)
            .context("rule_type", rule_type)
            .context("target", target)
            .context("required", required);
        if required {
            builder.severity(Severity::Critical)
        } else {
            builder.severity(Severity::Warning).blocking(false)
        }
    }

    pub fn state_dependency(module_id: &str, entity: &str, field: &str, state: &str) -> ViolationBuilder {
        Self::builder(module_id)
            .severity(Severity::Critical)
            .kind(ViolationType::StateDependency)
            .message(format!(
                "Module '{}' requires {}.{} == {}, but the module has not been started",
                module_id, entity, field, state
            ))
            .suggestion(format!(
                "Implement '{}' so that {} can reach state {}",
                module_id, entity, state
            ))
            .context("entity", entity)
            .context("field", field)
            .context("required_state", state)
    }
}

#[derive(Debug, Clone)]
pub struct ViolationBuilder {
    module_id: String,
    severity: Severity,
    violation_type: ViolationType,
    message: String,
    suggestion: String,
    blocking: Option<bool>,
    context: BTreeMap<String, Value>,
}

impl ViolationBuilder {
    pub fn new(module_id: &str) -> Self {
        Self {
            module_id: module_id.to_string(),
            severity: Severity::Warning,
            violation_type: ViolationType::BusinessLogic,
            message: String::new(),
            suggestion: String::new(),
            blocking: None,
            context: BTreeMap::new(),
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn kind(mut self, violation_type: ViolationType) -> Self {
        self.violation_type = violation_type;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    /// Overrides the default, which is blocking exactly for CRITICAL.
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = Some(blocking);
        self
    }

    pub fn context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> Violation {
        let blocking = self
            .blocking
            .unwrap_or(self.severity == Severity::Critical);
        Violation {
            module_id: self.module_id,
            severity: self.severity,
            violation_type: self.violation_type,
            message: self.message,
            suggestion: self.suggestion,
            blocking,
            context: self.context,
        }
    }
}
