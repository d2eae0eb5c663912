//! Validation rule executor.
//!
//! Entity, relationship and reference rules look at every detected entity,
//! since a construct may live in a module other than the one consuming it.
//! Service rules only see the module's own services.

use crate::analysis::AnalysisSnapshot;
use crate::engine::aggregate::ModuleStatus;
use crate::engine::violation::Violation;
use crate::roadmap::{ModuleDefinition, RuleKind, ValidationRule};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum RuleCheck {
    Satisfied,
    Unsatisfied {
        message: String,
        suggestion: String,
        context: Vec<(&'static str, Value)>,
    },
    /// Rule kind this executor does not know; never counted.
    Unsupported,
}

impl RuleCheck {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }

    fn failed(message: String, suggestion: String) -> Self {
        Self::Unsatisfied {
            message,
            suggestion,
            context: Vec::new(),
        }
    }
}

/// `name` contains `target`, or `target` contains `name`.
fn overlaps(name: &str, target: &str) -> bool {
    !target.is_empty() && (name.contains(target) || target.contains(name))
}

fn any_overlap<'a>(mut names: impl Iterator<Item = &'a str>, target: &str) -> bool {
    names.any(|name| overlaps(name, target))
}

fn check_members(
    registry_name: &str,
    target: &str,
    registry: &std::collections::BTreeMap<String, Vec<String>>,
    required: &[String],
) -> RuleCheck {
    let Some(detected) = registry.get(target) else {
        return RuleCheck::failed(
            format!("{} '{}' not found", registry_name, target),
            format!("Define the enum {} in the domain layer", target),
        );
    };
    let missing: Vec<String> = required
        .iter()
        .filter(|value| !detected.contains(value))
        .cloned()
        .collect();
    if missing.is_empty() {
        return RuleCheck::Satisfied;
    }
    RuleCheck::Unsatisfied {
        message: format!(
            "{} '{}' is missing: {}",
            registry_name,
            target,
            missing.join(", ")
        ),
        suggestion: format!("Add {} to {}", missing.join(", "), target),
        context: vec![
            ("detected", Value::from(detected.clone())),
            ("expected", Value::from(required.to_vec())),
            ("missing", Value::from(missing)),
        ],
    }
}

/// Evaluate one rule. `module_services` are the services scoped to the module.
pub fn check_rule(rule: &ValidationRule, module_services: &[String], snapshot: &AnalysisSnapshot) -> RuleCheck {
    let target = rule.target.as_str();
    let entities = || snapshot.entities.iter().map(String::as_str);

    match &rule.kind {
        RuleKind::EntityExists => {
            if any_overlap(entities(), target) {
                RuleCheck::Satisfied
            } else {
                RuleCheck::failed(
                    format!("Required entity '{}' not found", target),
                    format!("Create the domain entity {}", target),
                )
            }
        }
        RuleKind::ServiceExists => {
            if any_overlap(module_services.iter().map(String::as_str), target) {
                return RuleCheck::Satisfied;
            }
            let mut context = Vec::new();
            if !rule.required_methods.is_empty() {
                context.push(("required_methods", Value::from(rule.required_methods.clone())));
            }
            RuleCheck::Unsatisfied {
                message: format!("Required service '{}' not found", target),
                suggestion: format!("Implement the service {}", target),
                context,
            }
        }
        RuleKind::StateMachineExists => check_members(
            "State machine",
            target,
            &snapshot.state_machines,
            &rule.required_states,
        ),
        RuleKind::EnumExists => check_members("Enum", target, &snapshot.enums, &rule.required_values),
        RuleKind::PortExists => {
            if any_overlap(snapshot.ports.iter().map(String::as_str), target) {
                RuleCheck::Satisfied
            } else {
                RuleCheck::failed(
                    format!("Required port '{}' not found", target),
                    format!("Declare the port interface {} in a port package", target),
                )
            }
        }
        RuleKind::RelationshipExists | RuleKind::ReferenceExists => {
            let mut missing = Vec::new();
            if let Some(source) = rule.source.as_deref() {
                if !any_overlap(entities(), source) {
                    missing.push(source);
                }
            }
            if !any_overlap(entities(), target) {
                missing.push(target);
            }
            if missing.is_empty() {
                return RuleCheck::Satisfied;
            }
            let relation = match (&rule.source, &rule.field) {
                (Some(source), Some(field)) => format!("{}.{} -> {}", source, field, target),
                (Some(source), None) => format!("{} -> {}", source, target),
                _ => target.to_string(),
            };
            RuleCheck::Unsatisfied {
                message: format!(
                    "{} '{}' cannot hold: entity not found: {}",
                    rule.kind.as_str(),
                    relation,
                    missing.join(", ")
                ),
                suggestion: format!("Create the missing entities: {}", missing.join(", ")),
                context: vec![(
                    "missing_entities",
                    Value::from(missing.iter().map(|s| s.to_string()).collect::<Vec<_>>()),
                )],
            }
        }
        RuleKind::Unknown(kind) => {
            tracing::debug!(rule = %kind, target, "unsupported rule kind ignored");
            RuleCheck::Unsupported
        }
    }
}

/// One violation per failing rule.
pub fn execute_rules(
    module: &ModuleDefinition,
    status: &ModuleStatus,
    snapshot: &AnalysisSnapshot,
) -> Vec<Violation> {
    module
        .validation_rules
        .iter()
        .filter_map(|rule| match check_rule(rule, &status.detected_services, snapshot) {
            RuleCheck::Unsatisfied {
                message,
                suggestion,
                context,
            } => {
                let mut builder =
                    Violation::validation_rule(&module.id, rule.kind.as_str(), &rule.target, rule.required)
                        .message(message)
                        .suggestion(suggestion);
                for (key, value) in context {
                    builder = builder.context(key, value);
                }
                Some(builder.build())
            }
            RuleCheck::Satisfied | RuleCheck::Unsupported => None,
        })
        .collect()
}
