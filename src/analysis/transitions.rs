//! State transition checks over detected state assignments.
//!
//! Rules come from a TOML file:
//!
//! ```toml
//! [[state_machines]]
//! class_fqn = "com.budgetpro.domain.model.Presupuesto"
//! state_field = "estado"
//! state_enum = "EstadoPresupuesto"
//! initial_state = "BORRADOR"
//! terminal_states = ["CONGELADO"]
//!
//! [state_machines.transitions]
//! BORRADOR = ["APROBADO"]
//! APROBADO = ["CONGELADO"]
//! ```

use crate::analysis::state_assignment::StateAssignment;
use crate::core::error::ValidatorError;
use crate::core::output::join_or_none;
use crate::engine::violation::Severity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransitionRules {
    #[serde(default)]
    pub state_machines: Vec<StateMachineRule>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateMachineRule {
    #[serde(alias = "class")]
    pub class_fqn: String,
    pub state_field: String,
    pub state_enum: String,
    #[serde(default)]
    pub initial_state: Option<String>,
    #[serde(default)]
    pub terminal_states: BTreeSet<String>,
    #[serde(default)]
    pub transitions: BTreeMap<String, Vec<String>>,
}

impl StateMachineRule {
    fn matches_class(&self, class_name: &str) -> bool {
        self.class_fqn == class_name || self.class_fqn.ends_with(&format!(".{}", class_name))
    }

    /// Declared terminal, or listed with no outgoing transitions.
    pub fn is_terminal(&self, state: &str) -> bool {
        self.terminal_states.contains(state)
            || self.transitions.get(state).is_some_and(|targets| targets.is_empty())
    }

    pub fn allowed_from(&self, state: &str) -> Vec<String> {
        self.transitions.get(state).cloned().unwrap_or_default()
    }

    pub fn allows(&self, from: &str, to: &str) -> bool {
        !self.is_terminal(from) && self.transitions.get(from).is_some_and(|t| t.iter().any(|s| s == to))
    }

    fn known_states(&self) -> BTreeSet<&str> {
        self.transitions
            .iter()
            .flat_map(|(from, targets)| std::iter::once(from).chain(targets))
            .chain(&self.terminal_states)
            .map(String::as_str)
            .collect()
    }

    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.class_fqn.trim().is_empty() {
            problems.push("'class_fqn' is required".to_string());
        }
        if self.state_field.trim().is_empty() {
            problems.push("'state_field' is required".to_string());
        }
        if self.state_enum.trim().is_empty() {
            problems.push("'state_enum' is required".to_string());
        }
        if let Some(initial) = self.initial_state.as_deref() {
            if !self.known_states().contains(initial) {
                problems.push(format!("initial state '{}' is not part of the transition table", initial));
            } else if self.is_terminal(initial) {
                problems.push(format!("initial state '{}' is terminal", initial));
            }
        }
        problems
    }
}

impl TransitionRules {
    pub fn from_toml_str(content: &str) -> Result<Self, ValidatorError> {
        let rules: TransitionRules = toml::from_str(content)?;
        if rules.state_machines.is_empty() {
            return Err(ValidatorError::ConfigError(
                "transition rules must define at least one [[state_machines]] entry".to_string(),
            ));
        }
        let errors: Vec<String> = rules
            .state_machines
            .iter()
            .enumerate()
            .flat_map(|(i, rule)| {
                rule.problems()
                    .into_iter()
                    .map(move |p| format!("state machine [{}]: {}", i, p))
            })
            .collect();
        if !errors.is_empty() {
            return Err(ValidatorError::ConfigError(errors.join("; ")));
        }
        Ok(rules)
    }

    pub fn from_file(path: &Path) -> Result<Self, ValidatorError> {
        if !path.is_file() {
            return Err(ValidatorError::ConfigError(format!(
                "transition rules not found: {}",
                path.display()
            )));
        }
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn rule_for(&self, class_name: &str) -> Option<&StateMachineRule> {
        self.state_machines.iter().find(|r| r.matches_class(class_name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    NonExistentState,
    InvalidTransition,
    MissingValidation,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionFinding {
    pub severity: Severity,
    pub kind: FindingKind,
    pub file: PathBuf,
    pub line: usize,
    pub class_name: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_state: Option<String>,
    pub to_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    pub message: String,
}

impl TransitionFinding {
    fn at(assignment: &StateAssignment, severity: Severity, kind: FindingKind, message: String) -> Self {
        Self {
            severity,
            kind,
            file: assignment.file.clone(),
            line: assignment.line,
            class_name: assignment.class_name.clone(),
            method: assignment.method.clone(),
            from_state: assignment.from_state.clone(),
            to_state: assignment.to_state.clone(),
            allowed: None,
            message,
        }
    }
}

pub fn check_transitions(assignments: &[StateAssignment], rules: &TransitionRules) -> Vec<TransitionFinding> {
    let mut findings = Vec::new();
    for assignment in assignments {
        if !assignment.valid {
            findings.push(TransitionFinding::at(
                assignment,
                Severity::Critical,
                FindingKind::NonExistentState,
                format!(
                    "State '{}' does not exist in enum {}",
                    assignment.to_state, assignment.enum_type
                ),
            ));
            continue;
        }
        let Some(rule) = rules.rule_for(&assignment.class_name) else {
            continue;
        };
        if rule.state_field != assignment.field {
            continue;
        }
        let to = assignment.to_state.as_str();
        match assignment.from_state.as_deref() {
            Some(from) if rule.is_terminal(from) => {
                let mut finding = TransitionFinding::at(
                    assignment,
                    Severity::Critical,
                    FindingKind::InvalidTransition,
                    format!(
                        "Invalid transition: '{}' is a terminal state, attempted transition to '{}'",
                        from, to
                    ),
                );
                finding.allowed = Some(Vec::new());
                findings.push(finding);
            }
            Some(from) if !rule.allows(from, to) => {
                let allowed = rule.allowed_from(from);
                let mut finding = TransitionFinding::at(
                    assignment,
                    Severity::Critical,
                    FindingKind::InvalidTransition,
                    format!(
                        "Invalid transition: '{}' -> '{}' is not allowed. Valid transitions from '{}': {}",
                        from,
                        to,
                        from,
                        join_or_none(&allowed)
                    ),
                );
                finding.allowed = Some(allowed);
                findings.push(finding);
            }
            Some(_) => {}
            None => findings.push(TransitionFinding::at(
                assignment,
                Severity::Warning,
                FindingKind::MissingValidation,
                format!(
                    "Missing validation: origin state unknown before transition to '{}'; guard the assignment with a check on the current state",
                    to
                ),
            )),
        }
    }
    findings
}

pub fn has_critical(findings: &[TransitionFinding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Critical)
}
