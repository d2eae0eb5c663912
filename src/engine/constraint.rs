//! Cross-module constraints and the roadmap-wide baseline check.

use crate::core::config::ValidatorConfig;
use crate::engine::aggregate::{ImplementationStatus, ModuleStatus};
use crate::engine::violation::{Severity, Violation, ViolationType};
use crate::roadmap::{ConstraintKind, DependencyConstraint, ModuleDefinition, Roadmap};
use regex::Regex;
use std::sync::LazyLock;

static STATE_EQUALITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*\.\s*(\w+)\s*={2,3}\s*(\w+)").unwrap());

fn status_of<'a>(statuses: &'a [ModuleStatus], module_id: &str) -> Option<&'a ModuleStatus> {
    statuses.iter().find(|s| s.module_id == module_id)
}

fn has_freeze_service(status: &ModuleStatus, config: &ValidatorConfig) -> bool {
    status.detected_services.iter().any(|service| {
        let lower = service.to_lowercase();
        config
            .coupling
            .freeze_keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .any(|k| lower.contains(&k.to_lowercase()))
    })
}

/// Each constraint yields at most one violation.
pub fn validate_constraints(
    module: &ModuleDefinition,
    status: &ModuleStatus,
    statuses: &[ModuleStatus],
    roadmap: &Roadmap,
    config: &ValidatorConfig,
) -> Vec<Violation> {
    module
        .constraints
        .iter()
        .filter_map(|constraint| match &constraint.kind {
            ConstraintKind::TemporalCoupling => {
                temporal_coupling(constraint, module, statuses, roadmap, config)
            }
            ConstraintKind::State => state_dependency(constraint, module, status),
            ConstraintKind::StateTransition | ConstraintKind::DataIntegrity => {
                required_behaviour(constraint, module, status)
            }
            ConstraintKind::Unknown(kind) => {
                tracing::debug!(module = %module.id, constraint = %kind, "unsupported constraint kind ignored");
                None
            }
        })
        .collect()
}

fn temporal_coupling(
    constraint: &DependencyConstraint,
    module: &ModuleDefinition,
    statuses: &[ModuleStatus],
    roadmap: &Roadmap,
    config: &ValidatorConfig,
) -> Option<Violation> {
    let coupled_id = constraint.coupled_with.as_deref().filter(|c| !c.trim().is_empty())?;
    let Some(coupled) = roadmap.module(coupled_id) else {
        return Some(
            Violation::temporal_coupling(&module.id, coupled_id, &constraint.rule)
                .message(format!(
                    "Module '{}' declares temporal coupling with '{}', which is not defined in the roadmap",
                    module.id, coupled_id
                ))
                .suggestion(format!(
                    "Add '{}' to the roadmap or drop the coupling from '{}'",
                    coupled_id, module.id
                ))
                .context("unknown_module", true)
                .build(),
        );
    };

    if !module.has_temporal_coupling_with(coupled_id) || !coupled.has_temporal_coupling_with(&module.id) {
        return Some(
            Violation::temporal_coupling(&module.id, coupled_id, &constraint.rule)
                .message(format!(
                    "Temporal coupling between '{}' and '{}' is declared on one side only: {}",
                    module.id, coupled_id, constraint.rule
                ))
                .suggestion(format!(
                    "Declare the coupling on '{}' as well, so that freezing either module freezes the other",
                    coupled_id
                ))
                .build(),
        );
    }

    let this = status_of(statuses, &module.id)?;
    let other = status_of(statuses, coupled_id)?;
    match (this.implementation_status.is_started(), other.implementation_status.is_started()) {
        (false, false) => return None,
        (true, false) => {
            return Some(one_sided(constraint, &module.id, coupled_id, &module.id, coupled_id));
        }
        (false, true) => {
            return Some(one_sided(constraint, &module.id, coupled_id, coupled_id, &module.id));
        }
        (true, true) => {}
    }
    let lacking: Vec<&str> = [this, other]
        .into_iter()
        .filter(|s| !has_freeze_service(s, config))
        .map(|s| s.module_id.as_str())
        .collect();
    if lacking.is_empty() {
        return None;
    }
    Some(
        Violation::temporal_coupling(&module.id, coupled_id, &constraint.rule)
            .severity(Severity::Warning)
            .blocking(false)
            .message(format!(
                "Modules '{}' and '{}' are coupled but no freeze service was found in: {}",
                module.id,
                coupled_id,
                lacking.join(", ")
            ))
            .suggestion(format!(
                "Expose a freeze service in {} that triggers the freeze of the coupled module",
                lacking.join(" and ")
            ))
            .context("lacking_freeze", lacking)
            .build(),
    )
}

/// `built` has progressed while `idle` has not; both belong to one coupling.
fn one_sided(
    constraint: &DependencyConstraint,
    module_id: &str,
    coupled_id: &str,
    built: &str,
    idle: &str,
) -> Violation {
    let message = if built == module_id {
        format!(
            "Module '{}' is implemented but its coupled module '{}' is not. Temporal coupling requires both to be implemented together",
            built, idle
        )
    } else {
        format!(
            "Module '{}' is not implemented but its coupled module '{}' is. Temporal coupling requires both to be implemented together",
            idle, built
        )
    };
    Violation::temporal_coupling(module_id, coupled_id, &constraint.rule)
        .message(message)
        .suggestion(format!(
            "Implement '{}' together with '{}'. When '{}' freezes, '{}' must freeze automatically",
            idle, built, built, idle
        ))
        .context("implemented_module", built)
        .context("idle_module", idle)
        .build()
}

fn state_dependency(
    constraint: &DependencyConstraint,
    module: &ModuleDefinition,
    status: &ModuleStatus,
) -> Option<Violation> {
    let Some(caps) = STATE_EQUALITY.captures(&constraint.rule) else {
        tracing::debug!(module = %module.id, rule = %constraint.rule, "state constraint without an equality pattern");
        return None;
    };
    if status.implementation_status != ImplementationStatus::NotStarted {
        return None;
    }
    Some(Violation::state_dependency(&module.id, &caps[1], &caps[2], &caps[3]).build())
}

fn required_behaviour(
    constraint: &DependencyConstraint,
    module: &ModuleDefinition,
    status: &ModuleStatus,
) -> Option<Violation> {
    if status.implementation_status != ImplementationStatus::NotStarted {
        return None;
    }
    let (what, fix) = match constraint.kind {
        ConstraintKind::StateTransition => ("Required state transition not implemented", "Implement the state transition"),
        _ => ("Data integrity rule not implemented", "Implement the integrity check"),
    };
    Some(
        Violation::validation_rule(&module.id, constraint.kind.as_str(), &constraint.rule, true)
            .message(format!("{}: {}", what, constraint.rule))
            .suggestion(format!("{}: {}", fix, constraint.rule))
            .build(),
    )
}

/// Roadmap-wide check on the configured foundational pair, run once.
pub fn check_baseline(
    roadmap: &Roadmap,
    statuses: &[ModuleStatus],
    config: &ValidatorConfig,
) -> Option<Violation> {
    let baseline = &config.baseline;
    if !baseline.enabled {
        return None;
    }
    let (primary, coupled) = (baseline.primary.as_str(), baseline.coupled.as_str());

    let undefined: Vec<&str> = [primary, coupled]
        .into_iter()
        .filter(|id| !roadmap.has_module(id))
        .collect();
    if !undefined.is_empty() {
        return Some(
            Violation::temporal_coupling(primary, coupled, &baseline.rule)
                .message(format!(
                    "Baseline principle cannot be encoded: {} not defined in the roadmap",
                    undefined.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(" and ")
                ))
                .suggestion(format!(
                    "Define '{}' and '{}' with temporal_coupling constraints on both, or disable the baseline check",
                    primary, coupled
                ))
                .context("undefined_modules", undefined)
                .build(),
        );
    }

    if !roadmap.has_temporal_coupling(primary, coupled) {
        return Some(
            Violation::temporal_coupling(primary, coupled, &baseline.rule)
                .message(format!(
                    "Baseline principle is not encoded in the roadmap: '{}' and '{}' must declare temporal coupling with each other",
                    primary, coupled
                ))
                .suggestion(format!(
                    "Add temporal_coupling constraints between '{}' and '{}' on both modules",
                    primary, coupled
                ))
                .build(),
        );
    }

    let first = status_of(statuses, primary)?;
    let second = status_of(statuses, coupled)?;
    if first.implementation_status == ImplementationStatus::NotStarted
        || second.implementation_status == ImplementationStatus::NotStarted
    {
        return None;
    }
    if has_freeze_service(first, config) && has_freeze_service(second, config) {
        return None;
    }
    Some(
        Violation::temporal_coupling(primary, coupled, &baseline.rule)
            .severity(Severity::Warning)
            .kind(ViolationType::TemporalDependency)
            .blocking(false)
            .message(format!(
                "Modules '{}' and '{}' are implemented but the coupled freeze mechanism is missing",
                primary, coupled
            ))
            .suggestion(format!(
                "Make the freeze of '{}' trigger the freeze of '{}' through a domain event or a shared transaction",
                primary, coupled
            ))
            .build(),
    )
}
