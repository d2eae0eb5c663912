//! Development-order checks between roadmap modules.

use crate::engine::aggregate::{ImplementationStatus, ModuleStatus};
use crate::engine::violation::{Severity, Violation, ViolationType};
use crate::roadmap::{ModuleDefinition, Roadmap};
use std::collections::BTreeSet;

fn status_of<'a>(statuses: &'a [ModuleStatus], module_id: &str) -> Option<&'a ModuleStatus> {
    statuses.iter().find(|s| s.module_id == module_id)
}

/// Path from a root module to `module_id`, following first dependencies.
///
/// Cycles end the walk at the first revisited module. An id missing from
/// the roadmap is kept as the chain's root.
pub fn dependency_chain(module_id: &str, roadmap: &Roadmap) -> Vec<String> {
    let mut chain = Vec::new();
    let mut visited = BTreeSet::new();
    let mut current = module_id.to_string();
    while visited.insert(current.clone()) {
        chain.push(current.clone());
        match roadmap.module(&current).and_then(|m| m.dependencies.first()) {
            Some(next) => current = next.clone(),
            None => break,
        }
    }
    chain.reverse();
    chain
}

pub fn render_chain(chain: &[String]) -> String {
    chain.join(" → ")
}

/// Prerequisites that are unknown, or not COMPLETE while the module already progresses.
pub fn validate_dependencies(
    module: &ModuleDefinition,
    statuses: &[ModuleStatus],
    roadmap: &Roadmap,
) -> Vec<Violation> {
    let current = status_of(statuses, &module.id)
        .map(|s| s.implementation_status)
        .unwrap_or(ImplementationStatus::NotStarted);
    let mut violations = Vec::new();

    for dep in &module.dependencies {
        let Some(dep_status) = status_of(statuses, dep) else {
            violations.push(
                Violation::builder(&module.id)
                    .severity(Severity::Critical)
                    .kind(ViolationType::DataDependency)
                    .message(format!(
                        "Module '{}' depends on '{}', which is not defined in the roadmap",
                        module.id, dep
                    ))
                    .suggestion(format!(
                        "Add '{}' to the roadmap or remove it from the dependencies of '{}'",
                        dep, module.id
                    ))
                    .context("missing_module", dep.as_str())
                    .context("unknown_module", true)
                    .build(),
            );
            continue;
        };
        if !current.is_started() || dep_status.implementation_status == ImplementationStatus::Complete {
            continue;
        }

        let chain = render_chain(&dependency_chain(dep, roadmap));
        let mut suggestion = format!("Implement '{}' before continuing with '{}'", dep, module.id);
        if chain != *dep {
            suggestion.push_str(&format!(". Dependency chain: {}", chain));
        }
        violations.push(
            Violation::missing_dependency(&module.id, dep, &chain)
                .suggestion(suggestion)
                .context("module_status", current.to_string())
                .context("dependency_status", dep_status.implementation_status.to_string())
                .build(),
        );
    }
    violations
}

/// Advisory counterpart of [`validate_dependencies`]: one non-blocking warning
/// per present prerequisite that is not yet COMPLETE.
pub fn validate_premature(
    module: &ModuleDefinition,
    status: &ModuleStatus,
    statuses: &[ModuleStatus],
) -> Vec<Violation> {
    if !status.implementation_status.is_started() {
        return Vec::new();
    }
    module
        .dependencies
        .iter()
        .filter_map(|dep| status_of(statuses, dep).map(|s| (dep, s.implementation_status)))
        .filter(|(_, dep_status)| *dep_status != ImplementationStatus::Complete)
        .map(|(dep, dep_status)| {
            Violation::builder(&module.id)
                .severity(Severity::Warning)
                .kind(ViolationType::BusinessLogic)
                .blocking(false)
                .message(format!(
                    "Module '{}' is in development but its dependency '{}' is not complete ({}); complete '{}' first to avoid integration problems",
                    module.id, dep, dep_status, dep
                ))
                .suggestion(format!(
                    "Finish '{}' before continuing with '{}'",
                    dep, module.id
                ))
                .context("missing_module", dep.as_str())
                .context("dependency_status", dep_status.to_string())
                .build()
        })
        .collect()
}
