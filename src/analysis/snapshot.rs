//! Immutable facts for one validation run.

use crate::analysis::source::{self, SourceTree};
use crate::analysis::state_assignment::{detect_state_assignments, StateAssignment};
use crate::analysis::state_machine::{detect_enums, EnumRegistry};
use crate::analysis::{api, entity, integration, service};
use crate::core::config::ValidatorConfig;
use crate::core::error::ValidatorError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Everything the detectors found. Built once after scanning and only ever
/// shared by reference afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisSnapshot {
    pub entities: Vec<String>,
    pub services: BTreeMap<String, Vec<String>>,
    pub endpoints: BTreeMap<String, Vec<String>>,
    pub state_machines: EnumRegistry,
    pub enums: EnumRegistry,
    pub ports: Vec<String>,
    pub adapters: Vec<String>,
    pub relationships: BTreeMap<String, BTreeSet<String>>,
    pub state_assignments: Vec<StateAssignment>,
    pub parsed_files: usize,
    pub skipped_files: Vec<PathBuf>,
}

impl AnalysisSnapshot {
    pub fn build(repo_root: &Path, config: &ValidatorConfig) -> Result<Self, ValidatorError> {
        let tree = source::scan(repo_root, &config.layout)?;
        Ok(Self::from_tree(&tree))
    }

    pub fn from_tree(tree: &SourceTree) -> Self {
        let entities = entity::detect_entities(tree);
        let relationships = entity::entity_relationships(tree, &entities);
        let registries = detect_enums(tree);
        let state_assignments = detect_state_assignments(tree, &registries);
        Self {
            services: service::detect_services(tree),
            endpoints: api::detect_endpoints(tree),
            ports: integration::detect_ports(tree),
            adapters: integration::detect_adapters(tree),
            state_machines: registries.state_machines,
            enums: registries.enums,
            entities,
            relationships,
            state_assignments,
            parsed_files: tree.units.len(),
            skipped_files: tree.skipped.clone(),
        }
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Lower-case substring search over entity and service names.
    pub fn mentions(&self, fragment: &str) -> bool {
        let needle = fragment.to_lowercase();
        self.entities
            .iter()
            .map(String::as_str)
            .chain(self.service_names())
            .any(|name| name.to_lowercase().contains(&needle))
    }
}
