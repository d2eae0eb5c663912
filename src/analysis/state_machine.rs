//! Enum and state-machine registries.

use crate::analysis::source::{SourceRoot, SourceTree, TypeDecl, TypeKind};
use std::collections::BTreeMap;

const STATE_DOC_MARKERS: &[&str] = &["estado", "state", "state machine", "máquina de estado"];

/// Enum name -> constants in declaration order, keyed by qualified and simple name.
pub type EnumRegistry = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Default)]
pub struct EnumRegistries {
    pub state_machines: EnumRegistry,
    pub enums: EnumRegistry,
}

/// Type names that read as a state: contain `estado`/`state` or end in `status`.
pub fn is_state_like_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("estado") || lower.contains("state") || lower.ends_with("status")
}

pub fn is_state_machine(ty: &TypeDecl) -> bool {
    ty.kind == TypeKind::Enum && (is_state_like_name(&ty.name) || ty.doc_mentions(STATE_DOC_MARKERS))
}

fn register(registry: &mut EnumRegistry, ty: &TypeDecl) {
    for key in [&ty.qualified_name, &ty.name] {
        registry
            .entry(key.clone())
            .or_insert_with(|| ty.constants.clone());
    }
}

/// First registration of a key wins, in scan order.
pub fn detect_enums(tree: &SourceTree) -> EnumRegistries {
    let mut registries = EnumRegistries::default();
    for unit in tree.units_in(SourceRoot::Domain) {
        for ty in unit.types.iter().filter(|t| t.kind == TypeKind::Enum) {
            if is_state_machine(ty) {
                register(&mut registries.state_machines, ty);
            }
            register(&mut registries.enums, ty);
        }
    }
    registries
}
