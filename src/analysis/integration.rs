//! Hexagonal integration points: repository ports and their adapters.

use crate::analysis::source::{SourceRoot, SourceTree, TypeDecl, TypeKind};

const PORT_SUFFIXES: &[&str] = &["Repository", "Port", "Adapter"];
const PORT_DOC_MARKERS: &[&str] = &["repository", "port", "repositorio"];
const ADAPTER_SUFFIXES: &[&str] = &["Adapter", "Repository", "Entity"];
const ADAPTER_DOC_MARKERS: &[&str] = &["adapter", "adaptador", "repository", "persistence"];

fn named_or_documented(ty: &TypeDecl, suffixes: &[&str], markers: &[&str]) -> bool {
    suffixes.iter().any(|s| ty.name.ends_with(s)) || ty.doc_mentions(markers)
}

/// Interfaces under a `port` package.
pub fn detect_ports(tree: &SourceTree) -> Vec<String> {
    tree.units_in(SourceRoot::Domain)
        .filter(|unit| unit.package.contains("port"))
        .flat_map(|unit| unit.types.iter())
        .filter(|ty| {
            ty.kind == TypeKind::Interface && named_or_documented(ty, PORT_SUFFIXES, PORT_DOC_MARKERS)
        })
        .map(|ty| ty.qualified_name.clone())
        .collect()
}

/// Concrete classes under `adapter` or `persistence` packages.
pub fn detect_adapters(tree: &SourceTree) -> Vec<String> {
    tree.units_in(SourceRoot::Infrastructure)
        .filter(|unit| unit.package.contains("adapter") || unit.package.contains("persistence"))
        .flat_map(|unit| unit.types.iter())
        .filter(|ty| {
            ty.kind == TypeKind::Class
                && !ty.has_modifier("abstract")
                && named_or_documented(ty, ADAPTER_SUFFIXES, ADAPTER_DOC_MARKERS)
        })
        .map(|ty| ty.qualified_name.clone())
        .collect()
}
