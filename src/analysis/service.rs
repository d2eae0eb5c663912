//! Service and use-case detection.

use crate::analysis::source::{SourceRoot, SourceTree, SourceUnit, TypeDecl, TypeKind};
use std::collections::BTreeMap;

const SERVICE_DOC_MARKERS: &[&str] = &["service", "use case", "caso de uso"];

fn is_service(unit: &SourceUnit, ty: &TypeDecl) -> bool {
    if ty.kind == TypeKind::Interface {
        return false;
    }
    unit.package.contains("service")
        || unit.package.contains("usecase")
        || ty.has_annotation("Service")
        || ty.doc_mentions(SERVICE_DOC_MARKERS)
}

/// Public, non-static methods; constructors never reach the parsed method list.
pub fn public_methods(ty: &TypeDecl) -> Vec<String> {
    ty.methods
        .iter()
        .filter(|m| m.has_modifier("public") && !m.has_modifier("static"))
        .map(|m| m.name.clone())
        .collect()
}

/// Service qualified name -> exposed method names.
pub fn detect_services(tree: &SourceTree) -> BTreeMap<String, Vec<String>> {
    let mut services = BTreeMap::new();
    for unit in tree.units_in(SourceRoot::Domain) {
        for ty in unit.types.iter().filter(|ty| is_service(unit, ty)) {
            services.insert(ty.qualified_name.clone(), public_methods(ty));
        }
    }
    services
}
