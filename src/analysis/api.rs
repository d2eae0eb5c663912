//! REST endpoint detection.

use crate::analysis::source::{first_quoted_literal, MethodDecl, SourceRoot, SourceTree, TypeDecl};
use std::collections::BTreeMap;

const VERB_ANNOTATIONS: &[(&str, &str)] = &[
    ("GetMapping", "GET"),
    ("PostMapping", "POST"),
    ("PutMapping", "PUT"),
    ("DeleteMapping", "DELETE"),
    ("PatchMapping", "PATCH"),
];

/// Join a base path and a method path with exactly one `/` between them.
pub fn join_paths(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    if base.is_empty() {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn base_path(controller: &TypeDecl) -> String {
    controller
        .annotation("RequestMapping")
        .and_then(|a| first_quoted_literal(&a.text))
        .unwrap_or_default()
}

fn endpoint(method: &MethodDecl, base: &str) -> Option<String> {
    method.annotations.iter().find_map(|annotation| {
        let (_, verb) = VERB_ANNOTATIONS
            .iter()
            .find(|(name, _)| *name == annotation.name)?;
        let path = first_quoted_literal(&annotation.text).unwrap_or_default();
        Some(format!("{} {}", verb, join_paths(base, &path)))
    })
}

/// Controller simple name -> `"VERB path"` endpoints, for controllers that expose any.
pub fn detect_endpoints(tree: &SourceTree) -> BTreeMap<String, Vec<String>> {
    let mut endpoints = BTreeMap::new();
    for unit in tree.units_in(SourceRoot::Api) {
        for controller in unit.types.iter().filter(|t| t.has_annotation("RestController")) {
            let base = base_path(controller);
            let found: Vec<String> = controller
                .methods
                .iter()
                .filter_map(|m| endpoint(m, &base))
                .collect();
            if !found.is_empty() {
                endpoints.insert(controller.name.clone(), found);
            }
        }
    }
    endpoints
}
