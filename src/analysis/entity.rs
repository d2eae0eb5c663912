//! Domain entity detection.

use crate::analysis::source::{SourceRoot, SourceTree, TypeDecl, TypeKind};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static TYPE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z_$][\w$]*").unwrap());

const ENTITY_DOC_MARKERS: &[&str] = &["aggregate root", "entity", "agregado"];

/// Library and value types that never count as a related entity.
const NON_ENTITY_TYPES: &[&str] = &[
    "String",
    "Integer",
    "Long",
    "Short",
    "Byte",
    "Double",
    "Float",
    "Boolean",
    "Character",
    "BigDecimal",
    "BigInteger",
    "LocalDate",
    "LocalDateTime",
    "OffsetDateTime",
    "ZonedDateTime",
    "Instant",
    "Duration",
    "UUID",
    "Object",
    "Optional",
    "Collection",
    "List",
    "Set",
    "Map",
];

pub fn is_entity(ty: &TypeDecl) -> bool {
    ty.kind == TypeKind::Class && (ty.has_modifier("final") || ty.doc_mentions(ENTITY_DOC_MARKERS))
}

/// Qualified names of domain entities, at most one per file.
pub fn detect_entities(tree: &SourceTree) -> Vec<String> {
    tree.units_in(SourceRoot::Domain)
        .filter(|unit| unit.package.contains("model") || unit.package.contains("domain"))
        .filter_map(|unit| unit.types.iter().find(|ty| is_entity(ty)))
        .map(|ty| ty.qualified_name.clone())
        .collect()
}

fn looks_like_entity_type(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && !name.ends_with("Id")
        && !NON_ENTITY_TYPES.contains(&name)
}

/// Field types of `ty` that look like other domain entities, generic
/// arguments included (`List<Partida>` yields `Partida`).
pub fn detect_relationships(ty: &TypeDecl) -> BTreeSet<String> {
    ty.fields
        .iter()
        .flat_map(|field| TYPE_WORD.find_iter(&field.type_name))
        .map(|m| m.as_str())
        .filter(|name| looks_like_entity_type(name))
        .map(str::to_string)
        .collect()
}

/// Entity qualified name -> related entity types.
pub fn entity_relationships(tree: &SourceTree, entities: &[String]) -> BTreeMap<String, BTreeSet<String>> {
    let wanted: BTreeSet<&str> = entities.iter().map(String::as_str).collect();
    let mut out = BTreeMap::new();
    for unit in tree.units_in(SourceRoot::Domain) {
        for ty in &unit.types {
            if wanted.contains(ty.qualified_name.as_str()) {
                out.insert(ty.qualified_name.clone(), detect_relationships(ty));
            }
        }
    }
    out
}
