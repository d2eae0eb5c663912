//! Sites where an entity assigns an enum constant to one of its own fields.
//!
//! Best effort and flow-insensitive: the originating state is only known when
//! the assignment sits inside an `if` that compares the same field against a
//! state constant.

use crate::analysis::source::{MethodDecl, SourceRoot, SourceTree};
use crate::analysis::state_machine::{is_state_like_name, EnumRegistries};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static SELF_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bthis\s*\.\s*([A-Za-z_$][\w$]*)\s*=\s*([A-Z][\w$]*)\s*\.\s*([A-Za-z_$][\w$]*)\s*;").unwrap()
});
static IF_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bif\s*\(").unwrap());
static CONSTANT_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][\w$]*)\s*\.\s*([A-Za-z_$][\w$]*)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateAssignment {
    pub file: PathBuf,
    pub line: usize,
    pub class_name: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_state: Option<String>,
    pub to_state: String,
    pub field: String,
    pub enum_type: String,
    /// The target constant exists in the detected enum.
    pub valid: bool,
}

/// Offset of the delimiter closing the one opened at `open`.
fn closing(text: &[u8], open: usize, left: u8, right: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.iter().enumerate().skip(open) {
        if *b == left {
            depth += 1;
        } else if *b == right {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Condition text of every `if` and the byte range its consequence covers.
fn guarded_ranges(body: &str) -> Vec<(String, usize, usize)> {
    let bytes = body.as_bytes();
    let mut out = Vec::new();
    for m in IF_OPEN.find_iter(body) {
        let lp = m.end() - 1;
        let Some(rp) = closing(bytes, lp, b'(', b')') else {
            continue;
        };
        let cond = body[lp + 1..rp].to_string();
        let mut k = rp + 1;
        while k < bytes.len() && bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        let end = if bytes.get(k) == Some(&b'{') {
            closing(bytes, k, b'{', b'}')
        } else {
            body[k..].find(';').map(|p| k + p)
        };
        if let Some(end) = end {
            out.push((cond, rp + 1, end));
        }
    }
    out
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// `word` appears in `text` as a whole identifier.
fn mentions_identifier(text: &str, word: &str) -> bool {
    !word.is_empty()
        && text.match_indices(word).any(|(at, _)| {
            let before = text[..at].chars().next_back();
            let after = text[at + word.len()..].chars().next();
            !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
        })
}

/// State constant a condition compares `field` against, if any.
fn compared_state(cond: &str, field: &str) -> Option<String> {
    let compares = cond.contains("==") || cond.contains(".equals");
    if !compares || !mentions_identifier(cond, field) {
        return None;
    }
    CONSTANT_REF
        .captures_iter(cond)
        .find(|c| is_state_like_name(&c[1]))
        .map(|c| c[2].to_string())
}

fn from_state(body: &str, offset: usize, field: &str) -> Option<String> {
    guarded_ranges(body)
        .into_iter()
        .filter(|(_, start, end)| *start <= offset && offset < *end)
        .max_by_key(|(_, start, _)| *start)
        .and_then(|(cond, _, _)| compared_state(&cond, field))
}

fn assignments_in(
    method: &MethodDecl,
    class_name: &str,
    file: &Path,
    registries: &EnumRegistries,
) -> Vec<StateAssignment> {
    let Some(body) = method.body.as_deref() else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for caps in SELF_ASSIGN.captures_iter(body) {
        let (Some(whole), Some(field), Some(ty), Some(constant)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        let enum_type = ty.as_str();
        if !registries.enums.contains_key(enum_type) && !is_state_like_name(enum_type) {
            continue;
        }
        let constants = registries
            .state_machines
            .get(enum_type)
            .or_else(|| registries.enums.get(enum_type));
        let offset = whole.start();
        found.push(StateAssignment {
            file: file.to_path_buf(),
            line: method.body_line + body[..offset].matches('\n').count(),
            class_name: class_name.to_string(),
            method: method.name.clone(),
            from_state: from_state(body, offset, field.as_str()),
            to_state: constant.as_str().to_string(),
            field: field.as_str().to_string(),
            enum_type: enum_type.to_string(),
            valid: constants.is_some_and(|c| c.iter().any(|v| v == constant.as_str())),
        });
    }
    found
}

pub fn detect_state_assignments(tree: &SourceTree, registries: &EnumRegistries) -> Vec<StateAssignment> {
    let mut out = Vec::new();
    for unit in tree.units_in(SourceRoot::Domain) {
        for ty in &unit.types {
            for method in &ty.methods {
                out.extend(assignments_in(method, &ty.name, &unit.path, registries));
            }
        }
    }
    out
}
