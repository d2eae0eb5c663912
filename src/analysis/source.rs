//! Java source scanning.
//!
//! One walk over the configured roots produces a [`SourceUnit`] per `.java`
//! file. Parsing is lexical: comments and literals are masked with spaces
//! (byte offsets and newlines survive), then declarations are recovered by
//! brace matching on what is left. Detectors work from the parsed units and
//! never touch the filesystem themselves.

use crate::core::config::LayoutConfig;
use crate::core::error::ValidatorError;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use walkdir::WalkDir;

static PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").unwrap());
static TYPE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^.\w@$])(class|interface|enum|record)\s+([A-Za-z_$][\w$]*)").unwrap()
});
static LEADING_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z_$][\w$]*)").unwrap());
static TRAILING_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_$][\w$]*)\s*(?:\[\s*\]\s*)*$").unwrap());
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z_$][\w$]*").unwrap());

const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "sealed",
    "non-sealed",
    "synchronized",
    "native",
    "transient",
    "volatile",
    "default",
    "strictfp",
];

/// Why a file could not be parsed. Never escapes the scanner.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file is not valid UTF-8")]
    NotUtf8,
    #[error("unterminated comment starting at line {line}")]
    UnterminatedComment { line: usize },
    #[error("unterminated literal starting at line {line}")]
    UnterminatedLiteral { line: usize },
    #[error("unbalanced delimiter at line {line}")]
    Unbalanced { line: usize },
}

/// Configured source roots. A unit may sit under several of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRoot {
    Domain,
    Infrastructure,
    Api,
}

impl SourceRoot {
    pub const ALL: [SourceRoot; 3] = [Self::Domain, Self::Infrastructure, Self::Api];

    pub fn path(self, repo_root: &Path, layout: &LayoutConfig) -> PathBuf {
        let rel = match self {
            Self::Domain => &layout.domain_root,
            Self::Infrastructure => &layout.infrastructure_root,
            Self::Api => &layout.api_root,
        };
        repo_root.join(rel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    /// Simple name, without `@` or package qualifier.
    pub name: String,
    /// Raw source text of the whole annotation, arguments included.
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Vec<String>,
    pub annotations: Vec<Annotation>,
    /// Masked body text including its braces; `None` for abstract methods.
    pub body: Option<String>,
    pub body_line: usize,
    pub line: usize,
}

impl MethodDecl {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub type_name: String,
    pub modifiers: Vec<String>,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    /// Package plus enclosing types plus name.
    pub qualified_name: String,
    pub modifiers: Vec<String>,
    pub annotations: Vec<Annotation>,
    /// Comments attached ahead of the declaration, concatenated.
    pub doc: String,
    pub methods: Vec<MethodDecl>,
    pub fields: Vec<FieldDecl>,
    /// Enum constants in declaration order.
    pub constants: Vec<String>,
    pub line: usize,
}

impl TypeDecl {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }

    /// Case-insensitive search of the attached comments.
    pub fn doc_mentions(&self, needles: &[&str]) -> bool {
        if self.doc.is_empty() {
            return false;
        }
        let doc = self.doc.to_lowercase();
        needles.iter().any(|n| doc.contains(n))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub package: String,
    /// Every type in the file, outer types before the types nested in them.
    pub types: Vec<TypeDecl>,
    pub roots: Vec<SourceRoot>,
}

impl SourceUnit {
    pub fn in_root(&self, root: SourceRoot) -> bool {
        self.roots.contains(&root)
    }

    pub fn package_contains(&self, fragment: &str) -> bool {
        self.package.to_lowercase().contains(fragment)
    }
}

/// Result of one traversal over the configured roots.
#[derive(Debug, Default)]
pub struct SourceTree {
    pub units: Vec<SourceUnit>,
    pub skipped: Vec<PathBuf>,
}

impl SourceTree {
    pub fn units_in(&self, root: SourceRoot) -> impl Iterator<Item = &SourceUnit> {
        self.units.iter().filter(move |u| u.in_root(root))
    }
}

/// Reduce the roots to a non-overlapping set so each directory is walked once.
pub fn traversal_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut sorted = roots.to_vec();
    sorted.sort();
    sorted.dedup();
    let mut minimal: Vec<PathBuf> = Vec::new();
    for path in sorted {
        if !minimal.iter().any(|kept| path.starts_with(kept)) {
            minimal.push(path);
        }
    }
    minimal
}

/// Walk every configured root once and parse all `.java` files found.
pub fn scan(repo_root: &Path, layout: &LayoutConfig) -> Result<SourceTree, ValidatorError> {
    if !repo_root.is_dir() {
        return Err(ValidatorError::NotFound(format!(
            "repository path {}",
            repo_root.display()
        )));
    }

    let configured: Vec<(SourceRoot, PathBuf)> = SourceRoot::ALL
        .iter()
        .map(|root| (*root, root.path(repo_root, layout)))
        .collect();
    let paths: Vec<PathBuf> = configured.iter().map(|(_, p)| p.clone()).collect();

    let mut tree = SourceTree::default();
    for walk_root in traversal_roots(&paths) {
        if !walk_root.is_dir() {
            tracing::debug!(root = %walk_root.display(), "source root missing, skipped");
            continue;
        }
        let walker = WalkDir::new(&walk_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(e.depth() > 0
                    && e.file_type().is_dir()
                    && layout
                        .skip_dirs
                        .iter()
                        .any(|skip| e.file_name().to_string_lossy() == skip.as_str()))
            });
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "walk entry skipped");
                    continue;
                }
            };
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|e| e.to_str()) != Some("java")
            {
                continue;
            }
            match parse_file(entry.path()) {
                Ok(mut unit) => {
                    unit.roots = configured
                        .iter()
                        .filter(|(_, root_path)| unit.path.starts_with(root_path))
                        .map(|(root, _)| *root)
                        .collect();
                    tree.units.push(unit);
                }
                Err(err) => {
                    tracing::debug!(file = %entry.path().display(), error = %err, "unparsable source skipped");
                    tree.skipped.push(entry.path().to_path_buf());
                }
            }
        }
    }
    tracing::debug!(
        parsed = tree.units.len(),
        skipped = tree.skipped.len(),
        "source scan finished"
    );
    Ok(tree)
}

pub fn parse_file(path: &Path) -> Result<SourceUnit, ParseError> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|_| ParseError::NotUtf8)?;
    parse_source(path, &text)
}

/// Parse one compilation unit. `roots` is left empty for the caller to fill.
pub fn parse_source(path: &Path, text: &str) -> Result<SourceUnit, ParseError> {
    let lines = line_starts(text);
    let (masked, comments) = mask(text, &lines)?;
    let braces = match_braces(masked.as_bytes(), &lines)?;
    let package = PACKAGE
        .captures(&masked)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let parser = Parser {
        raw: text,
        masked: &masked,
        comments: &comments,
        braces,
        lines,
    };
    let mut types = Vec::new();
    parser.members(0, masked.len(), &package, None, &mut types);

    Ok(SourceUnit {
        path: path.to_path_buf(),
        package,
        types,
        roots: Vec::new(),
    })
}

/// First `"..."` literal in `text`, without its quotes.
pub fn first_quoted_literal(text: &str) -> Option<String> {
    let start = text.find('"')?;
    let rest = &text[start + 1..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(
        text.bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i + 1),
    );
    starts
}

fn line_of(lines: &[usize], offset: usize) -> usize {
    lines.partition_point(|&start| start <= offset)
}

#[derive(Debug, Clone)]
struct Comment {
    start: usize,
    text: String,
}

fn blank(region: &mut [u8]) {
    for b in region.iter_mut() {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

fn find_bytes(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

/// Closing quote of a single-line literal opened just before `from`.
fn close_quote(bytes: &[u8], from: usize, quote: u8) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' => return None,
            b if b == quote => return Some(j),
            _ => j += 1,
        }
    }
    None
}

fn close_text_block(bytes: &[u8], from: usize) -> Option<usize> {
    let mut j = from;
    while j + 2 < bytes.len() {
        if bytes[j] == b'\\' {
            j += 2;
            continue;
        }
        if &bytes[j..j + 3] == b"\"\"\"" {
            return Some(j);
        }
        j += 1;
    }
    None
}

/// Blank out comments and literal contents. Literal delimiters are kept.
fn mask(text: &str, lines: &[usize]) -> Result<(String, Vec<Comment>), ParseError> {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut comments = Vec::new();
    let n = bytes.len();
    let mut i = 0;

    while i < n {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = find_bytes(bytes, i, b"\n").unwrap_or(n);
                comments.push(Comment {
                    start: i,
                    text: text[i..end].to_string(),
                });
                blank(&mut out[i..end]);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let close = find_bytes(bytes, i + 2, b"*/").ok_or(ParseError::UnterminatedComment {
                    line: line_of(lines, i),
                })?;
                let end = close + 2;
                comments.push(Comment {
                    start: i,
                    text: text[i..end].to_string(),
                });
                blank(&mut out[i..end]);
                i = end;
            }
            b'"' if bytes[i..].starts_with(b"\"\"\"") => {
                let close = close_text_block(bytes, i + 3).ok_or(ParseError::UnterminatedLiteral {
                    line: line_of(lines, i),
                })?;
                blank(&mut out[i + 3..close]);
                i = close + 3;
            }
            quote @ (b'"' | b'\'') => {
                let close = close_quote(bytes, i + 1, quote).ok_or(ParseError::UnterminatedLiteral {
                    line: line_of(lines, i),
                })?;
                blank(&mut out[i + 1..close]);
                i = close + 1;
            }
            _ => i += 1,
        }
    }

    let masked = String::from_utf8(out).map_err(|_| ParseError::NotUtf8)?;
    Ok((masked, comments))
}

/// Map every `{` to its `}`; fails on any unbalanced brace or parenthesis.
fn match_braces(masked: &[u8], lines: &[usize]) -> Result<FxHashMap<usize, usize>, ParseError> {
    let mut pairs = FxHashMap::default();
    let mut open = Vec::new();
    let mut parens: Vec<usize> = Vec::new();
    for (i, b) in masked.iter().enumerate() {
        match b {
            b'{' => open.push(i),
            b'}' => {
                let start = open.pop().ok_or(ParseError::Unbalanced {
                    line: line_of(lines, i),
                })?;
                pairs.insert(start, i);
            }
            b'(' => parens.push(i),
            b')' => {
                parens.pop().ok_or(ParseError::Unbalanced {
                    line: line_of(lines, i),
                })?;
            }
            _ => {}
        }
    }
    if let Some(&pos) = open.last().or(parens.last()) {
        return Err(ParseError::Unbalanced {
            line: line_of(lines, pos),
        });
    }
    Ok(pairs)
}

/// A declaration header with its annotations lifted out.
struct Header {
    annotations: Vec<Annotation>,
    /// Masked header with annotations blanked; same length as the input.
    rest: String,
}

fn split_annotations(masked: &str, raw: &str) -> Header {
    let b = masked.as_bytes();
    let mut rest = b.to_vec();
    let mut annotations = Vec::new();
    let mut k = 0;
    while k < b.len() {
        if b[k] != b'@' {
            k += 1;
            continue;
        }
        let name_start = k + 1;
        let mut name_end = name_start;
        while name_end < b.len()
            && (b[name_end].is_ascii_alphanumeric() || matches!(b[name_end], b'_' | b'$' | b'.'))
        {
            name_end += 1;
        }
        let name = &masked[name_start..name_end];
        if name.is_empty() || name == "interface" {
            k = name_end.max(k + 1);
            continue;
        }

        let mut end = name_end;
        let mut p = name_end;
        while p < b.len() && b[p].is_ascii_whitespace() {
            p += 1;
        }
        if p < b.len() && b[p] == b'(' {
            let mut depth = 0usize;
            let mut q = p;
            while q < b.len() {
                match b[q] {
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                q += 1;
            }
            end = (q + 1).min(b.len());
        }

        let simple = name.rsplit('.').next().unwrap_or(name);
        annotations.push(Annotation {
            name: simple.to_string(),
            text: raw.get(k..end).unwrap_or_default().to_string(),
        });
        blank(&mut rest[k..end]);
        k = end;
    }
    Header {
        annotations,
        rest: String::from_utf8_lossy(&rest).into_owned(),
    }
}

/// Modifier keywords among the words of `text`.
fn modifiers_in(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for word in text.split_whitespace() {
        if MODIFIERS.contains(&word) {
            found.push(word.to_string());
        }
    }
    found
}

/// Split on commas outside of any `()`, `{}` or `<>` nesting.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '{' | '<' => depth += 1,
            ')' | '}' | '>' => depth -= 1,
            ',' if depth == 0 => {
                pieces.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

struct Parser<'a> {
    raw: &'a str,
    masked: &'a str,
    comments: &'a [Comment],
    braces: FxHashMap<usize, usize>,
    lines: Vec<usize>,
}

struct Collected {
    methods: Vec<MethodDecl>,
    fields: Vec<FieldDecl>,
}

impl Parser<'_> {
    fn line(&self, offset: usize) -> usize {
        line_of(&self.lines, offset)
    }

    fn close_of(&self, open: usize, fallback: usize) -> usize {
        self.braces.get(&open).copied().unwrap_or(fallback)
    }

    /// The comment block directly above a type header in `[seg, open)`.
    ///
    /// A blank line ends the block, and so does a comment trailing code on
    /// its own line (`int a; // note`).
    fn doc_before(&self, seg: usize, open: usize) -> String {
        let masked = self.masked.as_bytes();
        let header_start = (seg..open)
            .find(|&i| !masked[i].is_ascii_whitespace())
            .unwrap_or(open);
        let mut block = Vec::new();
        let mut boundary = header_start;
        for c in self
            .comments
            .iter()
            .rev()
            .filter(|c| c.start >= seg && c.start < header_start)
        {
            let end = c.start + c.text.len();
            if masked[end..boundary].iter().filter(|&&b| b == b'\n').count() > 1 {
                break;
            }
            let line_start = self.masked[..c.start].rfind('\n').map_or(0, |p| p + 1);
            if !self.masked[line_start..c.start].trim().is_empty() {
                break;
            }
            block.push(c.text.as_str());
            boundary = c.start;
        }
        block.reverse();
        block.join("\n")
    }

    /// Walk the members of `[start, end)`. Types are appended to `types`;
    /// methods and fields of the enclosing type are returned.
    fn members(
        &self,
        start: usize,
        end: usize,
        prefix: &str,
        owner: Option<&str>,
        types: &mut Vec<TypeDecl>,
    ) -> Collected {
        let bytes = self.masked.as_bytes();
        let mut collected = Collected {
            methods: Vec::new(),
            fields: Vec::new(),
        };
        let mut seg = start;
        let mut parens = 0i32;
        let mut i = start;

        while i < end {
            match bytes[i] {
                b'(' => parens += 1,
                b')' => parens -= 1,
                b'{' => {
                    let close = self.close_of(i, end);
                    if parens == 0 && self.block(seg, i, close, prefix, owner, types, &mut collected) {
                        seg = close + 1;
                    }
                    i = close + 1;
                    continue;
                }
                b';' if parens == 0 => {
                    if let Some(owner) = owner {
                        self.statement(seg, i, owner, &mut collected);
                    }
                    seg = i + 1;
                }
                _ => {}
            }
            i += 1;
        }
        collected
    }

    /// Handle a `{...}` block whose header spans `[seg, open)`.
    /// Returns false when the block is part of a field initializer still
    /// running until the next `;`.
    #[allow(clippy::too_many_arguments)]
    fn block(
        &self,
        seg: usize,
        open: usize,
        close: usize,
        prefix: &str,
        owner: Option<&str>,
        types: &mut Vec<TypeDecl>,
        collected: &mut Collected,
    ) -> bool {
        let header = split_annotations(&self.masked[seg..open], &self.raw[seg..open]);

        if let Some(caps) = TYPE_HEADER.captures(&header.rest) {
            let (Some(kw), Some(name)) = (caps.get(1), caps.get(2)) else {
                return true;
            };
            let kind = match kw.as_str() {
                "class" => TypeKind::Class,
                "interface" => TypeKind::Interface,
                "enum" => TypeKind::Enum,
                _ => TypeKind::Record,
            };
            let name_str = name.as_str().to_string();
            let qualified_name = if prefix.is_empty() {
                name_str.clone()
            } else {
                format!("{}.{}", prefix, name_str)
            };

            let mut body_start = open + 1;
            let mut constants = Vec::new();
            if kind == TypeKind::Enum {
                let (found, members_start) = self.enum_constants(open + 1, close);
                constants = found;
                body_start = members_start;
            }

            let slot = types.len();
            let inner = self.members(body_start, close, &qualified_name, Some(&name_str), types);
            types.insert(
                slot,
                TypeDecl {
                    kind,
                    name: name_str,
                    qualified_name,
                    modifiers: modifiers_in(&header.rest[..kw.start()]),
                    annotations: header.annotations,
                    doc: self.doc_before(seg, open),
                    methods: inner.methods,
                    fields: inner.fields,
                    constants,
                    line: self.line(seg + name.start()),
                },
            );
            return true;
        }

        let Some(owner) = owner else {
            return true;
        };
        let rest = header.rest.as_str();
        let paren = rest.find('(');
        match (rest.find('='), paren) {
            (Some(eq), Some(lp)) if eq < lp => return false,
            (Some(_), None) => return false,
            _ => {}
        }
        let Some(lp) = paren else {
            // initializer block or compact record constructor
            return true;
        };
        let Some(name) = TRAILING_IDENT.captures(&rest[..lp]).and_then(|c| c.get(1)) else {
            return true;
        };
        if name.as_str() == owner {
            return true;
        }
        collected.methods.push(MethodDecl {
            name: name.as_str().to_string(),
            modifiers: modifiers_in(&rest[..name.start()]),
            annotations: header.annotations,
            body: Some(self.masked[open..=close.min(self.masked.len() - 1)].to_string()),
            body_line: self.line(open),
            line: self.line(seg + name.start()),
        });
        true
    }

    /// A `;`-terminated member: an abstract method or a field.
    fn statement(&self, seg: usize, semi: usize, owner: &str, collected: &mut Collected) {
        let header = split_annotations(&self.masked[seg..semi], &self.raw[seg..semi]);
        let rest = header.rest.as_str();
        if rest.trim().is_empty() {
            return;
        }
        let paren = rest.find('(');
        let eq = rest.find('=');

        if let Some(lp) = paren.filter(|lp| eq.is_none_or(|eq| *lp < eq)) {
            let Some(name) = TRAILING_IDENT.captures(&rest[..lp]).and_then(|c| c.get(1)) else {
                return;
            };
            if name.as_str() == owner {
                return;
            }
            collected.methods.push(MethodDecl {
                name: name.as_str().to_string(),
                modifiers: modifiers_in(&rest[..name.start()]),
                annotations: header.annotations,
                body: None,
                body_line: self.line(seg + lp),
                line: self.line(seg + name.start()),
            });
            return;
        }

        let declaration = &rest[..eq.unwrap_or(rest.len())];
        let first = split_top_level(declaration)
            .into_iter()
            .next()
            .unwrap_or(declaration);
        let Some(name) = TRAILING_IDENT.captures(first).and_then(|c| c.get(1)) else {
            return;
        };
        let before = &first[..name.start()];
        let mut type_start = 0;
        for word in WORD.find_iter(before) {
            if MODIFIERS.contains(&word.as_str()) {
                type_start = word.end();
            } else {
                break;
            }
        }
        let type_name = before[type_start..].trim();
        if type_name.is_empty() {
            return;
        }
        collected.fields.push(FieldDecl {
            name: name.as_str().to_string(),
            type_name: type_name.split_whitespace().collect::<Vec<_>>().join(" "),
            modifiers: modifiers_in(before),
            line: self.line(seg + name.start()),
        });
    }

    /// Enum constants up to the first top-level `;`. Returns them with the
    /// offset where ordinary members begin.
    fn enum_constants(&self, start: usize, end: usize) -> (Vec<String>, usize) {
        let bytes = self.masked.as_bytes();
        let mut parens = 0i32;
        let mut j = start;
        while j < end {
            match bytes[j] {
                b'(' => parens += 1,
                b')' => parens -= 1,
                b'{' => {
                    j = self.close_of(j, end) + 1;
                    continue;
                }
                b';' if parens == 0 => break,
                _ => {}
            }
            j += 1;
        }
        let section_end = j.min(end);
        let header = split_annotations(
            &self.masked[start..section_end],
            &self.raw[start..section_end],
        );
        let constants = split_top_level(&header.rest)
            .into_iter()
            .filter_map(|piece| {
                LEADING_IDENT
                    .captures(piece)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
            })
            .collect();
        let members_start = if section_end < end { section_end + 1 } else { end };
        (constants, members_start)
    }
}
