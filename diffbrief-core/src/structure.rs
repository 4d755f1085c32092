//! Best-effort detection of top-level declarations, used to describe rewrites
//! that are too large to show as hunks.
//!
//! This is line pattern matching, not parsing. Unusual formatting under- or
//! over-reports; the output is a skimming aid for "which functions, classes,
//! and types came and went".

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::text::split_lines;
use crate::types::{ChangeAction, StructuralChange, StructuralElement, StructuralKind};

/// A compiled declaration pattern. Capture group 1 is the declared name.
struct Pattern {
    regex: Regex,
    kind: StructuralKind,
}

fn compile(table: &[(&str, StructuralKind)]) -> Vec<Pattern> {
    table
        .iter()
        .map(|&(src, kind)| Pattern {
            regex: Regex::new(src).unwrap_or_else(|e| panic!("invalid declaration pattern {src}: {e}")),
            kind,
        })
        .collect()
}

static ECMASCRIPT: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    use StructuralKind::*;
    compile(&[
        (
            r"^(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)",
            Function,
        ),
        (
            r"^(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::[^=]+)?=>|[A-Za-z_$][\w$]*\s*=>)",
            Function,
        ),
        (
            r"^(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][\w$]*)",
            Class,
        ),
        (r"^(?:export\s+)?(?:declare\s+)?interface\s+([A-Za-z_$][\w$]*)", Interface),
        (r"^(?:export\s+)?(?:declare\s+)?type\s+([A-Za-z_$][\w$]*)\s*(?:<[^=]*>)?\s*=", Type),
        (r"^(?:export\s+)?(?:declare\s+)?(?:const\s+)?enum\s+([A-Za-z_$][\w$]*)", Enum),
    ])
});

static RUST: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    use StructuralKind::*;
    compile(&[
        (
            r#"^(?:pub(?:\([^)]*\))?\s+)?(?:default\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+([A-Za-z_]\w*)"#,
            Function,
        ),
        (r"^(?:pub(?:\([^)]*\))?\s+)?struct\s+([A-Za-z_]\w*)", Struct),
        (r"^(?:pub(?:\([^)]*\))?\s+)?enum\s+([A-Za-z_]\w*)", Enum),
        (r"^(?:pub(?:\([^)]*\))?\s+)?(?:unsafe\s+)?(?:auto\s+)?trait\s+([A-Za-z_]\w*)", Trait),
        (
            r"^(?:unsafe\s+)?impl(?:\s*<[^{]*?>)?\s+([^{]+?)\s*(?:\bwhere\b[^{]*)?(?:\{.*)?$",
            Impl,
        ),
    ])
});

/// Kept apart from [`RUST`]: a bare `type` would shadow Go's `type X struct`
/// when every family is tried.
static RUST_ALIAS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    compile(&[(r"^(?:pub(?:\([^)]*\))?\s+)?type\s+([A-Za-z_]\w*)", StructuralKind::Type)])
});

static PYTHON: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    use StructuralKind::*;
    compile(&[
        (r"^(?:async\s+)?def\s+([A-Za-z_]\w*)", Function),
        (r"^class\s+([A-Za-z_]\w*)", Class),
    ])
});

static GO: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    use StructuralKind::*;
    compile(&[
        (r"^func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)", Function),
        (r"^type\s+([A-Za-z_]\w*)\s+struct\b", Struct),
        (r"^type\s+([A-Za-z_]\w*)\s+interface\b", Interface),
        (r"^type\s+([A-Za-z_]\w*)", Type),
    ])
});

/// Patterns to try for a language tag, in precedence order.
///
/// Unknown tags try every family: ECMAScript, Rust, Python, then Go, with
/// the Rust `type` alias last.
fn patterns_for(language: &str) -> Vec<&'static Pattern> {
    let tables: Vec<&'static [Pattern]> = match language {
        "typescript" | "javascript" | "tsx" | "jsx" => vec![ECMASCRIPT.as_slice()],
        "rust" => vec![RUST.as_slice(), RUST_ALIAS.as_slice()],
        "python" => vec![PYTHON.as_slice()],
        "go" => vec![GO.as_slice()],
        _ => vec![
            ECMASCRIPT.as_slice(),
            RUST.as_slice(),
            PYTHON.as_slice(),
            GO.as_slice(),
            RUST_ALIAS.as_slice(),
        ],
    };
    tables.into_iter().flatten().collect()
}

/// Matches one line against `patterns` in order; the first match wins.
///
/// Indented lines are treated as nested declarations and never match.
fn match_line(line: &str, patterns: &[&Pattern]) -> Option<StructuralElement> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let trimmed = line.trim();
    patterns.iter().find_map(|p| {
        let name = p.regex.captures(trimmed)?.get(1)?.as_str().trim();
        (!name.is_empty()).then(|| StructuralElement { name: name.to_owned(), kind: p.kind })
    })
}

/// Extracts the top-level declarations of `text`, unique by name.
///
/// Elements keep the position of their first appearance. When a name is
/// declared twice the later kind replaces the earlier one.
pub fn extract(text: &str, language: &str) -> Vec<StructuralElement> {
    let patterns = patterns_for(language);
    let mut elements: Vec<StructuralElement> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for element in split_lines(text).into_iter().filter_map(|l| match_line(l, &patterns)) {
        match by_name.get(&element.name) {
            Some(&idx) => elements[idx].kind = element.kind,
            None => {
                by_name.insert(element.name.clone(), elements.len());
                elements.push(element);
            }
        }
    }
    elements
}

/// Reports declarations present in only one snapshot.
///
/// Removed elements come first in old-file order, then added elements in
/// new-file order. Names present in both snapshots are not reported, whatever
/// happened to their bodies; renames show up as one removal plus one addition.
pub fn summarize(old_text: &str, new_text: &str, language: &str) -> Vec<StructuralChange> {
    let old = extract(old_text, language);
    let new = extract(new_text, language);
    let old_names: HashSet<&str> = old.iter().map(|e| e.name.as_str()).collect();
    let new_names: HashSet<&str> = new.iter().map(|e| e.name.as_str()).collect();

    let removed = old
        .iter()
        .filter(|e| !new_names.contains(e.name.as_str()))
        .map(|e| StructuralChange { kind: e.kind, name: e.name.clone(), action: ChangeAction::Removed });
    let added = new
        .iter()
        .filter(|e| !old_names.contains(e.name.as_str()))
        .map(|e| StructuralChange { kind: e.kind, name: e.name.clone(), action: ChangeAction::Added });

    removed.chain(added).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str, language: &str) -> Vec<(String, StructuralKind)> {
        extract(text, language).into_iter().map(|e| (e.name, e.kind)).collect()
    }

    #[test]
    fn rename_is_a_removal_plus_an_addition() {
        let changes = summarize("function foo() {}\n", "function bar() {}\n", "typescript");
        assert_eq!(
            changes,
            vec![
                StructuralChange {
                    kind: StructuralKind::Function,
                    name: "foo".into(),
                    action: ChangeAction::Removed
                },
                StructuralChange {
                    kind: StructuralKind::Function,
                    name: "bar".into(),
                    action: ChangeAction::Added
                },
            ]
        );
    }

    #[test]
    fn ecmascript_declarations() {
        let src = "\
export default async function load() {}
export const handler = async (req: Request): Promise<void> => {}
const square = x => x * x
export abstract class Store {}
export interface Props {}
export type Id<T> = string
const enum Color { Red }
const LIMIT = 10
";
        assert_eq!(
            names(src, "typescript"),
            vec![
                ("load".into(), StructuralKind::Function),
                ("handler".into(), StructuralKind::Function),
                ("square".into(), StructuralKind::Function),
                ("Store".into(), StructuralKind::Class),
                ("Props".into(), StructuralKind::Interface),
                ("Id".into(), StructuralKind::Type),
                ("Color".into(), StructuralKind::Enum),
            ]
        );
    }

    #[test]
    fn rust_declarations_skip_nested_items() {
        let src = "\
pub(crate) async fn run() {}
pub struct Config {
    pub fn not_top_level() {}
}
enum Mode { A }
pub trait Render {}
impl<T: Into<String>> Render for Wrapper<T> {
    fn render(&self) {}
}
impl Config {
";
        assert_eq!(
            names(src, "rust"),
            vec![
                ("run".into(), StructuralKind::Function),
                ("Config".into(), StructuralKind::Impl),
                ("Mode".into(), StructuralKind::Enum),
                ("Render".into(), StructuralKind::Trait),
                ("Render for Wrapper<T>".into(), StructuralKind::Impl),
            ]
        );
    }

    #[test]
    fn python_and_go_declarations() {
        let py = "class Cache:\n    def get(self):\n        pass\nasync def fetch():\n    pass\n";
        assert_eq!(
            names(py, "python"),
            vec![("Cache".into(), StructuralKind::Class), ("fetch".into(), StructuralKind::Function)]
        );

        let go = "type Server struct {\n}\ntype Handler interface {\n}\ntype ID string\nfunc (s *Server) Start() {\n}\n";
        assert_eq!(
            names(go, "go"),
            vec![
                ("Server".into(), StructuralKind::Struct),
                ("Handler".into(), StructuralKind::Interface),
                ("ID".into(), StructuralKind::Type),
                ("Start".into(), StructuralKind::Function),
            ]
        );
    }

    #[test]
    fn unknown_language_tries_every_family() {
        let src = "fn alpha() {}\ndef beta():\nfunc gamma() {\nfunction delta() {}\n";
        let found: Vec<String> = extract(src, "text").into_iter().map(|e| e.name).collect();
        assert_eq!(found, vec!["alpha", "beta", "gamma", "delta"]);
    }

    #[test]
    fn impl_names_stop_at_the_body() {
        let src = "impl Foo {}\nimpl Bar for Baz { }\nimpl<T> Show for Vec<T> where T: Show {\n";
        assert_eq!(
            names(src, "rust"),
            vec![
                ("Foo".into(), StructuralKind::Impl),
                ("Bar for Baz".into(), StructuralKind::Impl),
                ("Show for Vec<T>".into(), StructuralKind::Impl),
            ]
        );
    }

    #[test]
    fn unknown_language_keeps_go_struct_kinds() {
        let src = "type Server struct {\n}\ntype Handler interface {\n}\ntype ID string\n";
        assert_eq!(
            names(src, "text"),
            vec![
                ("Server".into(), StructuralKind::Struct),
                ("Handler".into(), StructuralKind::Interface),
                ("ID".into(), StructuralKind::Type),
            ]
        );
        assert_eq!(names("pub type Alias = u32;\n", "rust"), vec![("Alias".into(), StructuralKind::Type)]);
    }

    #[test]
    fn known_family_ignores_other_syntaxes() {
        assert!(extract("def helper():\n", "rust").is_empty());
    }

    #[test]
    fn bodies_changing_is_not_reported() {
        let old = "fn keep() { 1 }\nfn gone() {}\n";
        let new = "fn keep() { 2 }\nstruct Fresh;\n";
        let changes = summarize(old, new, "rust");
        let described: Vec<_> = changes.iter().map(|c| (c.name.as_str(), c.action)).collect();
        assert_eq!(described, vec![("gone", ChangeAction::Removed), ("Fresh", ChangeAction::Added)]);
    }
}
