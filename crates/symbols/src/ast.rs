//! Walking clang's JSON AST dump

use autodecomp_core::{StorageClass, Symbol};
use serde_json::Value;
use std::path::Path;

/// clang only prints `file`/`line` when they differ from the previous location,
/// so the walk carries the last seen values forward in document order
#[derive(Debug, Default)]
struct LocationCursor {
    file: Option<String>,
    line: usize,
}

impl LocationCursor {
    fn advance_bare(&mut self, loc: &Value) {
        if let Some(file) = loc.get("file").and_then(Value::as_str) {
            self.file = Some(file.to_string());
        }
        if let Some(line) = loc.get("line").and_then(Value::as_u64) {
            self.line = line as usize;
        }
    }

    /// Advance over a location, returning the expansion line for macro locations
    fn advance(&mut self, loc: &Value) -> usize {
        match (loc.get("spellingLoc"), loc.get("expansionLoc")) {
            (Some(spelling), Some(expansion)) => {
                self.advance_bare(spelling);
                self.advance_bare(expansion);
            }
            _ => self.advance_bare(loc),
        }
        self.line
    }

    fn in_file(&self, main_file: &Path) -> bool {
        self.file.as_deref().is_some_and(|file| Path::new(file) == main_file)
    }
}

/// Collect variable declarations from a clang JSON AST dump
///
/// Returns declarations located in `main_file` in document order, at any
/// nesting depth, except automatic locals of function bodies.
pub fn collect_variables(root: &Value, main_file: &Path) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    let mut cursor = LocationCursor::default();
    let mut stack: Vec<(&Value, bool)> = vec![(root, false)];

    while let Some((node, in_function)) = stack.pop() {
        let kind = node.get("kind").and_then(Value::as_str).unwrap_or_default();

        let line = node.get("loc").map(|loc| cursor.advance(loc)).unwrap_or(cursor.line);
        let decl_file_matches = cursor.in_file(main_file);
        if let Some(range) = node.get("range") {
            for end in ["begin", "end"] {
                if let Some(loc) = range.get(end) {
                    cursor.advance(loc);
                }
            }
        }

        if kind == "VarDecl" && decl_file_matches && !is_implicit(node) {
            let storage = match node.get("storageClass").and_then(Value::as_str) {
                Some("extern") => StorageClass::Extern,
                _ => StorageClass::Definition,
            };
            if !in_function || storage == StorageClass::Extern {
                symbols.push(Symbol {
                    name: node
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    type_name: node
                        .pointer("/type/qualType")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    line,
                    storage,
                });
            }
        }

        if let Some(inner) = node.get("inner").and_then(Value::as_array) {
            let child_in_function = in_function || kind == "FunctionDecl";
            stack.extend(inner.iter().rev().map(|child| (child, child_in_function)));
        }
    }

    symbols
}

/// Drop a dump without recursing once per nesting level
pub fn dismantle(root: Value) {
    let mut pending = vec![root];
    while let Some(mut value) = pending.pop() {
        match &mut value {
            Value::Array(items) => pending.append(items),
            Value::Object(fields) => {
                pending.extend(std::mem::take(fields).into_iter().map(|(_, field)| field))
            }
            _ => {}
        }
    }
}

fn is_implicit(node: &Value) -> bool {
    node.get("isImplicit").and_then(Value::as_bool).unwrap_or(false)
}
