//! Post-splice declaration reconciliation

use autodecomp_core::{Result, Symbol};
use autodecomp_source::{replace_line, SourceLines};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::info;

/// Declarations in `post` whose name appears in neither `pre` nor `context`
pub fn reconcile(pre: &[Symbol], post: &[Symbol], context: &[Symbol]) -> Vec<Symbol> {
    let known: HashSet<&str> = pre
        .iter()
        .chain(context)
        .map(|symbol| symbol.name.as_str())
        .collect();

    post.iter()
        .filter(|symbol| !known.contains(symbol.name.as_str()))
        .cloned()
        .collect()
}

/// Comment out the declaration line of every symbol in `candidates`
///
/// Lines are rewritten bottom-up so each recorded line number still points at
/// its declaration when it is reached. Returns the number of lines rewritten.
pub fn neutralize(file: &Path, candidates: &[Symbol]) -> Result<usize> {
    let lines: BTreeSet<usize> = candidates.iter().map(|symbol| symbol.line).collect();
    if lines.is_empty() {
        return Ok(0);
    }

    let source = SourceLines::load(file)?;
    let mut rewritten = 0;
    for &line in lines.iter().rev() {
        let text = source.get(line).unwrap_or_default().trim();
        info!("{}:{}: removing `{}`", file.display(), line, text);
        replace_line(file, line, &format!("// autodecomp: {}", text))?;
        rewritten += 1;
    }
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodecomp_core::StorageClass;

    fn sym(name: &str, line: usize) -> Symbol {
        Symbol {
            name: name.to_string(),
            type_name: "s32".to_string(),
            line,
            storage: StorageClass::Extern,
        }
    }

    fn names(symbols: &[Symbol]) -> Vec<&str> {
        symbols.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_reconcile_flags_only_new_names() {
        let pre = [sym("A", 1), sym("B", 2)];
        let context = [sym("C", 40)];
        let post = [sym("A", 1), sym("B", 2), sym("C", 3), sym("D", 4)];

        assert_eq!(names(&reconcile(&pre, &post, &context)), vec!["D"]);
    }

    #[test]
    fn test_reconcile_empty_when_covered() {
        let pre = [sym("A", 1)];
        let context = [sym("B", 9)];
        let post = [sym("B", 2), sym("A", 5)];

        assert!(reconcile(&pre, &post, &context).is_empty());
    }

    #[test]
    fn test_reconcile_keys_on_name_not_line() {
        let pre = [sym("A", 1)];
        let post = [sym("A", 7), sym("E", 8), sym("E", 12)];

        let flagged = reconcile(&pre, &post, &[]);
        assert_eq!(names(&flagged), vec!["E", "E"]);
        assert_eq!(flagged[1].line, 12);
    }

    #[test]
    fn test_neutralize_bottom_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");
        std::fs::write(
            &path,
            "#include \"variables.h\"\nextern s32 D_1;\nextern s32 D_2, D_3;\nvoid f(void) {\n}\n",
        )
        .unwrap();

        let count = neutralize(&path, &[sym("D_1", 2), sym("D_2", 3), sym("D_3", 3)]).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "#include \"variables.h\"\n\
             // autodecomp: extern s32 D_1;\n\
             \n\
             // autodecomp: extern s32 D_2, D_3;\n\
             \n\
             void f(void) {\n\
             }\n"
        );
    }

    #[test]
    fn test_neutralize_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");
        std::fs::write(&path, "int x;\n").unwrap();

        assert_eq!(neutralize(&path, &[]).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "int x;\n");
    }
}
