//! Marker scanning

use autodecomp_core::{Error, Marker, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Finds marker lines in a source file
#[derive(Debug, Clone)]
pub struct MarkerLocator {
    prefix: String,
    fragment_root: PathBuf,
}

impl MarkerLocator {
    pub fn new(prefix: impl Into<String>, fragment_root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            fragment_root: fragment_root.into(),
        }
    }

    /// Scan `file` top to bottom and return every marker in order
    pub fn locate(&self, file: &Path) -> Result<Vec<Marker>> {
        let content = std::fs::read_to_string(file).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::not_found(file.display().to_string()),
            _ => Error::Io(e),
        })?;

        let mut markers = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if !line.starts_with(&self.prefix) {
                continue;
            }
            match first_quoted(line) {
                Some(path) => markers.push(Marker {
                    file: file.to_path_buf(),
                    line: idx + 1,
                    fragment: self.fragment_root.join(path),
                }),
                None => warn!("{}:{}: marker without a quoted path", file.display(), idx + 1),
            }
        }

        debug!("Found {} markers in {:?}", markers.len(), file);
        Ok(markers)
    }
}

fn first_quoted(line: &str) -> Option<&str> {
    let start = line.find('"')? + 1;
    let len = line[start..].find('"')?;
    Some(&line[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRAGMA: &str = "#pragma GLOBAL_ASM";

    #[test]
    fn test_locate_markers() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("game_1000.c");
        std::fs::write(
            &file,
            "#include <ultra64.h>\n\
             \n\
             #pragma GLOBAL_ASM(\"asm/nonmatchings/game_1000/func_1000.s\")\n\
             \n\
             void func_1040(void) {\n\
             }\n\
             #pragma GLOBAL_ASM(\"asm/nonmatchings/game_1000/func_1080.s\")\n",
        )
        .unwrap();

        let locator = MarkerLocator::new(PRAGMA, "/work/conker");
        let markers = locator.locate(&file).unwrap();

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].line, 3);
        assert_eq!(
            markers[0].fragment,
            PathBuf::from("/work/conker/asm/nonmatchings/game_1000/func_1000.s")
        );
        assert_eq!(markers[1].line, 7);
        assert_eq!(markers[1].file, file);
    }

    #[test]
    fn test_indented_prefix_is_not_a_marker() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.c");
        std::fs::write(&file, "  #pragma GLOBAL_ASM(\"x.s\")\n// #pragma GLOBAL_ASM(\"y.s\")\n").unwrap();

        let markers = MarkerLocator::new(PRAGMA, ".").locate(&file).unwrap();
        assert!(markers.is_empty());
    }

    #[test]
    fn test_no_markers_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.c");
        std::fs::write(&file, "int x;\n").unwrap();

        assert!(MarkerLocator::new(PRAGMA, ".").locate(&file).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = MarkerLocator::new(PRAGMA, ".")
            .locate(&dir.path().join("missing.c"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_first_quoted() {
        assert_eq!(first_quoted(r#"X("a/b.s") "c""#), Some("a/b.s"));
        assert_eq!(first_quoted(r#"X("unterminated"#), None);
    }
}
