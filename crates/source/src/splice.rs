//! Line-level splicing
//!
//! Every operation reads the whole file, edits an in-memory list of lines and
//! writes the whole file back. Untouched lines keep their exact bytes,
//! including their original terminators.

use autodecomp_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source file held as lines, each with its terminator
#[derive(Debug, Clone)]
pub struct SourceLines {
    path: PathBuf,
    lines: Vec<String>,
}

impl SourceLines {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: content.split_inclusive('\n').map(str::to_string).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line text at a 1-based position, without its terminator
    pub fn get(&self, line: usize) -> Option<&str> {
        let raw = self.lines.get(line.checked_sub(1)?)?;
        Some(raw.trim_end_matches(&['\n', '\r'][..]))
    }

    /// Replace the line at `at_line` with `block` followed by one blank separator line
    pub fn splice<S: AsRef<str>>(&mut self, at_line: usize, block: &[S]) -> Result<()> {
        if at_line == 0 || at_line > self.lines.len() {
            return Err(Error::InvalidLine {
                line: at_line,
                len: self.lines.len(),
            });
        }

        let replacement = block
            .iter()
            .map(|line| format!("{}\n", line.as_ref()))
            .chain(std::iter::once("\n".to_string()));
        self.lines.splice(at_line - 1..at_line, replacement);
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, self.lines.concat())?;
        Ok(())
    }
}

/// Replace the line at `at_line` with a block of lines plus a blank separator
pub fn replace_block<S: AsRef<str>>(file: &Path, at_line: usize, block: &[S]) -> Result<()> {
    let mut source = SourceLines::load(file)?;
    source.splice(at_line, block)?;
    source.save()?;
    debug!(
        "Spliced {} lines over {}:{}",
        block.len(),
        file.display(),
        at_line
    );
    Ok(())
}

/// Overwrite the line at `at_line` with `new_line` plus a blank separator
pub fn replace_line(file: &Path, at_line: usize, new_line: &str) -> Result<()> {
    let mut source = SourceLines::load(file)?;
    source.splice(at_line, &[new_line])?;
    source.save()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_file(dir: &Path, count: usize) -> PathBuf {
        let path = dir.join("game.c");
        let content: String = (1..=count).map(|i| format!("line {}\n", i)).collect();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_replace_block_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = numbered_file(dir.path(), 12);
        std::fs::write(
            &path,
            std::fs::read_to_string(&path)
                .unwrap()
                .replace("line 10\n", "#pragma GLOBAL_ASM(\"seg/func_1000.s\")\n"),
        )
        .unwrap();

        let body = "void func_1000(void) {\n  return;\n}";
        let block: Vec<&str> = body.lines().collect();
        replace_block(&path, 10, &block).unwrap();

        let source = SourceLines::load(&path).unwrap();
        assert_eq!(source.len(), 15);
        assert_eq!(source.get(9), Some("line 9"));
        assert_eq!(source.get(10), Some("void func_1000(void) {"));
        assert_eq!(source.get(11), Some("  return;"));
        assert_eq!(source.get(12), Some("}"));
        assert_eq!(source.get(13), Some(""));
        assert_eq!(source.get(14), Some("line 11"));
        assert_eq!(source.get(15), Some("line 12"));
    }

    #[test]
    fn test_lines_outside_splice_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = numbered_file(dir.path(), 8);
        let before: Vec<String> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();

        let block = ["a", "b", "c", "d"];
        replace_block(&path, 4, &block).unwrap();
        let after: Vec<String> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();

        assert_eq!(&after[..3], &before[..3]);
        assert_eq!(&after[3..7], &block.map(String::from)[..]);
        assert_eq!(after[7], "");
        assert_eq!(&after[8..], &before[4..]);
    }

    #[test]
    fn test_replace_line_soft_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");
        std::fs::write(&path, "int a;\nextern s32 D_1;\nint b;\n").unwrap();

        replace_line(&path, 2, "// extern s32 D_1;").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "int a;\n// extern s32 D_1;\n\nint b;\n"
        );
    }

    #[test]
    fn test_crlf_lines_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");
        std::fs::write(&path, "one\r\ntwo\r\nthree").unwrap();

        replace_line(&path, 2, "TWO").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\r\nTWO\n\nthree");
    }

    #[test]
    fn test_invalid_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = numbered_file(dir.path(), 3);

        assert!(matches!(
            replace_line(&path, 0, "x"),
            Err(Error::InvalidLine { line: 0, len: 3 })
        ));
        assert!(matches!(
            replace_block(&path, 4, &["x"]),
            Err(Error::InvalidLine { line: 4, len: 3 })
        ));
        assert_eq!(SourceLines::load(&path).unwrap().get(3), Some("line 3"));
    }
}
