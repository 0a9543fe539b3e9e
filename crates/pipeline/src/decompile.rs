//! External decompiler invocation

use autodecomp_core::config::CommandConfig;
use autodecomp_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Translates one fragment into source text
pub trait Decompiler {
    fn decompile(&self, fragment: &Path) -> Result<String>;
}

/// Decompiler run as a one-shot subprocess taking the fragment path as its last argument
#[derive(Debug, Clone)]
pub struct CommandDecompiler {
    command: CommandConfig,
    working_dir: PathBuf,
}

impl CommandDecompiler {
    pub fn new(command: CommandConfig, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            command,
            working_dir: working_dir.into(),
        }
    }
}

impl Decompiler for CommandDecompiler {
    fn decompile(&self, fragment: &Path) -> Result<String> {
        if !fragment.exists() {
            return Err(Error::FragmentMissing(fragment.to_path_buf()));
        }

        debug!("Running {} on {:?}", self.command.program, fragment);
        let output = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(fragment)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| Error::DecompileFailed {
                fragment: fragment.to_path_buf(),
                status: "not started".to_string(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::DecompileFailed {
                fragment: fragment.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| {
            Error::invalid_format(format!("decompiler output for {}: {}", fragment.display(), e))
        })
    }
}

/// Replace `?` placeholder types in decompiler output with `fallback`
///
/// A `?` counts as a type when it starts a line or follows `(`, `,`, `{` or `;`;
/// conditional operators always follow an operand and are left alone.
pub fn clean_output(text: &str, fallback: Option<&str>) -> String {
    let Some(fallback) = fallback else {
        return text.to_string();
    };

    let mut cleaned = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if c == '?' && matches!(prev, None | Some('\n' | '(' | ',' | '{' | ';')) {
            cleaned.push_str(fallback);
        } else {
            cleaned.push(c);
        }
        if !c.is_whitespace() || c == '\n' {
            prev = Some(c);
        }
    }
    cleaned
}
