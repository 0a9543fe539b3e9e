//! Symbol extraction through clang

use crate::ast;
use autodecomp_core::{Config, Error, Result, Symbol};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Parser argument sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseProfile {
    /// No standard headers; for raw decompiler output
    Permissive,
    /// Full include search paths and defines; for project files
    Strict,
}

/// Anything that can list the variables a file declares
pub trait SymbolSource {
    fn extract(&self, file: &Path, profile: ParseProfile) -> Result<Vec<Symbol>>;

    /// Symbols declared across several files, in order
    fn extract_all(&self, files: &[PathBuf], profile: ParseProfile) -> Result<Vec<Symbol>> {
        let mut symbols = Vec::new();
        for file in files {
            symbols.extend(self.extract(file, profile)?);
        }
        Ok(symbols)
    }
}

/// Symbol source backed by `clang -Xclang -ast-dump=json`
#[derive(Debug, Clone)]
pub struct ClangExtractor {
    program: String,
    std: String,
    include_dirs: Vec<PathBuf>,
    defines: Vec<String>,
}

impl ClangExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            std: "c11".to_string(),
            include_dirs: Vec::new(),
            defines: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.parser.program.clone(),
            std: config.parser.std.clone(),
            include_dirs: config
                .parser
                .include_dirs
                .iter()
                .map(|dir| config.resolve(dir))
                .collect(),
            defines: config.parser.defines.clone(),
        }
    }

    /// Arguments for `profile`, without the input file
    pub fn profile_args(&self, profile: ParseProfile) -> Vec<String> {
        let mut args: Vec<String> = ["-fsyntax-only", "-Xclang", "-ast-dump=json", "-x", "c"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        match profile {
            ParseProfile::Permissive => {
                args.push("-nostdinc".to_string());
                args.push("-ferror-limit=0".to_string());
            }
            ParseProfile::Strict => {
                args.push(format!("-std={}", self.std));
                args.extend(self.include_dirs.iter().map(|dir| format!("-I{}", dir.display())));
                args.extend(self.defines.iter().map(|def| format!("-D{}", def)));
            }
        }
        args
    }
}

impl SymbolSource for ClangExtractor {
    fn extract(&self, file: &Path, profile: ParseProfile) -> Result<Vec<Symbol>> {
        if !file.exists() {
            return Err(Error::not_found(file.display().to_string()));
        }

        debug!("Parsing {:?} ({:?})", file, profile);
        let output = Command::new(&self.program)
            .args(self.profile_args(profile))
            .arg(file)
            .output()
            .map_err(|e| Error::parse(format!("cannot run {}: {}", self.program, e)))?;

        // clang exits non-zero on source errors but still dumps what it parsed
        for diag in String::from_utf8_lossy(&output.stderr).lines() {
            if !diag.trim().is_empty() {
                info!("[Diagnostic] {}", diag);
            }
        }

        if output.stdout.is_empty() {
            warn!("{} produced no AST for {:?}", self.program, file);
            return Ok(Vec::new());
        }

        let root = parse_dump(&output.stdout)
            .map_err(|e| Error::invalid_format(format!("AST dump of {}: {}", file.display(), e)))?;

        let symbols = ast::collect_variables(&root, file);
        ast::dismantle(root);
        for symbol in &symbols {
            debug!("{}", symbol);
        }
        Ok(symbols)
    }
}

/// Parse an AST dump of any nesting depth; long `else if` chains and
/// operator sequences nest far past serde_json's default limit
fn parse_dump(bytes: &[u8]) -> serde_json::Result<Value> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}
