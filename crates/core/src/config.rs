//! Pipeline configuration

use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the project checkout; relative paths resolve against it
    pub project_root: PathBuf,
    /// Directory the quoted marker paths are relative to
    pub fragment_root: PathBuf,
    /// Line prefix identifying a marker
    pub marker_prefix: String,
    /// Fragment config settings
    pub segments: SegmentsConfig,
    /// External decompiler invocation
    pub decompiler: CommandConfig,
    /// External build invocation
    pub build: CommandConfig,
    /// Structural parser settings
    pub parser: ParserConfig,
    /// Headers whose declarations are already visible to every source file
    pub context_headers: Vec<PathBuf>,
    /// Outcome ledger locations
    pub ledger: LedgerConfig,
    /// Attempt policy
    pub attempt: AttemptConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            fragment_root: PathBuf::from("."),
            marker_prefix: "#pragma GLOBAL_ASM".to_string(),
            segments: SegmentsConfig::default(),
            decompiler: CommandConfig {
                program: "python3".to_string(),
                args: vec!["tools/mips_to_c/m2c.py".to_string()],
            },
            build: CommandConfig {
                program: "make".to_string(),
                args: Vec::new(),
            },
            parser: ParserConfig::default(),
            context_headers: vec![
                PathBuf::from("include/functions.h"),
                PathBuf::from("include/variables.h"),
            ],
            ledger: LedgerConfig::default(),
            attempt: AttemptConfig::default(),
        }
    }
}

/// Fragment config (segment list) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentsConfig {
    /// YAML-like file listing the fragments
    pub config_path: PathBuf,
    /// List section holding the entries
    pub section: String,
    /// Where assembly for `asm` entries lives
    pub asm_dir: PathBuf,
    /// Where source files for `c` entries live
    pub src_dir: PathBuf,
    /// Directory prefix written into generated markers
    pub nonmatchings_dir: String,
    /// Entry attempted when no source file is named
    pub default_address: Option<Address>,
}

impl Default for SegmentsConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("splat.yaml"),
            section: "subsegments".to_string(),
            asm_dir: PathBuf::from("asm"),
            src_dir: PathBuf::from("src"),
            nonmatchings_dir: "asm/nonmatchings".to_string(),
            default_address: None,
        }
    }
}

/// An external program plus its leading arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Structural parser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Parser binary (clang)
    pub program: String,
    /// Language standard for the strict profile
    pub std: String,
    /// Include search paths for the strict profile
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor defines for the strict profile
    pub defines: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            program: "clang".to_string(),
            std: "c11".to_string(),
            include_dirs: vec![
                PathBuf::from("."),
                PathBuf::from("include/2.0L"),
                PathBuf::from("include"),
                PathBuf::from("include/libc"),
            ],
            defines: vec!["_LANGUAGE_C".to_string()],
        }
    }
}

/// Outcome ledger locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub success_path: PathBuf,
    pub failure_path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            success_path: PathBuf::from("autodecomp_success.json"),
            failure_path: PathBuf::from("autodecomp_failure.json"),
        }
    }
}

/// Attempt policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttemptConfig {
    /// Keep a verified splice instead of restoring the backup
    pub commit_on_success: bool,
    /// Type substituted for `?` placeholders in decompiler output
    pub unknown_type_fallback: Option<String>,
}

impl Default for AttemptConfig {
    fn default() -> Self {
        Self {
            commit_on_success: true,
            unknown_type_fallback: Some("s32".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| crate::Error::invalid_format(e.to_string()))
    }

    /// Load configuration, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| crate::Error::invalid_format(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve a path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn fragment_root(&self) -> PathBuf {
        self.resolve(&self.fragment_root)
    }

    pub fn segments_path(&self) -> PathBuf {
        self.resolve(&self.segments.config_path)
    }

    pub fn context_headers(&self) -> Vec<PathBuf> {
        self.context_headers.iter().map(|p| self.resolve(p)).collect()
    }

    pub fn success_ledger(&self) -> PathBuf {
        self.resolve(&self.ledger.success_path)
    }

    pub fn failure_ledger(&self) -> PathBuf {
        self.resolve(&self.ledger.failure_path)
    }
}
