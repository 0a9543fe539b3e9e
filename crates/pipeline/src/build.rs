//! External build invocation

use autodecomp_core::config::CommandConfig;
use autodecomp_core::{Error, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// Lines of build stderr kept in a `BuildFailed` error
const STDERR_TAIL: usize = 40;

/// Builds the whole project
pub trait BuildSystem {
    fn build(&self) -> Result<()>;
}

/// Build run as a subprocess in the project root
#[derive(Debug, Clone)]
pub struct CommandBuild {
    command: CommandConfig,
    working_dir: PathBuf,
}

impl CommandBuild {
    pub fn new(command: CommandConfig, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            command,
            working_dir: working_dir.into(),
        }
    }
}

impl BuildSystem for CommandBuild {
    fn build(&self) -> Result<()> {
        info!("Building with {} {}", self.command.program, self.command.args.join(" "));
        let output = Command::new(&self.command.program)
            .args(&self.command.args)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| Error::build_failed("not started", e.to_string()))?;

        if output.status.success() {
            debug!("Build succeeded");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL)..].join("\n");
        Err(Error::build_failed(output.status, tail))
    }
}
