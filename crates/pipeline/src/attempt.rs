//! Scoped backup of the file under mutation

use autodecomp_core::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, error, info};

/// Exclusive snapshot of one source file for the length of one attempt
///
/// The file is restored from the snapshot when the guard is dropped, unless
/// the attempt was committed or already restored. The snapshot directory is
/// deleted on every path.
pub struct Attempt {
    file: PathBuf,
    scratch: TempDir,
    backup: PathBuf,
    settled: bool,
}

impl Attempt {
    /// Snapshot `file` into a fresh temporary directory
    pub fn begin(file: &Path) -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("autodecomp-").tempdir()?;
        let backup = scratch.path().join("backup");
        std::fs::copy(file, &backup)?;
        debug!("Backed up {:?} to {:?}", file, backup);

        Ok(Self {
            file: file.to_path_buf(),
            scratch,
            backup,
            settled: false,
        })
    }

    /// Private working directory, deleted with the guard
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Keep the file as it is now
    pub fn commit(mut self) {
        self.settled = true;
        info!("Keeping changes to {:?}", self.file);
    }

    /// Put the snapshot back over the file
    pub fn restore(mut self) -> Result<()> {
        self.copy_back()?;
        self.settled = true;
        Ok(())
    }

    fn copy_back(&self) -> Result<()> {
        std::fs::copy(&self.backup, &self.file)?;
        info!("Restored {:?}", self.file);
        Ok(())
    }
}

impl Drop for Attempt {
    fn drop(&mut self) {
        if !self.settled {
            if let Err(e) = self.copy_back() {
                error!("Could not restore {:?}: {}", self.file, e);
            }
        }
    }
}
