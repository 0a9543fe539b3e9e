//! Success and failure ledgers

use autodecomp_core::{AttemptRecord, Config, Error, Outcome, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Two JSON-array files of attempt records, rewritten in full on every append
#[derive(Debug, Clone)]
pub struct Ledger {
    success: PathBuf,
    failure: PathBuf,
}

impl Ledger {
    pub fn new(success: impl Into<PathBuf>, failure: impl Into<PathBuf>) -> Self {
        Self {
            success: success.into(),
            failure: failure.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.success_ledger(), config.failure_ledger())
    }

    pub fn path(&self, outcome: Outcome) -> &Path {
        match outcome {
            Outcome::Success => &self.success,
            Outcome::Failure => &self.failure,
        }
    }

    /// All records of one ledger, oldest first
    pub fn read(&self, outcome: Outcome) -> Result<Vec<AttemptRecord>> {
        let path = self.path(outcome);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| Error::invalid_format(format!("{}: {}", path.display(), e)))
    }

    /// Append one record to the ledger for `outcome`
    pub fn record(&self, outcome: Outcome, record: &AttemptRecord) -> Result<()> {
        let mut records = self.read(outcome)?;
        records.push(record.clone());

        let path = self.path(outcome);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&records)
            .map_err(|e| Error::invalid_format(e.to_string()))?;
        fs::write(path, content)?;

        debug!("Recorded {:?} #{} in {:?}", outcome, records.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: usize) -> AttemptRecord {
        AttemptRecord {
            owning_file: PathBuf::from("src/game/game_1000.c"),
            trigger_line: line,
            fragment_path: PathBuf::from(format!("asm/nonmatchings/game_1000/func_{}.s", line)),
        }
    }

    #[test]
    fn test_records_in_append_order() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("out/ok.json"), dir.path().join("out/fail.json"));

        let records: Vec<AttemptRecord> = (1..=5).map(record).collect();
        for r in &records {
            ledger.record(Outcome::Success, r).unwrap();
        }

        assert_eq!(ledger.read(Outcome::Success).unwrap(), records);
        assert!(ledger.read(Outcome::Failure).unwrap().is_empty());
        assert!(!ledger.path(Outcome::Failure).exists());
    }

    #[test]
    fn test_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("ok.json"), dir.path().join("fail.json"));
        ledger.record(Outcome::Failure, &record(10)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(ledger.path(Outcome::Failure)).unwrap()).unwrap();
        assert_eq!(value[0]["trigger_line"], 10);
        assert_eq!(value[0]["owning_file"], "src/game/game_1000.c");
        assert_eq!(value[0]["fragment_path"], "asm/nonmatchings/game_1000/func_10.s");
    }

    #[test]
    fn test_corrupt_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("ok.json"), dir.path().join("fail.json"));
        fs::write(ledger.path(Outcome::Success), "[{\"owning_file\":").unwrap();

        assert!(matches!(
            ledger.record(Outcome::Success, &record(1)),
            Err(Error::InvalidFormat(_))
        ));
    }
}
