//! Attempt orchestration
//!
//! One attempt runs `CLEAN -> DECOMPILING -> SPLICED -> RECONCILED -> VERIFIED`
//! and then either commits or restores per policy. Any error after the
//! initial rebuild moves it to `FAILED`, restores the snapshot and rebuilds
//! (`RESTORED`). Only two errors escape an attempt: a failing initial
//! rebuild, and a failing rebuild after restoring, since in both cases the
//! project is in a state no later attempt can start from.

use crate::attempt::Attempt;
use crate::build::{BuildSystem, CommandBuild};
use crate::decompile::{clean_output, CommandDecompiler, Decompiler};
use crate::ledger::Ledger;
use autodecomp_core::config::AttemptConfig;
use autodecomp_core::{
    AttemptEvent, AttemptRecord, AttemptState, Config, EventBus, Marker, Outcome, Result, Symbol,
};
use autodecomp_source::{replace_block, MarkerLocator};
use autodecomp_symbols::{neutralize, reconcile, ClangExtractor, ParseProfile, SymbolSource};
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Result of one attempt that ran to completion
#[derive(Debug, Clone)]
pub struct AttemptReport {
    pub id: Uuid,
    pub marker: Marker,
    pub outcome: Outcome,
    /// Error that failed the attempt
    pub reason: Option<String>,
    /// Declaration lines commented out by reconciliation
    pub removed_declarations: usize,
    pub final_state: AttemptState,
}

impl AttemptReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// Drives fragment attempts against one project checkout
pub struct Orchestrator {
    locator: MarkerLocator,
    decompiler: Box<dyn Decompiler>,
    build: Box<dyn BuildSystem>,
    symbols: Box<dyn SymbolSource>,
    ledger: Ledger,
    context_headers: Vec<PathBuf>,
    policy: AttemptConfig,
    events: EventBus,
}

impl Orchestrator {
    /// Orchestrator using the external tools named in `config`
    pub fn new(config: &Config) -> Self {
        let root = config.resolve(Path::new("."));
        Self::with_tools(
            config,
            Box::new(CommandDecompiler::new(config.decompiler.clone(), root.clone())),
            Box::new(CommandBuild::new(config.build.clone(), root)),
            Box::new(ClangExtractor::from_config(config)),
        )
    }

    pub fn with_tools(
        config: &Config,
        decompiler: Box<dyn Decompiler>,
        build: Box<dyn BuildSystem>,
        symbols: Box<dyn SymbolSource>,
    ) -> Self {
        Self {
            locator: MarkerLocator::new(config.marker_prefix.clone(), config.fragment_root()),
            decompiler,
            build,
            symbols,
            ledger: Ledger::from_config(config),
            context_headers: config.context_headers(),
            policy: config.attempt.clone(),
            events: EventBus::new(),
        }
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn locator(&self) -> &MarkerLocator {
        &self.locator
    }

    /// Attempt every marker of `file`, one after another
    ///
    /// Markers are re-read after each attempt because a kept splice moves the
    /// ones below it; a fragment is attempted at most once per call.
    pub fn run_file(&self, file: &Path) -> Result<Vec<AttemptReport>> {
        let mut attempted = HashSet::new();
        let mut reports = Vec::new();

        loop {
            let next = self
                .locator
                .locate(file)?
                .into_iter()
                .find(|marker| !attempted.contains(&marker.fragment));
            let Some(marker) = next else {
                break;
            };
            attempted.insert(marker.fragment.clone());
            reports.push(self.attempt(&marker)?);
        }

        let succeeded = reports.iter().filter(|r| r.succeeded()).count();
        info!(
            "{}: {} of {} attempts succeeded",
            file.display(),
            succeeded,
            reports.len()
        );
        Ok(reports)
    }

    /// Run one attempt for `marker`
    pub fn attempt(&self, marker: &Marker) -> Result<AttemptReport> {
        let id = Uuid::new_v4();
        self.events.emit(AttemptEvent::Started {
            attempt: id,
            marker: marker.clone(),
            at: Utc::now(),
        });
        info!(
            "Attempting {} at {}:{}",
            marker.fragment.display(),
            marker.file.display(),
            marker.line
        );

        // A clean starting state also regenerates stale fragments
        self.build.build().map_err(|e| {
            error!("Initial build failed before {}: {}", marker.fragment.display(), e);
            e
        })?;
        self.transition(id, AttemptState::Clean);

        let guard = Attempt::begin(&marker.file)?;
        let record = AttemptRecord::from(marker);

        match self.splice_and_verify(id, marker, &guard) {
            Ok(removed) => {
                self.transition(id, AttemptState::Verified);
                let final_state = if self.policy.commit_on_success {
                    guard.commit();
                    AttemptState::Committed
                } else {
                    guard.restore()?;
                    self.build.build()?;
                    AttemptState::Restored
                };
                self.transition(id, final_state);

                self.ledger.record(Outcome::Success, &record)?;
                info!("{} verified", marker.fragment.display());
                Ok(self.finish(id, marker, Outcome::Success, None, removed, final_state))
            }
            Err(err) => {
                error!(
                    "Attempt on {} ({}:{}) failed: {}",
                    marker.fragment.display(),
                    marker.file.display(),
                    marker.line,
                    err
                );
                self.transition(id, AttemptState::Failed);

                guard.restore()?;
                let recovery = self.build.build();
                self.ledger.record(Outcome::Failure, &record)?;

                if let Err(rebuild) = recovery {
                    error!(
                        "Rebuild after restoring {} failed, project state unknown: {}",
                        marker.file.display(),
                        rebuild
                    );
                    self.finish(id, marker, Outcome::Failure, Some(err.to_string()), 0, AttemptState::Failed);
                    return Err(rebuild);
                }

                self.transition(id, AttemptState::Restored);
                Ok(self.finish(
                    id,
                    marker,
                    Outcome::Failure,
                    Some(err.to_string()),
                    0,
                    AttemptState::Restored,
                ))
            }
        }
    }

    /// Steps from decompiling through the verifying rebuild; errors here are rolled back
    fn splice_and_verify(&self, id: Uuid, marker: &Marker, guard: &Attempt) -> Result<usize> {
        self.transition(id, AttemptState::Decompiling);
        let raw = self.decompiler.decompile(&marker.fragment)?;
        let body = clean_output(&raw, self.policy.unknown_type_fallback.as_deref());
        self.inspect_fragment(&body, guard);

        let pre = self.symbols.extract(&marker.file, ParseProfile::Strict)?;

        let block: Vec<&str> = body.lines().collect();
        replace_block(&marker.file, marker.line, &block)?;
        self.transition(id, AttemptState::Spliced);

        let post = self.symbols.extract(&marker.file, ParseProfile::Strict)?;
        let context = self.context_symbols()?;
        let candidates = reconcile(&pre, &post, &context);
        let removed = neutralize(&marker.file, &candidates)?;
        self.transition(id, AttemptState::Reconciled);

        self.build.build()?;
        Ok(removed)
    }

    /// Log what the raw fragment declares; never fails the attempt
    fn inspect_fragment(&self, body: &str, guard: &Attempt) {
        let emitted = guard.scratch_dir().join("fragment.c");
        let declared = std::fs::write(&emitted, body)
            .map_err(Into::into)
            .and_then(|_| self.symbols.extract(&emitted, ParseProfile::Permissive));
        match declared {
            Ok(symbols) => {
                for symbol in &symbols {
                    debug!("fragment declares {}", symbol);
                }
            }
            Err(e) => warn!("Could not parse decompiled fragment: {}", e),
        }
    }

    fn context_symbols(&self) -> Result<Vec<Symbol>> {
        let headers: Vec<PathBuf> = self
            .context_headers
            .iter()
            .filter(|header| {
                let exists = header.exists();
                if !exists {
                    warn!("Context header {:?} does not exist", header);
                }
                exists
            })
            .cloned()
            .collect();
        self.symbols.extract_all(&headers, ParseProfile::Strict)
    }

    fn transition(&self, id: Uuid, state: AttemptState) {
        debug!("Attempt {} -> {}", id, state);
        self.events.emit(AttemptEvent::StateChanged {
            attempt: id,
            state,
            at: Utc::now(),
        });
    }

    fn finish(
        &self,
        id: Uuid,
        marker: &Marker,
        outcome: Outcome,
        reason: Option<String>,
        removed_declarations: usize,
        final_state: AttemptState,
    ) -> AttemptReport {
        self.events.emit(AttemptEvent::Finished {
            attempt: id,
            outcome,
            reason: reason.clone(),
            at: Utc::now(),
        });
        AttemptReport {
            id,
            marker: marker.clone(),
            outcome,
            reason,
            removed_declarations,
            final_state,
        }
    }
}
