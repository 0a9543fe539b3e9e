//! Attempt pipeline for autodecomp
//!
//! Drives one fragment at a time through rebuild, decompile, splice,
//! reconcile and verifying rebuild, restoring the source file whenever a step
//! fails, and records every outcome in the success or failure ledger.

pub mod attempt;
pub mod build;
pub mod decompile;
pub mod ledger;
pub mod orchestrator;

pub use attempt::Attempt;
pub use build::{BuildSystem, CommandBuild};
pub use decompile::{clean_output, CommandDecompiler, Decompiler};
pub use ledger::Ledger;
pub use orchestrator::{AttemptReport, Orchestrator};
