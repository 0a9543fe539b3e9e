//! Core types and traits for autodecomp
//!
//! This crate provides the foundational types used throughout the pipeline.

pub mod error;
pub mod types;
pub mod config;
pub mod events;

pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use events::{AttemptEvent, AttemptState, EventBus};
