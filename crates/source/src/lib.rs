//! Source file handling for autodecomp
//!
//! Finds marker lines that reference untranslated fragments and splices
//! generated text over them, one whole-file rewrite at a time.

pub mod marker;
pub mod splice;

pub use marker::MarkerLocator;
pub use splice::{replace_block, replace_line, SourceLines};
