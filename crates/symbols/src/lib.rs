//! Symbol extraction and reconciliation
//!
//! Declared variables are enumerated by running clang's JSON AST dump over a
//! file. Comparing the declarations before and after a splice finds the ones
//! the splice introduced, which are then commented out in place.

pub mod ast;
pub mod extractor;
pub mod reconcile;

pub use extractor::{ClangExtractor, ParseProfile, SymbolSource};
pub use reconcile::{neutralize, reconcile};
