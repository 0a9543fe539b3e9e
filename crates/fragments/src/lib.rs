//! Fragment config handling
//!
//! The fragment config is a YAML-like list of `[address, kind, name]` items.
//! It is read and rewritten as flat text so that every line other than the
//! edited one keeps its exact bytes.

pub mod segments;
pub mod stub;

pub use segments::{find_entries, find_entry, rewrite_entry_kind, scan_entries};
pub use stub::{functions_in_asm, generate_stub, promote_entry};
