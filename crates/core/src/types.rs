//! Common types used throughout the pipeline

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use std::str::FromStr;

/// ROM address of a fragment (hex or decimal in the fragment config)
///
/// Serialized as its `0x`-prefixed hex form; deserializes from that form, a
/// decimal string, or a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub u64);

impl Address {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Upper-case hex without prefix, as used in derived symbol names
    pub fn to_hex_name(&self) -> String {
        format!("{:X}", self.0)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self(value as u64)
    }
}

impl FromStr for Address {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        };
        parsed
            .map(Address)
            .map_err(|_| crate::Error::invalid_format(format!("bad address `{}`", s)))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AddressVisitor;

        impl<'de> Visitor<'de> for AddressVisitor {
            type Value = Address;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an address such as \"0x1E34C0\" or a non-negative integer")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Address, E> {
                Ok(Address(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Address, E> {
                u64::try_from(value)
                    .map(Address)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Address, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AddressVisitor)
    }
}

/// An in-source placeholder pointing at a fragment not yet translated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Source file containing the marker
    pub file: PathBuf,
    /// 1-based line number of the marker
    pub line: usize,
    /// Referenced fragment, resolved against the fragment root
    pub fragment: PathBuf,
}

/// Kind tag of a fragment config entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FragmentKind {
    /// Assembly only (`asm`)
    Asm,
    /// Source file with generated stubs (`c`)
    C,
    Other(String),
}

impl FragmentKind {
    pub fn as_str(&self) -> &str {
        match self {
            FragmentKind::Asm => "asm",
            FragmentKind::C => "c",
            FragmentKind::Other(tag) => tag,
        }
    }
}

impl From<&str> for FragmentKind {
    fn from(tag: &str) -> Self {
        match tag {
            "asm" => FragmentKind::Asm,
            "c" => FragmentKind::C,
            other => FragmentKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One list item of the fragment config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentEntry {
    pub address: Address,
    pub kind: FragmentKind,
    pub name: Option<String>,
    /// 1-based line in the config at scan time
    pub line: usize,
    /// Line text without its terminator
    pub raw: String,
    /// Name of the enclosing build segment, if one was declared
    pub segment: Option<String>,
}

impl FragmentEntry {
    /// `<segment>_<HEX>` name given to an entry once it becomes a source file
    pub fn derived_name(&self) -> Option<String> {
        self.segment
            .as_ref()
            .map(|segment| format!("{}_{}", segment, self.address.to_hex_name()))
    }
}

/// Storage class of a declared variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageClass {
    Extern,
    Definition,
}

/// A declared variable found by the symbol extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub type_name: String,
    pub line: usize,
    pub storage: StorageClass,
}

impl Symbol {
    pub fn is_extern(&self) -> bool {
        self.storage == StorageClass::Extern
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) - Line {} - extern: {}",
            self.name,
            self.type_name,
            self.line,
            self.is_extern()
        )
    }
}

/// Ledger entry for one attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub owning_file: PathBuf,
    pub trigger_line: usize,
    pub fragment_path: PathBuf,
}

impl From<&Marker> for AttemptRecord {
    fn from(marker: &Marker) -> Self {
        Self {
            owning_file: marker.file.clone(),
            trigger_line: marker.line,
            fragment_path: marker.fragment.clone(),
        }
    }
}

/// Which ledger an attempt lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
}
