//! Error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Capacity exceeded: {count} {what}, limit is {max}")]
    CapacityExceeded {
        what: &'static str,
        count: usize,
        max: usize,
    },

    #[error("Parse error at line {line}: {text:?}")]
    Parse { line: usize, text: String },

    #[error("Invalid prefix length {len} (address width is {max} bits)")]
    InvalidPrefix { len: u8, max: u32 },

    #[error("Invalid compile parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid trie file: {0}")]
    Format(#[from] FormatError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Reasons a compiled trie stream is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("bad magic {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unsupported version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("address family mismatch: file is v{found}, trie is v{expected}")]
    FamilyMismatch { found: u8, expected: u8 },

    #[error("truncated: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("{0} trailing bytes after trie data")]
    TrailingBytes(usize),

    #[error("{what} count {count} exceeds limit {max}")]
    TooLarge {
        what: &'static str,
        count: usize,
        max: usize,
    },

    #[error("base entry {index} has prefix length {len} (max {max})")]
    BadPrefixLength { index: usize, len: u8, max: u32 },

    #[error("node {index} is invalid: {reason}")]
    BadNode { index: usize, reason: &'static str },

    #[error("invalid compile parameters in file: {0}")]
    BadParams(String),
}

pub type Result<T> = std::result::Result<T, Error>;
