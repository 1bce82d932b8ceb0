//! lctrie-core: Level-compressed trie for IP prefix membership
//!
//! Compiles a list of IPv4 or IPv6 prefixes into a flat array of packed
//! nodes and answers "is this address covered by any prefix?" in a few
//! array reads:
//! - Compile: sort, canonicalize, lay out the LC-trie
//! - Search: descend by extracted bit fields, confirm against the stored prefix
//! - Persist: versioned binary layout inside a zstd stream
//!
//! ## Example
//!
//! ```
//! use lctrie_core::{parse_prefix, BitString, Ipv4Bits, Ipv4Trie};
//!
//! let mut entries = vec![
//!     parse_prefix("10.0.0.0/8").unwrap(),
//!     parse_prefix("10.1.0.0/16").unwrap(),
//! ];
//! let mut trie = Ipv4Trie::new();
//! trie.build(&mut entries).unwrap();
//!
//! assert!(trie.search(Ipv4Bits::parse("10.1.2.3").unwrap()));
//! assert!(!trie.search(Ipv4Bits::parse("11.0.0.0").unwrap()));
//! ```
//!
//! `search` answers membership only: with overlapping prefixes it reports
//! that some prefix matched, not which one is longest.

pub mod address;
pub mod compiler;
mod config;
mod error;
pub mod format;
mod loader;
pub mod node;
mod prefix;
mod shared;
mod stats;
mod trie;

pub use address::{BitString, Ipv4Bits, Ipv6Bits};
pub use compiler::{MAX_COMPUTED_BRANCH, MAX_ENTRIES};
pub use config::{CompileParams, DEFAULT_FILL_FACTOR, MAX_ROOT_BRANCH};
pub use error::{Error, FormatError, Result};
pub use loader::{compile_from_file, parse_address_list, parse_prefix_list};
pub use node::Node;
pub use prefix::{canonicalize, parse_prefix, PrefixEntry};
pub use shared::SharedTrie;
pub use stats::{TrieStats, EMPTY_STATS};
pub use trie::LcTrie;

pub type Ipv4Trie = LcTrie<Ipv4Bits>;
pub type Ipv6Trie = LcTrie<Ipv6Bits>;
