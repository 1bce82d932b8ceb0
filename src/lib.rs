//! lctrie: LC-trie prefix membership index
//!
//! Re-exports the core library; the `lctrie` binary lives in `crates/lctrie-cli`.

pub use lctrie_core::*;
