//! Compiled trie file format
//!
//! A compiled trie is stored as a zstd stream wrapping this layout
//! (integers little-endian, addresses big-endian):
//!
//! ```text
//! [magic "LCTR":4][version:2][family:1][reserved:1][node_count:4][base_count:4]
//! [node:4 * node_count]
//! [address:W/8 + len:1] * base_count
//! [fill_factor:f64][root_branching_factor:4]
//! ```
//!
//! Decoding validates the node structure: every index stays in bounds and
//! every non-root node has exactly one parent, so neither `search` nor the
//! stats traversal can misbehave on a loaded trie.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Instant;

use crate::address::BitString;
use crate::compiler::MAX_ENTRIES;
use crate::config::CompileParams;
use crate::error::FormatError;
use crate::node::{Node, MAX_NODES};
use crate::prefix::PrefixEntry;
use crate::trie::LcTrie;
use crate::Result;

pub const MAGIC: [u8; 4] = *b"LCTR";
pub const VERSION: u16 = 1;
pub const HEADER_SIZE: usize = 16;
const TRAILER_SIZE: usize = 12;

/// zstd level used for saved tries
pub const COMPRESSION_LEVEL: i32 = 19;

/// Fixed-size file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieHeader {
    pub version: u16,
    pub family: u8,
    pub node_count: u32,
    pub base_count: u32,
}

impl TrieHeader {
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6] = self.family;
        buf[7] = 0;
        buf[8..12].copy_from_slice(&self.node_count.to_le_bytes());
        buf[12..16].copy_from_slice(&self.base_count.to_le_bytes());
        buf
    }

    pub fn from_bytes(data: &[u8]) -> std::result::Result<Self, FormatError> {
        if data.len() < HEADER_SIZE {
            return Err(FormatError::Truncated {
                needed: HEADER_SIZE,
                actual: data.len(),
            });
        }
        let magic: [u8; 4] = [data[0], data[1], data[2], data[3]];
        if magic != MAGIC {
            return Err(FormatError::BadMagic(magic));
        }
        let version = u16::from_le_bytes([data[4], data[5]]);
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: version,
                expected: VERSION,
            });
        }
        Ok(Self {
            version,
            family: data[6],
            node_count: read_u32(data, 8),
            base_count: read_u32(data, 12),
        })
    }
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

impl<A: BitString> LcTrie<A> {
    /// Serialize to bytes (uncompressed)
    pub fn to_bytes(&self) -> Vec<u8> {
        let entry_size = A::BYTES + 1;
        let mut data = Vec::with_capacity(
            HEADER_SIZE + self.nodes.len() * 4 + self.base.len() * entry_size + TRAILER_SIZE,
        );

        let header = TrieHeader {
            version: VERSION,
            family: A::FAMILY,
            node_count: self.nodes.len() as u32,
            base_count: self.base.len() as u32,
        };
        data.extend_from_slice(&header.to_bytes());

        for node in &self.nodes {
            data.extend_from_slice(&node.raw().to_le_bytes());
        }
        for entry in &self.base {
            entry.addr.write_be(&mut data);
            data.push(entry.len);
        }
        data.extend_from_slice(&self.params.fill_factor.to_le_bytes());
        data.extend_from_slice(&self.params.root_branching_factor.to_le_bytes());
        data
    }

    /// Decode and validate bytes produced by [`to_bytes`](Self::to_bytes)
    pub fn from_bytes(data: &[u8]) -> std::result::Result<Self, FormatError> {
        let header = TrieHeader::from_bytes(data)?;
        if header.family != A::FAMILY {
            return Err(FormatError::FamilyMismatch {
                found: header.family,
                expected: A::FAMILY,
            });
        }

        let node_count = header.node_count as usize;
        let base_count = header.base_count as usize;
        if node_count > MAX_NODES {
            return Err(FormatError::TooLarge {
                what: "node",
                count: node_count,
                max: MAX_NODES,
            });
        }
        if base_count > MAX_ENTRIES {
            return Err(FormatError::TooLarge {
                what: "base entry",
                count: base_count,
                max: MAX_ENTRIES,
            });
        }

        let entry_size = A::BYTES + 1;
        let expected = HEADER_SIZE + node_count * 4 + base_count * entry_size + TRAILER_SIZE;
        if data.len() < expected {
            return Err(FormatError::Truncated {
                needed: expected,
                actual: data.len(),
            });
        }
        if data.len() > expected {
            return Err(FormatError::TrailingBytes(data.len() - expected));
        }

        let mut offset = HEADER_SIZE;
        let nodes: Vec<Node> = data[offset..offset + node_count * 4]
            .chunks_exact(4)
            .map(|c| Node::from_raw(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect();
        offset += node_count * 4;

        let mut base = Vec::with_capacity(base_count);
        for (index, chunk) in data[offset..offset + base_count * entry_size]
            .chunks_exact(entry_size)
            .enumerate()
        {
            let len = chunk[A::BYTES];
            if len as u32 > A::BITS {
                return Err(FormatError::BadPrefixLength {
                    index,
                    len,
                    max: A::BITS,
                });
            }
            base.push(PrefixEntry::new(A::read_be(&chunk[..A::BYTES]), len));
        }
        offset += base_count * entry_size;

        let mut ff = [0u8; 8];
        ff.copy_from_slice(&data[offset..offset + 8]);
        let params = CompileParams {
            fill_factor: f64::from_le_bytes(ff),
            root_branching_factor: read_u32(data, offset + 8),
        };
        params
            .validate(A::BITS)
            .map_err(|e| FormatError::BadParams(e.to_string()))?;

        validate_structure(&nodes, base.len())?;

        let mut trie = LcTrie::with_params(params);
        trie.install(nodes, base, params);
        Ok(trie)
    }

    /// Serialize to zstd-compressed bytes
    pub fn to_compressed(&self) -> Result<Vec<u8>> {
        let data = self.to_bytes();
        Ok(zstd::encode_all(&data[..], COMPRESSION_LEVEL)?)
    }

    /// Decode zstd-compressed bytes
    pub fn from_compressed(data: &[u8]) -> Result<Self> {
        let mut decoder = zstd::Decoder::new(data)?;
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;
        Ok(Self::from_bytes(&decompressed)?)
    }

    /// Write the compiled trie to `path` through a zstd stream
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let data = self.to_bytes();

        let file = File::create(path)?;
        let mut encoder = zstd::Encoder::new(BufWriter::new(file), COMPRESSION_LEVEL)?;
        encoder.write_all(&data)?;
        let mut writer = encoder.finish()?;
        writer.flush()?;

        tracing::info!(
            path = %path.display(),
            prefixes = self.base.len(),
            nodes = self.nodes.len(),
            uncompressed = data.len(),
            "Saved LC-trie"
        );
        Ok(())
    }

    /// Replace this trie with the one stored at `path`.
    ///
    /// The file is fully decoded and validated before anything is replaced;
    /// on error the trie keeps its previous contents.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let loaded = Self::open(path)?;
        *self = loaded;
        Ok(())
    }

    /// Read a compiled trie from `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let start = Instant::now();

        let file = File::open(path)?;
        let mut decoder = zstd::Decoder::new(BufReader::new(file))?;
        let mut data = Vec::new();
        decoder.read_to_end(&mut data)?;

        let trie = Self::from_bytes(&data).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Rejected LC-trie file");
            e
        })?;

        tracing::info!(
            path = %path.display(),
            prefixes = trie.base.len(),
            nodes = trie.nodes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded LC-trie"
        );
        Ok(trie)
    }
}

/// Check every node points inside the arrays and the nodes form a tree:
/// each non-root slot belongs to exactly one parent's child block.
fn validate_structure(nodes: &[Node], base_len: usize) -> std::result::Result<(), FormatError> {
    if nodes.is_empty() != (base_len == 0) {
        return Err(FormatError::BadNode {
            index: 0,
            reason: "node array and base vector must be both empty or both non-empty",
        });
    }

    let mut claimed = vec![false; nodes.len()];
    for (index, node) in nodes.iter().enumerate() {
        if node.is_leaf() {
            if node.adr() >= base_len {
                return Err(FormatError::BadNode {
                    index,
                    reason: "leaf points past the base vector",
                });
            }
        } else {
            let end = node.adr() + (1usize << node.branch());
            if node.adr() <= index || end > nodes.len() {
                return Err(FormatError::BadNode {
                    index,
                    reason: "children outside the node array",
                });
            }
            for child in node.adr()..end {
                if claimed[child] {
                    return Err(FormatError::BadNode {
                        index: child,
                        reason: "node has more than one parent",
                    });
                }
                claimed[child] = true;
            }
        }
    }

    if let Some(index) = claimed.iter().skip(1).position(|c| !c) {
        return Err(FormatError::BadNode {
            index: index + 1,
            reason: "node unreachable from the root",
        });
    }
    Ok(())
}
