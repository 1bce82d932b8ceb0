//! Compilation parameters

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default minimum node occupancy
pub const DEFAULT_FILL_FACTOR: f64 = 0.5;

/// Largest root branching factor a caller may force (65536 children)
pub const MAX_ROOT_BRANCH: u32 = 16;

/// Parameters controlling trie layout; stored alongside the compiled trie.
///
/// ```json
/// { "fill_factor": 0.5, "root_branching_factor": 16 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileParams {
    /// Minimum fraction of a node's children that must hold distinct entries.
    /// Any positive value is accepted; above 1.0 no node widens past 2-way.
    pub fill_factor: f64,
    /// Forced root branching factor in bits, 0 = computed like any other node
    pub root_branching_factor: u32,
}

impl Default for CompileParams {
    fn default() -> Self {
        Self {
            fill_factor: DEFAULT_FILL_FACTOR,
            root_branching_factor: 0,
        }
    }
}

impl CompileParams {
    pub fn new(fill_factor: f64, root_branching_factor: u32) -> Self {
        Self {
            fill_factor,
            root_branching_factor,
        }
    }

    /// Check the parameters against an address width
    pub fn validate(&self, address_bits: u32) -> Result<()> {
        if !self.fill_factor.is_finite() || self.fill_factor <= 0.0 {
            return Err(Error::InvalidParams(format!(
                "fill_factor must be a positive number, got {}",
                self.fill_factor
            )));
        }
        let max_root = MAX_ROOT_BRANCH.min(address_bits);
        if self.root_branching_factor > max_root {
            return Err(Error::InvalidParams(format!(
                "root_branching_factor must be at most {}, got {}",
                max_root, self.root_branching_factor
            )));
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
