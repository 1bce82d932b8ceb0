//! Trie introspection
//!
//! Summary figures for a compiled trie: sizes, node counts and leaf depth.
//! [`LcTrie::stats`](crate::LcTrie::stats) renders them once per build or
//! load and caches the line.

use std::fmt;
use std::mem::size_of;

use crate::config::CompileParams;
use crate::node::Node;
use crate::prefix::PrefixEntry;

/// Rendered in place of the stats line before anything is built or loaded
pub const EMPTY_STATS: &str = "Empty or not yet compiled";

#[derive(Debug, Clone, PartialEq)]
pub struct TrieStats {
    /// Entries in the base vector
    pub prefixes: usize,
    pub base_bytes: usize,
    pub trie_bytes: usize,
    /// Base vector, node array and compile parameters
    pub total_bytes: usize,
    pub fill_factor: f64,
    /// Branching factor of the root node
    pub root_branch: u32,
    /// Whether `root_branch` was forced by the compile parameters
    pub root_branch_forced: bool,
    pub leaves: usize,
    pub internal: usize,
    pub max_depth: usize,
    pub avg_depth: f64,
}

impl TrieStats {
    /// `None` for an empty trie
    pub fn compute<A>(
        nodes: &[Node],
        base: &[PrefixEntry<A>],
        params: &CompileParams,
    ) -> Option<Self> {
        let root = *nodes.first()?;

        let base_bytes = base.len() * size_of::<PrefixEntry<A>>();
        let trie_bytes = nodes.len() * size_of::<Node>();
        let total_bytes = base_bytes + trie_bytes + size_of::<f64>() + size_of::<u32>();

        let leaves = nodes.iter().filter(|n| n.is_leaf()).count();
        let internal = nodes.len() - leaves;

        let (reached, total_depth, max_depth) = leaf_depths(nodes);
        let avg_depth = if reached == 0 {
            0.0
        } else {
            total_depth as f64 / reached as f64
        };

        let root_branch_forced = params.root_branching_factor > 0;
        let root_branch = if root_branch_forced {
            params.root_branching_factor
        } else {
            root.branch()
        };

        Some(Self {
            prefixes: base.len(),
            base_bytes,
            trie_bytes,
            total_bytes,
            fill_factor: params.fill_factor,
            root_branch,
            root_branch_forced,
            leaves,
            internal,
            max_depth,
            avg_depth,
        })
    }
}

/// Walk every path from the root: (leaves reached, summed depth, max depth)
fn leaf_depths(nodes: &[Node]) -> (usize, usize, usize) {
    let mut reached = 0;
    let mut total = 0;
    let mut max = 0;

    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
    while let Some((idx, depth)) = stack.pop() {
        let node = nodes[idx];
        if node.is_leaf() {
            reached += 1;
            total += depth;
            max = max.max(depth);
            continue;
        }
        let first = node.adr();
        let last = (first + (1 << node.branch())).min(nodes.len());
        for child in first..last {
            stack.push((child, depth + 1));
        }
    }

    (reached, total, max)
}

impl fmt::Display for TrieStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[N {}] ", self.prefixes)?;
        write!(
            f,
            "[basesz {}  triesz {}  totalsz {}] ",
            self.base_bytes, self.trie_bytes, self.total_bytes
        )?;
        write!(
            f,
            "[fill {}  rootbranch {}",
            significant(self.fill_factor),
            self.root_branch
        )?;
        if self.root_branch_forced {
            write!(f, "F")?;
        }
        write!(f, "] ")?;
        write!(f, "[leaves {}  internal {}] ", self.leaves, self.internal)?;
        write!(f, "[dmax {}  davg {}]", self.max_depth, significant(self.avg_depth))
    }
}

/// Six significant digits with trailing zeros dropped (`1.66667`, `0.5`, `2`)
fn significant(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let int_digits = value.abs().log10().floor() as i32 + 1;
    let decimals = (6 - int_digits).max(0) as usize;
    let text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
