//! Compiled LC-trie and membership search

use std::sync::OnceLock;
use std::time::Instant;

use crate::address::BitString;
use crate::compiler::{compile, Compiled};
use crate::config::CompileParams;
use crate::node::Node;
use crate::prefix::PrefixEntry;
use crate::stats::{TrieStats, EMPTY_STATS};
use crate::Result;

/// Set-membership LC-trie over prefixes of address type `A`.
///
/// Built once (or loaded from disk), then queried read-only. `search` and
/// `stats` take `&self` and may be called from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct LcTrie<A> {
    pub(crate) nodes: Vec<Node>,
    pub(crate) base: Vec<PrefixEntry<A>>,
    pub(crate) params: CompileParams,
    pub(crate) cached_stats: OnceLock<String>,
}

impl<A: BitString> LcTrie<A> {
    /// Empty trie with default compile parameters
    pub fn new() -> Self {
        Self::with_params(CompileParams::default())
    }

    /// Empty trie that will be built with `params`
    pub fn with_params(params: CompileParams) -> Self {
        Self {
            nodes: Vec::new(),
            base: Vec::new(),
            params,
            cached_stats: OnceLock::new(),
        }
    }

    /// Compile `entries` into this trie, replacing its contents.
    ///
    /// `entries` is sorted in place. On error the trie is unchanged.
    pub fn build(&mut self, entries: &mut [PrefixEntry<A>]) -> Result<()> {
        let start = Instant::now();
        let input = entries.len();

        let Compiled { nodes, base } = compile(entries, &self.params)?;
        self.install(nodes, base, self.params);

        tracing::info!(
            input,
            prefixes = self.base.len(),
            nodes = self.nodes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Compiled LC-trie"
        );
        Ok(())
    }

    /// Does `addr` fall inside any stored prefix?
    pub fn search(&self, addr: A) -> bool {
        let Some(&root) = self.nodes.first() else {
            return false;
        };

        let mut node = root;
        let mut pos = node.skip();
        while !node.is_leaf() {
            let branch = node.branch();
            node = self.nodes[node.adr() + addr.extract(pos, branch).to_index()];
            pos += branch + node.skip();
        }

        // descent alone can land on a neighbor's leaf
        self.base[node.adr()].contains(addr)
    }

    /// Cached one-line summary; computed on first call after build/load
    pub fn stats(&self) -> String {
        self.cached_stats
            .get_or_init(|| match self.compute_stats() {
                Some(stats) => stats.to_string(),
                None => EMPTY_STATS.to_string(),
            })
            .clone()
    }

    /// Fresh structured statistics, `None` when empty
    pub fn compute_stats(&self) -> Option<TrieStats> {
        TrieStats::compute(&self.nodes, &self.base, &self.params)
    }

    /// Number of stored prefixes
    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn params(&self) -> &CompileParams {
        &self.params
    }

    /// Packed node array, root first
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Sorted, deduplicated prefixes referenced by the leaves
    pub fn base(&self) -> &[PrefixEntry<A>] {
        &self.base
    }

    /// Swap in new contents and drop the cached stats line
    pub(crate) fn install(&mut self, nodes: Vec<Node>, base: Vec<PrefixEntry<A>>, params: CompileParams) {
        self.nodes = nodes;
        self.base = base;
        self.params = params;
        self.cached_stats = OnceLock::new();
    }
}
