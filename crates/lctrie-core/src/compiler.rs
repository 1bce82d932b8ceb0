//! LC-trie compiler
//!
//! Lays a sorted, duplicate-free prefix list out as a flat array of packed
//! nodes (S. Nilsson and G. Karlsson, "Fast address lookup for Internet
//! routers", 1998). Each internal node consumes `branch` bits after skipping
//! `skip` bits its subtree has in common, and owns a contiguous block of
//! `2^branch` children.
//!
//! Every child slot is populated, even for bit patterns no entry has. Such
//! slots point at a neighboring leaf, and a search that lands there is
//! rejected by the final comparison against the stored prefix.

use crate::address::BitString;
use crate::config::CompileParams;
use crate::node::{Node, MAX_NODES};
use crate::prefix::{canonicalize, PrefixEntry};
use crate::{Error, Result};

/// Maximum number of input prefixes. Half the node address space, leaving
/// room for internal nodes in the same array.
pub const MAX_ENTRIES: usize = 1 << 19;

/// Upper bound on a computed (not forced) branching factor
pub const MAX_COMPUTED_BRANCH: u32 = 8;

/// Extra node slots reserved up front beyond `2 * entries`
const PREALLOC_SLACK: usize = 4096;

/// Output of a successful compilation
#[derive(Debug, Clone, Default)]
pub struct Compiled<A> {
    pub nodes: Vec<Node>,
    pub base: Vec<PrefixEntry<A>>,
}

/// Sort and deduplicate `entries`, then build the node array.
///
/// `entries` is left sorted. On error nothing is produced.
pub fn compile<A: BitString>(
    entries: &mut [PrefixEntry<A>],
    params: &CompileParams,
) -> Result<Compiled<A>> {
    if entries.len() > MAX_ENTRIES {
        return Err(Error::CapacityExceeded {
            what: "prefixes",
            count: entries.len(),
            max: MAX_ENTRIES,
        });
    }
    params.validate(A::BITS)?;

    let base = canonicalize(entries)?;
    if base.is_empty() {
        return Ok(Compiled {
            nodes: Vec::new(),
            base: Vec::new(),
        });
    }

    let capacity = (2 * base.len() + PREALLOC_SLACK).min(MAX_NODES);
    let mut builder = Builder {
        base: &base,
        fill_factor: params.fill_factor,
        root_branch: params.root_branching_factor,
        nodes: Vec::with_capacity(capacity),
    };
    // root slot
    builder.nodes.push(Node::default());
    builder.build_recursive(0, 0, base.len(), 0)?;

    let mut nodes = builder.nodes;
    nodes.shrink_to_fit();

    Ok(Compiled { nodes, base })
}

struct Builder<'a, A> {
    base: &'a [PrefixEntry<A>],
    fill_factor: f64,
    root_branch: u32,
    /// `nodes.len()` is the first unreserved slot
    nodes: Vec<Node>,
}

impl<A: BitString> Builder<'_, A> {
    /// Branching factor and new prefix for the subtree over
    /// `base[first..first + n]`, ignoring the leading `prefix` bits.
    ///
    /// Requires `n >= 2` and distinct first/last addresses.
    fn compute_branch(&self, prefix: u32, first: usize, n: usize) -> (u32, u32) {
        let high = self.base[first].addr.remove(prefix);
        let low = self.base[first + n - 1].addr.remove(prefix);
        let mut newprefix = prefix;
        while newprefix < A::BITS && low.extract(newprefix, 1) == high.extract(newprefix, 1) {
            newprefix += 1;
        }

        if n == 2 {
            return (1, newprefix);
        }

        if self.root_branch > 0 && prefix == 0 && first == 0 {
            return (self.root_branch.min(A::BITS - newprefix), newprefix);
        }

        // at least two branches are always possible, so start looking at four
        let mut b = 1;
        loop {
            b += 1;
            let wanted = self.fill_factor * (1u64 << b) as f64;
            if b > MAX_COMPUTED_BRANCH || (n as f64) < wanted || newprefix + b > A::BITS {
                break;
            }
            let occupied = self.count_patterns(newprefix, b, first, n);
            if (occupied as f64) < wanted {
                break;
            }
        }
        (b - 1, newprefix)
    }

    /// Distinct `b`-bit patterns at `pos` within the range. Patterns are
    /// non-decreasing because the range is sorted and shares all bits before
    /// `pos`.
    fn count_patterns(&self, pos: u32, b: u32, first: usize, n: usize) -> usize {
        let mut count = 0;
        let mut prev = None;
        for entry in &self.base[first..first + n] {
            let pat = entry.addr.extract(pos, b);
            if prev != Some(pat) {
                count += 1;
                prev = Some(pat);
            }
        }
        count
    }

    /// Claim `count` contiguous slots and return the first index
    fn reserve(&mut self, count: usize) -> Result<usize> {
        let adr = self.nodes.len();
        let next = adr + count;
        if next > MAX_NODES {
            return Err(Error::CapacityExceeded {
                what: "trie nodes",
                count: next,
                max: MAX_NODES,
            });
        }
        self.nodes.resize(next, Node::default());
        Ok(adr)
    }

    /// Build the subtree for `base[first..first + n]` rooted at `pos`
    fn build_recursive(&mut self, prefix: u32, first: usize, n: usize, pos: usize) -> Result<()> {
        if n == 1 {
            self.nodes[pos] = Node::leaf(first as u32);
            return Ok(());
        }

        let (branch, newprefix) = self.compute_branch(prefix, first, n);
        let width = 1usize << branch;
        let adr = self.reserve(width)?;
        self.nodes[pos] = Node::internal(branch, newprefix - prefix, adr as u32);

        let end = first + n;
        let child_prefix = newprefix + branch;
        let mut p = first;
        // slots below this already hold a replicated short prefix
        let mut replicated_until = 0;

        for bitpat in 0..width {
            let mut k = 0;
            while p + k < end && self.base[p + k].addr.extract(newprefix, branch).to_index() == bitpat {
                k += 1;
            }

            if k == 0 {
                if bitpat >= replicated_until {
                    let neighbor = if p == end { p - 1 } else { p };
                    self.build_recursive(child_prefix, neighbor, 1, adr + bitpat)?;
                }
            } else if k == 1 && (self.base[p].len as u32) < child_prefix {
                // short prefix: it matches every pattern sharing its leading bits
                let bits = child_prefix - self.base[p].len as u32;
                let stop = if bits >= branch {
                    width
                } else {
                    (bitpat + (1 << bits)).min(width)
                };
                for i in bitpat..stop {
                    self.build_recursive(child_prefix, p, 1, adr + i)?;
                }
                replicated_until = stop;
            } else {
                self.build_recursive(child_prefix, p, k, adr + bitpat)?;
            }

            p += k;
        }

        Ok(())
    }
}
