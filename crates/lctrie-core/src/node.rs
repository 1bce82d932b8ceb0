//! Packed trie node
//!
//! Layout of the 32-bit word:
//!
//! ```text
//!  31    27 26      20 19                 0
//! [ branch ][  skip   ][      address       ]
//!   5 bits    7 bits         20 bits
//! ```
//!
//! - `branch == 0`: leaf; `address` indexes the base vector
//! - `branch > 0`: internal; `2^branch` children start at node `address`

/// Bits in the address field
pub const ADR_BITS: u32 = 20;
/// Largest value a skip field can hold
pub const MAX_SKIP: u32 = 127;
/// Largest value a branch field can hold
pub const MAX_BRANCH_FIELD: u32 = 31;
/// Node array slots addressable by the address field
pub const MAX_NODES: usize = 1 << ADR_BITS;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Node(u32);

impl Node {
    const BRANCH_SHIFT: u32 = 27;
    const SKIP_SHIFT: u32 = 20;
    const SKIP_MASK: u32 = 0x7f;
    const ADR_MASK: u32 = (1 << ADR_BITS) - 1;

    #[inline]
    pub fn leaf(base_index: u32) -> Self {
        debug_assert!(base_index <= Self::ADR_MASK);
        Self(base_index & Self::ADR_MASK)
    }

    #[inline]
    pub fn internal(branch: u32, skip: u32, adr: u32) -> Self {
        debug_assert!(branch > 0 && branch <= MAX_BRANCH_FIELD);
        debug_assert!(skip <= MAX_SKIP);
        debug_assert!(adr <= Self::ADR_MASK);
        Self(
            (branch << Self::BRANCH_SHIFT)
                | ((skip & Self::SKIP_MASK) << Self::SKIP_SHIFT)
                | (adr & Self::ADR_MASK),
        )
    }

    #[inline]
    pub fn branch(self) -> u32 {
        self.0 >> Self::BRANCH_SHIFT
    }

    #[inline]
    pub fn skip(self) -> u32 {
        (self.0 >> Self::SKIP_SHIFT) & Self::SKIP_MASK
    }

    #[inline]
    pub fn adr(self) -> usize {
        (self.0 & Self::ADR_MASK) as usize
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        self.branch() == 0
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_leaf() {
            write!(f, "Leaf(base={})", self.adr())
        } else {
            write!(
                f,
                "Internal(branch={}, skip={}, adr={})",
                self.branch(),
                self.skip(),
                self.adr()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_fields() {
        let n = Node::leaf(12345);
        assert!(n.is_leaf());
        assert_eq!(n.branch(), 0);
        assert_eq!(n.skip(), 0);
        assert_eq!(n.adr(), 12345);
        assert_eq!(n.raw(), 12345);
    }

    #[test]
    fn test_internal_fields_at_limits() {
        let n = Node::internal(MAX_BRANCH_FIELD, MAX_SKIP, (1 << ADR_BITS) - 1);
        assert!(!n.is_leaf());
        assert_eq!(n.branch(), 31);
        assert_eq!(n.skip(), 127);
        assert_eq!(n.adr(), MAX_NODES - 1);
        assert_eq!(n.raw(), u32::MAX);
    }

    #[test]
    fn test_fields_do_not_overlap() {
        let n = Node::internal(3, 100, 7);
        assert_eq!(n.branch(), 3);
        assert_eq!(n.skip(), 100);
        assert_eq!(n.adr(), 7);
        assert_eq!(Node::from_raw(n.raw()), n);
    }
}
