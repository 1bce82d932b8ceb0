//! Fixed-width address bit strings
//!
//! The trie only ever needs three primitives from an address: pull out a run
//! of bits (`extract`), clear a leading run (`remove`), and parse text. Both
//! widths implement them against the same MSB-first bit numbering:
//!
//! ```text
//! bit 0                                    bit W-1
//! |MSB ...................................... LSB|
//! ```
//!
//! Shifts by the full width are defined to produce zero here, unlike the
//! native shift operators.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::ops::BitXor;

/// An unsigned bit vector of compile-time width usable as an LC-trie key.
pub trait BitString:
    Copy + Ord + Eq + BitXor<Output = Self> + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Width in bits
    const BITS: u32;
    /// Encoded width in bytes
    const BYTES: usize;
    /// Family tag stored in compiled trie files (4 or 6)
    const FAMILY: u8;
    /// All bits clear
    const ZERO: Self;

    /// The `n` bits starting at `pos`, right-aligned.
    ///
    /// Equivalent to `(self << pos) >> (W - n)` with out-of-range shifts
    /// producing zero.
    fn extract(self, pos: u32, n: u32) -> Self;

    /// Clear the leading `pos` bits, `(self << pos) >> pos`.
    fn remove(self, pos: u32) -> Self;

    /// Parse canonical text notation
    fn parse(text: &str) -> Option<Self>;

    /// Low bits as an index. Only meaningful after `extract` with a small `n`.
    fn to_index(self) -> usize;

    /// Append the big-endian encoding (`BYTES` bytes)
    fn write_be(&self, out: &mut Vec<u8>);

    /// Decode from exactly `BYTES` big-endian bytes
    fn read_be(bytes: &[u8]) -> Self;

    fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// Keep the leading `len` bits and zero the rest
    fn truncate(self, len: u32) -> Self {
        self ^ self.remove(len)
    }
}

// =============================================================================
// 32-bit addresses
// =============================================================================

/// IPv4 address as a 32-bit string
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ipv4Bits(pub u32);

impl BitString for Ipv4Bits {
    const BITS: u32 = 32;
    const BYTES: usize = 4;
    const FAMILY: u8 = 4;
    const ZERO: Self = Ipv4Bits(0);

    #[inline]
    fn extract(self, pos: u32, n: u32) -> Self {
        if n == 0 {
            return Self::ZERO;
        }
        let shifted = self.0.checked_shl(pos).unwrap_or(0);
        Ipv4Bits(shifted.checked_shr(Self::BITS - n).unwrap_or(0))
    }

    #[inline]
    fn remove(self, pos: u32) -> Self {
        let shifted = self.0.checked_shl(pos).unwrap_or(0);
        Ipv4Bits(shifted.checked_shr(pos).unwrap_or(0))
    }

    fn parse(text: &str) -> Option<Self> {
        text.parse::<Ipv4Addr>().ok().map(Self::from)
    }

    #[inline]
    fn to_index(self) -> usize {
        self.0 as usize
    }

    fn write_be(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0.to_be_bytes());
    }

    fn read_be(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes[..4]);
        Ipv4Bits(u32::from_be_bytes(buf))
    }
}

impl BitXor for Ipv4Bits {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        Ipv4Bits(self.0 ^ rhs.0)
    }
}

impl From<Ipv4Addr> for Ipv4Bits {
    fn from(addr: Ipv4Addr) -> Self {
        Ipv4Bits(u32::from(addr))
    }
}

impl From<Ipv4Bits> for Ipv4Addr {
    fn from(bits: Ipv4Bits) -> Self {
        Ipv4Addr::from(bits.0)
    }
}

impl fmt::Display for Ipv4Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ipv4Addr::from(*self).fmt(f)
    }
}

impl fmt::Debug for Ipv4Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ipv4Bits({})", self)
    }
}

// =============================================================================
// 128-bit addresses
// =============================================================================

/// IPv6 address as two 64-bit halves.
///
/// Field order matters: the derived `Ord` compares `hi` first, which is the
/// numeric order of the full 128-bit value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ipv6Bits {
    pub hi: u64,
    pub lo: u64,
}

impl Ipv6Bits {
    pub const fn new(hi: u64, lo: u64) -> Self {
        Self { hi, lo }
    }

    /// Shift left across the half boundary
    #[inline]
    fn shl(self, p: u32) -> Self {
        match p {
            0 => self,
            1..=63 => Self {
                hi: (self.hi << p) | (self.lo >> (64 - p)),
                lo: self.lo << p,
            },
            64 => Self { hi: self.lo, lo: 0 },
            65..=127 => Self {
                hi: self.lo << (p - 64),
                lo: 0,
            },
            _ => Self::ZERO,
        }
    }

    /// Shift right across the half boundary
    #[inline]
    fn shr(self, p: u32) -> Self {
        match p {
            0 => self,
            1..=63 => Self {
                hi: self.hi >> p,
                lo: (self.lo >> p) | (self.hi << (64 - p)),
            },
            64 => Self { hi: 0, lo: self.hi },
            65..=127 => Self {
                hi: 0,
                lo: self.hi >> (p - 64),
            },
            _ => Self::ZERO,
        }
    }
}

impl BitString for Ipv6Bits {
    const BITS: u32 = 128;
    const BYTES: usize = 16;
    const FAMILY: u8 = 6;
    const ZERO: Self = Ipv6Bits { hi: 0, lo: 0 };

    #[inline]
    fn extract(self, pos: u32, n: u32) -> Self {
        if n == 0 {
            return Self::ZERO;
        }
        self.shl(pos).shr(Self::BITS - n)
    }

    #[inline]
    fn remove(self, pos: u32) -> Self {
        self.shl(pos).shr(pos)
    }

    fn parse(text: &str) -> Option<Self> {
        text.parse::<Ipv6Addr>().ok().map(Self::from)
    }

    #[inline]
    fn to_index(self) -> usize {
        // extracted indices never exceed 32 bits
        self.lo as u32 as usize
    }

    fn write_be(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.hi.to_be_bytes());
        out.extend_from_slice(&self.lo.to_be_bytes());
    }

    fn read_be(bytes: &[u8]) -> Self {
        let mut hi = [0u8; 8];
        let mut lo = [0u8; 8];
        hi.copy_from_slice(&bytes[0..8]);
        lo.copy_from_slice(&bytes[8..16]);
        Self {
            hi: u64::from_be_bytes(hi),
            lo: u64::from_be_bytes(lo),
        }
    }
}

impl BitXor for Ipv6Bits {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        Self {
            hi: self.hi ^ rhs.hi,
            lo: self.lo ^ rhs.lo,
        }
    }
}

impl From<Ipv6Addr> for Ipv6Bits {
    fn from(addr: Ipv6Addr) -> Self {
        let v = u128::from(addr);
        Self {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

impl From<Ipv6Bits> for Ipv6Addr {
    fn from(bits: Ipv6Bits) -> Self {
        Ipv6Addr::from(((bits.hi as u128) << 64) | bits.lo as u128)
    }
}

impl fmt::Display for Ipv6Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ipv6Addr::from(*self).fmt(f)
    }
}

impl fmt::Debug for Ipv6Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ipv6Bits({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v6(v: u128) -> Ipv6Bits {
        Ipv6Bits::new((v >> 64) as u64, v as u64)
    }

    fn as_u128(b: Ipv6Bits) -> u128 {
        ((b.hi as u128) << 64) | b.lo as u128
    }

    fn ref_extract_128(v: u128, pos: u32, n: u32) -> u128 {
        if n == 0 {
            return 0;
        }
        v.checked_shl(pos).unwrap_or(0).checked_shr(128 - n).unwrap_or(0)
    }

    fn ref_remove_128(v: u128, pos: u32) -> u128 {
        v.checked_shl(pos).unwrap_or(0).checked_shr(pos).unwrap_or(0)
    }

    #[test]
    fn test_ipv4_extract() {
        let a = Ipv4Bits::parse("10.1.2.3").unwrap();
        assert_eq!(a.extract(0, 8).0, 10);
        assert_eq!(a.extract(8, 8).0, 1);
        assert_eq!(a.extract(24, 8).0, 3);
        assert_eq!(a.extract(0, 32), a);
        assert_eq!(a.extract(4, 0), Ipv4Bits::ZERO);
        assert_eq!(a.extract(32, 4), Ipv4Bits::ZERO);
    }

    #[test]
    fn test_ipv4_remove() {
        let a = Ipv4Bits(0xffff_ffff);
        assert_eq!(a.remove(0), a);
        assert_eq!(a.remove(8).0, 0x00ff_ffff);
        assert_eq!(a.remove(31).0, 1);
        assert_eq!(a.remove(32), Ipv4Bits::ZERO);
    }

    #[test]
    fn test_ipv4_truncate() {
        let a = Ipv4Bits::parse("10.1.2.3").unwrap();
        assert_eq!(a.truncate(8), Ipv4Bits::parse("10.0.0.0").unwrap());
        assert_eq!(a.truncate(0), Ipv4Bits::ZERO);
        assert_eq!(a.truncate(32), a);
    }

    #[test]
    fn test_ipv4_parse_rejects_malformed() {
        assert!(Ipv4Bits::parse("10.0.0").is_none());
        assert!(Ipv4Bits::parse("256.0.0.1").is_none());
        assert!(Ipv4Bits::parse("10.0.0.0/8").is_none());
        assert!(Ipv4Bits::parse("").is_none());
        assert!(Ipv4Bits::parse("::1").is_none());
    }

    #[test]
    fn test_ipv6_matches_u128_model() {
        let samples = [
            0u128,
            u128::MAX,
            0x2001_0db8_0000_0000_0000_0000_0000_0001,
            0x8000_0000_0000_0001_8000_0000_0000_0001,
            0x0123_4567_89ab_cdef_fedc_ba98_7654_3210,
        ];
        for &v in &samples {
            let b = v6(v);
            for pos in 0..=128u32 {
                assert_eq!(
                    as_u128(b.remove(pos)),
                    ref_remove_128(v, pos),
                    "remove({pos}) of {v:#x}"
                );
                for n in 0..=(128 - pos).min(32) {
                    assert_eq!(
                        as_u128(b.extract(pos, n)),
                        ref_extract_128(v, pos, n),
                        "extract({pos}, {n}) of {v:#x}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_ipv6_extract_across_boundary() {
        // bits 60..68 straddle the hi/lo halves
        let b = v6(0x0000_0000_0000_000a_b000_0000_0000_0000);
        assert_eq!(b.extract(60, 8).to_index(), 0xab);
        assert_eq!(b.extract(64, 4).to_index(), 0xb);
        assert_eq!(b.extract(0, 128), b);
    }

    #[test]
    fn test_ipv6_ordering() {
        let a = Ipv6Bits::parse("2001:db8::").unwrap();
        let b = Ipv6Bits::parse("2001:db8::1").unwrap();
        let c = Ipv6Bits::parse("2001:db9::").unwrap();
        assert!(a < b);
        assert!(b < c);
        assert!(Ipv6Bits::new(0, u64::MAX) < Ipv6Bits::new(1, 0));
    }

    #[test]
    fn test_ipv6_parse_and_display() {
        let a = Ipv6Bits::parse("2001:4c40:1::").unwrap();
        assert_eq!(a.hi, 0x2001_4c40_0001_0000);
        assert_eq!(a.lo, 0);
        assert_eq!(a.to_string(), "2001:4c40:1::");
        assert!(Ipv6Bits::parse("2001:::1").is_none());
        assert!(Ipv6Bits::parse("10.0.0.1").is_none());
    }

    #[test]
    fn test_byte_encoding() {
        let a = Ipv6Bits::parse("2001:db8::ff").unwrap();
        let mut out = Vec::new();
        a.write_be(&mut out);
        assert_eq!(out.len(), Ipv6Bits::BYTES);
        assert_eq!(out[0], 0x20);
        assert_eq!(out[15], 0xff);
        assert_eq!(Ipv6Bits::read_be(&out), a);

        let b = Ipv4Bits::parse("192.168.1.7").unwrap();
        let mut out = Vec::new();
        b.write_be(&mut out);
        assert_eq!(out, vec![192, 168, 1, 7]);
        assert_eq!(Ipv4Bits::read_be(&out), b);
    }

    #[test]
    fn test_xor() {
        let a = Ipv4Bits::parse("10.0.0.0").unwrap();
        let b = Ipv4Bits::parse("10.0.0.255").unwrap();
        assert_eq!((a ^ b).0, 0xff);
        assert!((a ^ a).is_zero());
    }
}
