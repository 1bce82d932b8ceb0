//! Prefix entries and canonicalization
//!
//! A prefix entry is an address plus the number of leading bits that are
//! significant. The compiler requires its input strictly sorted by
//! `(address, length)` and free of duplicates; [`canonicalize`] produces that
//! from arbitrary input.

use std::fmt;

use crate::address::BitString;
use crate::{Error, Result};

/// An (address, prefix-length) pair, e.g. `10.0.0.0/8`.
///
/// Ordering is by numeric address, then by length.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrefixEntry<A> {
    pub addr: A,
    pub len: u8,
}

impl<A: BitString> PrefixEntry<A> {
    pub fn new(addr: A, len: u8) -> Self {
        Self { addr, len }
    }

    /// A full-width entry matching exactly one address
    pub fn host(addr: A) -> Self {
        Self {
            addr,
            len: A::BITS as u8,
        }
    }

    /// Does `addr` fall inside this prefix?
    #[inline]
    pub fn contains(&self, addr: A) -> bool {
        (self.addr ^ addr).extract(0, self.len as u32).is_zero()
    }

    /// Is `self` a prefix of (or equal to) `other`?
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.len == 0 || (self.len <= other.len && self.contains(other.addr))
    }

    /// Same prefix with the bits past `len` cleared
    pub fn canonical(&self) -> Self {
        Self {
            addr: self.addr.truncate(self.len as u32),
            len: self.len,
        }
    }
}

impl<A: fmt::Display> fmt::Display for PrefixEntry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl<A: fmt::Debug> fmt::Debug for PrefixEntry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrefixEntry({:?}/{})", self.addr, self.len)
    }
}

/// Parse `address[/len]`; a missing length means the full address width.
pub fn parse_prefix<A: BitString>(text: &str) -> Option<PrefixEntry<A>> {
    let (addr_text, len) = match text.split_once('/') {
        Some((addr_text, len_text)) => {
            if len_text.is_empty() || !len_text.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let len: u32 = len_text.parse().ok()?;
            if len > A::BITS {
                return None;
            }
            (addr_text, len as u8)
        }
        None => (text, A::BITS as u8),
    };
    let addr = A::parse(addr_text)?;
    Some(PrefixEntry { addr, len })
}

/// Sort `entries` in place and return the duplicate-free base vector.
///
/// Host bits past each entry's length are cleared first. Among entries with
/// the same address only the shortest survives: it covers the longer ones,
/// and no bit could tell them apart inside the trie anyway. The returned
/// vector (and so `LcTrie::len` and the `[N ..]` stats field) can therefore
/// be shorter than the number of distinct `(address, length)` pairs given,
/// e.g. `10.0.0.0/8` and `10.0.0.0/16` count once.
pub fn canonicalize<A: BitString>(entries: &mut [PrefixEntry<A>]) -> Result<Vec<PrefixEntry<A>>> {
    if let Some(bad) = entries.iter().find(|e| e.len as u32 > A::BITS) {
        return Err(Error::InvalidPrefix {
            len: bad.len,
            max: A::BITS,
        });
    }

    for entry in entries.iter_mut() {
        *entry = entry.canonical();
    }

    entries.sort_unstable();

    let mut base: Vec<PrefixEntry<A>> = Vec::with_capacity(entries.len());
    for entry in entries.iter() {
        match base.last() {
            Some(prev) if prev.addr == entry.addr => {}
            _ => base.push(*entry),
        }
    }

    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Ipv4Bits, Ipv6Bits};

    fn p4(s: &str) -> PrefixEntry<Ipv4Bits> {
        parse_prefix(s).unwrap()
    }

    #[test]
    fn test_parse_prefix() {
        let e = p4("10.0.0.0/8");
        assert_eq!(e.addr.0, 0x0a00_0000);
        assert_eq!(e.len, 8);

        let host = p4("192.168.0.1");
        assert_eq!(host.len, 32);

        let v6: PrefixEntry<Ipv6Bits> = parse_prefix("2001:4c40:1::/48").unwrap();
        assert_eq!(v6.len, 48);
        let v6_host: PrefixEntry<Ipv6Bits> = parse_prefix("::1").unwrap();
        assert_eq!(v6_host.len, 128);
    }

    #[test]
    fn test_parse_prefix_rejects_bad_length() {
        assert!(parse_prefix::<Ipv4Bits>("10.0.0.0/33").is_none());
        assert!(parse_prefix::<Ipv4Bits>("10.0.0.0/").is_none());
        assert!(parse_prefix::<Ipv4Bits>("10.0.0.0/x").is_none());
        assert!(parse_prefix::<Ipv4Bits>("10.0.0.0/-1").is_none());
        assert!(parse_prefix::<Ipv4Bits>("10.0.0.0/8/8").is_none());
        assert!(parse_prefix::<Ipv6Bits>("::/129").is_none());
        assert!(parse_prefix::<Ipv4Bits>("10.0.0/8").is_none());
    }

    #[test]
    fn test_ordering() {
        assert!(p4("10.0.0.0/8") < p4("10.0.0.0/16"));
        assert!(p4("10.0.0.0/16") < p4("10.1.0.0/16"));
        assert!(p4("9.255.255.255/32") < p4("10.0.0.0/8"));
    }

    #[test]
    fn test_contains() {
        let e = p4("10.0.0.0/8");
        assert!(e.contains(Ipv4Bits::parse("10.200.1.1").unwrap()));
        assert!(!e.contains(Ipv4Bits::parse("11.0.0.0").unwrap()));

        let any = p4("0.0.0.0/0");
        assert!(any.contains(Ipv4Bits::parse("255.255.255.255").unwrap()));
    }

    #[test]
    fn test_is_prefix_of() {
        assert!(p4("10.0.0.0/8").is_prefix_of(&p4("10.1.0.0/16")));
        assert!(!p4("10.1.0.0/16").is_prefix_of(&p4("10.0.0.0/8")));
        assert!(p4("0.0.0.0/0").is_prefix_of(&p4("1.2.3.4")));
    }

    #[test]
    fn test_canonicalize_sorts_and_dedups() {
        let mut input = vec![
            p4("10.1.0.0/16"),
            p4("192.168.0.0/16"),
            p4("10.1.0.0/16"),
            p4("10.0.0.0/8"),
        ];
        let base = canonicalize(&mut input).unwrap();
        assert_eq!(
            base,
            vec![p4("10.0.0.0/8"), p4("10.1.0.0/16"), p4("192.168.0.0/16")]
        );
        // input is left sorted
        assert!(input.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_canonicalize_clears_host_bits() {
        let mut input = vec![p4("10.1.2.3/8"), p4("10.0.0.0/8")];
        let base = canonicalize(&mut input).unwrap();
        assert_eq!(base, vec![p4("10.0.0.0/8")]);
    }

    #[test]
    fn test_canonicalize_keeps_shortest_for_same_address() {
        let mut input = vec![p4("10.0.0.0/16"), p4("10.0.0.0/8"), p4("10.0.0.0/24")];
        let base = canonicalize(&mut input).unwrap();
        assert_eq!(base, vec![p4("10.0.0.0/8")]);
    }

    #[test]
    fn test_canonicalize_rejects_overlong() {
        let mut input = vec![PrefixEntry::new(Ipv4Bits(0), 40)];
        assert!(matches!(
            canonicalize(&mut input),
            Err(Error::InvalidPrefix { len: 40, max: 32 })
        ));
    }
}
