//! Reloadable trie handle
//!
//! Readers take a lock-free snapshot of the current trie; a reload decodes
//! the new file off to the side and publishes it with a single pointer swap.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::address::BitString;
use crate::trie::LcTrie;
use crate::Result;

pub struct SharedTrie<A> {
    current: ArcSwap<LcTrie<A>>,
}

impl<A: BitString> SharedTrie<A> {
    pub fn new(trie: LcTrie<A>) -> Self {
        Self {
            current: ArcSwap::from_pointee(trie),
        }
    }

    /// Open a compiled trie file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(LcTrie::open(path)?))
    }

    pub fn search(&self, addr: A) -> bool {
        self.current.load().search(addr)
    }

    /// The trie as of now; unaffected by later reloads
    pub fn snapshot(&self) -> Arc<LcTrie<A>> {
        self.current.load_full()
    }

    /// Publish an already built trie, returning the previous one
    pub fn replace(&self, trie: LcTrie<A>) -> Arc<LcTrie<A>> {
        self.current.swap(Arc::new(trie))
    }

    /// Load `path` and publish it. On error the current trie stays in place.
    pub fn reload<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let trie = LcTrie::open(path.as_ref())?;
        let prefixes = trie.len();
        self.current.store(Arc::new(trie));
        tracing::info!(path = %path.as_ref().display(), prefixes, "Reloaded LC-trie");
        Ok(())
    }
}

impl<A: BitString> Default for SharedTrie<A> {
    fn default() -> Self {
        Self::new(LcTrie::new())
    }
}

impl<A: BitString> std::fmt::Debug for SharedTrie<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTrie")
            .field("prefixes", &self.current.load().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Ipv4Bits;
    use crate::prefix::parse_prefix;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    fn build(list: &[&str]) -> LcTrie<Ipv4Bits> {
        let mut entries: Vec<_> = list.iter().map(|s| parse_prefix(s).unwrap()).collect();
        let mut trie = LcTrie::new();
        trie.build(&mut entries).unwrap();
        trie
    }

    fn ip(s: &str) -> Ipv4Bits {
        Ipv4Bits::parse(s).unwrap()
    }

    #[test]
    fn test_default_is_empty() {
        let shared: SharedTrie<Ipv4Bits> = SharedTrie::default();
        assert!(!shared.search(ip("1.2.3.4")));
        assert!(shared.snapshot().is_empty());
    }

    #[test]
    fn test_replace_returns_previous() {
        let shared = SharedTrie::new(build(&["10.0.0.0/8"]));
        assert!(shared.search(ip("10.9.9.9")));

        let old = shared.replace(build(&["11.0.0.0/8"]));
        assert!(old.search(ip("10.9.9.9")));
        assert!(!shared.search(ip("10.9.9.9")));
        assert!(shared.search(ip("11.9.9.9")));
    }

    #[test]
    fn test_snapshot_outlives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("next.cpl");
        build(&["192.168.0.0/16"]).save(&path).unwrap();

        let shared = SharedTrie::new(build(&["10.0.0.0/8"]));
        let before = shared.snapshot();
        shared.reload(&path).unwrap();

        assert!(before.search(ip("10.1.1.1")));
        assert!(!shared.search(ip("10.1.1.1")));
        assert!(shared.search(ip("192.168.3.4")));
    }

    #[test]
    fn test_failed_reload_keeps_current() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.cpl");
        std::fs::write(&path, b"junk").unwrap();

        let shared = SharedTrie::new(build(&["10.0.0.0/8"]));
        assert!(shared.reload(&path).is_err());
        assert!(shared.reload(dir.path().join("missing.cpl")).is_err());
        assert!(shared.search(ip("10.1.1.1")));
    }

    #[test]
    fn test_readers_see_old_or_new() {
        let old = build(&["10.0.0.0/8"]);
        let new = build(&["10.0.0.0/8", "11.0.0.0/8"]);
        let shared = SharedTrie::new(old);
        let done = AtomicBool::new(false);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while !done.load(Ordering::Relaxed) {
                        // present in both versions
                        assert!(shared.search(ip("10.20.30.40")));
                        assert!(!shared.search(ip("12.0.0.1")));
                    }
                });
            }
            for i in 0..50 {
                let next = if i % 2 == 0 { new.clone() } else { build(&["10.0.0.0/8"]) };
                shared.replace(next);
            }
            done.store(true, Ordering::Relaxed);
        });

        // last replacement was the single /8
        assert!(!shared.search(ip("11.0.0.1")));
    }
}
