//! Plaintext prefix and address lists
//!
//! One entry per line. Surrounding whitespace is ignored and blank lines are
//! skipped; any other line that does not parse aborts the whole load.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::address::BitString;
use crate::config::CompileParams;
use crate::prefix::{parse_prefix, PrefixEntry};
use crate::trie::LcTrie;
use crate::{Error, Result};

/// Read `address[/len]` lines from `reader`
pub fn parse_prefix_list<A: BitString, R: BufRead>(reader: R) -> Result<Vec<PrefixEntry<A>>> {
    parse_lines(reader, parse_prefix)
}

/// Read one bare address per line from `path`
pub fn parse_address_list<A: BitString, P: AsRef<Path>>(path: P) -> Result<Vec<A>> {
    let file = File::open(path)?;
    parse_lines(BufReader::new(file), A::parse)
}

fn parse_lines<T, R, F>(reader: R, parse: F) -> Result<Vec<T>>
where
    R: BufRead,
    F: Fn(&str) -> Option<T>,
{
    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        match parse(text) {
            Some(item) => out.push(item),
            None => {
                return Err(Error::Parse {
                    line: idx + 1,
                    text: text.to_string(),
                })
            }
        }
    }
    Ok(out)
}

/// Read a prefix list from `path` and compile it with `params`
pub fn compile_from_file<A: BitString, P: AsRef<Path>>(
    path: P,
    params: CompileParams,
) -> Result<LcTrie<A>> {
    let path = path.as_ref();
    let start = Instant::now();

    let file = File::open(path)?;
    let mut entries = parse_prefix_list::<A, _>(BufReader::new(file))?;
    tracing::debug!(
        path = %path.display(),
        entries = entries.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Read prefix list"
    );

    let mut trie = LcTrie::with_params(params);
    trie.build(&mut entries)?;
    Ok(trie)
}
