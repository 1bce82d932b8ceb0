//! lctrie CLI
//!
//! Compile prefix lists into LC-tries, query them, and inspect compiled files.
//!
//! Usage:
//!   lctrie compile -f v4 --input subnets.txt --output subnets.cpl
//!   lctrie query -f v4 --trie subnets.cpl --addresses addrs.txt --repeat 100
//!   lctrie stats -f v4 --trie subnets.cpl
//!
//! `query --trie` takes either a compiled `.cpl` file or a plaintext prefix
//! list, which is compiled first.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lctrie_core::{
    compile_from_file, parse_address_list, BitString, CompileParams, Ipv4Bits, Ipv6Bits, LcTrie,
};
use tracing_subscriber::EnvFilter;

/// Extension marking a compiled trie file
const COMPILED_EXT: &str = "cpl";

#[derive(Parser, Debug)]
#[command(name = "lctrie")]
#[command(about = "Compile and query LC-tries of IP prefixes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a plaintext prefix list into a .cpl file
    Compile(CompileArgs),

    /// Search a list of addresses against a trie
    Query(QueryArgs),

    /// Print statistics for a compiled trie
    Stats(StatsArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Family {
    V4,
    V6,
}

#[derive(Parser, Debug, Default)]
struct ParamArgs {
    /// Minimum node occupancy in (0, 1]
    #[arg(long)]
    fill_factor: Option<f64>,

    /// Force the root branching factor (bits)
    #[arg(long)]
    root_branch: Option<u32>,

    /// JSON file with compile parameters; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CompileArgs {
    #[arg(short, long, value_enum)]
    family: Family,

    /// Plaintext prefix list, one `address[/len]` per line
    #[arg(long)]
    input: PathBuf,

    /// Output compiled trie
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    params: ParamArgs,
}

#[derive(Parser, Debug)]
struct QueryArgs {
    #[arg(short, long, value_enum)]
    family: Family,

    /// Compiled .cpl file or plaintext prefix list
    #[arg(long)]
    trie: PathBuf,

    /// Addresses to search, one per line
    #[arg(long)]
    addresses: PathBuf,

    /// Run every search this many times
    #[arg(long, default_value_t = 1)]
    repeat: u32,

    /// Also save the trie here
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    params: ParamArgs,
}

#[derive(Parser, Debug)]
struct StatsArgs {
    #[arg(short, long, value_enum)]
    family: Family,

    /// Compiled trie file
    #[arg(long)]
    trie: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Compile(args) => match args.family {
            Family::V4 => compile::<Ipv4Bits>(&args),
            Family::V6 => compile::<Ipv6Bits>(&args),
        },
        Command::Query(args) => match args.family {
            Family::V4 => query::<Ipv4Bits>(&args),
            Family::V6 => query::<Ipv6Bits>(&args),
        },
        Command::Stats(args) => match args.family {
            Family::V4 => stats::<Ipv4Bits>(&args),
            Family::V6 => stats::<Ipv6Bits>(&args),
        },
    }
}

/// Config file first, then flag overrides
fn resolve_params(args: &ParamArgs) -> Result<CompileParams> {
    let mut params = match &args.config {
        Some(path) => CompileParams::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => CompileParams::default(),
    };
    if let Some(fill) = args.fill_factor {
        params.fill_factor = fill;
    }
    if let Some(root) = args.root_branch {
        params.root_branching_factor = root;
    }
    Ok(params)
}

fn is_compiled(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(COMPILED_EXT))
}

fn compile<A: BitString>(args: &CompileArgs) -> Result<()> {
    let params = resolve_params(&args.params)?;
    tracing::info!(
        input = %args.input.display(),
        output = %args.output.display(),
        fill_factor = params.fill_factor,
        root_branch = params.root_branching_factor,
        "Compiling prefix list"
    );

    let trie: LcTrie<A> = compile_from_file(&args.input, params)
        .with_context(|| format!("Failed to compile {}", args.input.display()))?;
    tracing::info!(stats = %trie.stats(), "Trie stats");

    trie.save(&args.output)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;
    Ok(())
}

fn query<A: BitString>(args: &QueryArgs) -> Result<()> {
    let start = Instant::now();
    let trie: LcTrie<A> = if is_compiled(&args.trie) {
        let trie = LcTrie::open(&args.trie)
            .with_context(|| format!("Failed to load {}", args.trie.display()))?;
        println!("time to load precompiled trie: {:.6}", start.elapsed().as_secs_f64());
        trie
    } else {
        let params = resolve_params(&args.params)?;
        let trie = compile_from_file(&args.trie, params)
            .with_context(|| format!("Failed to compile {}", args.trie.display()))?;
        println!("compilation time: {:.6}", start.elapsed().as_secs_f64());
        trie
    };
    println!("trie stats: {}", trie.stats());

    if let Some(output) = &args.output {
        trie.save(output)
            .with_context(|| format!("Failed to save {}", output.display()))?;
    }

    let addrs: Vec<A> = parse_address_list(&args.addresses)
        .with_context(|| format!("Failed to read addresses {}", args.addresses.display()))?;

    let counts = run_searches(&trie, &addrs, args.repeat);
    println!(
        "searches: {}\nfound: {}\nnot found: {}\ntime: {:.6}",
        counts.searches,
        counts.found,
        counts.not_found,
        counts.elapsed.as_secs_f64()
    );
    Ok(())
}

fn stats<A: BitString>(args: &StatsArgs) -> Result<()> {
    let trie: LcTrie<A> = LcTrie::open(&args.trie)
        .with_context(|| format!("Failed to load {}", args.trie.display()))?;
    println!("{}", trie.stats());
    Ok(())
}

#[derive(Debug)]
struct SearchCounts {
    searches: u64,
    found: u64,
    not_found: u64,
    elapsed: std::time::Duration,
}

fn run_searches<A: BitString>(trie: &LcTrie<A>, addrs: &[A], repeat: u32) -> SearchCounts {
    let start = Instant::now();
    let mut found = 0u64;
    let mut not_found = 0u64;
    for _ in 0..repeat {
        for &addr in addrs {
            if trie.search(addr) {
                found += 1;
            } else {
                not_found += 1;
            }
        }
    }
    SearchCounts {
        searches: found + not_found,
        found,
        not_found,
        elapsed: start.elapsed(),
    }
}
