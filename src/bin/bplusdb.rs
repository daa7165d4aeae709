//! bplusdb command-line driver.
//!
//! Reads an operation count followed by that many operations from stdin:
//!
//! ```text
//! insert <key> <value>
//! delete <key> <value>
//! find <key>
//! ```
//!
//! `find` prints the matching values in ascending order separated by
//! spaces, or `null` when there are none. Duplicate inserts and deletes of
//! absent entries are ignored.

use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use bplusdb::{BPlusTree, Error, TreeConfig};
use clap::Parser;
use tracing::warn;

#[derive(Parser)]
#[command(name = "bplusdb", about = "Persistent string-to-integer B+ tree index", version)]
struct Cli {
    /// Path to the tree file (created if missing)
    #[arg(short, long, default_value = "data.db")]
    db: PathBuf,

    /// Maximum key length in bytes (new files only; must match on reopen)
    #[arg(long, default_value_t = bplusdb::common::config::DEFAULT_MAX_KEY_LEN)]
    max_key_len: usize,

    /// Leaf capacity L
    #[arg(long, default_value_t = bplusdb::common::config::DEFAULT_LEAF_CAPACITY)]
    leaf_capacity: usize,

    /// Internal fan-out M
    #[arg(long, default_value_t = bplusdb::common::config::DEFAULT_INTERNAL_FANOUT)]
    internal_fanout: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = TreeConfig::new()
        .with_max_key_len(cli.max_key_len)
        .with_leaf_capacity(cli.leaf_capacity)
        .with_internal_fanout(cli.internal_fanout);

    let mut tree = BPlusTree::open_or_create(&cli.db, config)
        .with_context(|| format!("opening {}", cli.db.display()))?;

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    run_script(&mut tree, &input, &mut out)?;
    out.flush()?;

    tree.close()?;
    Ok(())
}

/// Execute a whitespace-separated operation script against `tree`.
fn run_script<W: Write>(tree: &mut BPlusTree, input: &str, out: &mut W) -> Result<()> {
    let mut tokens = input.split_whitespace();
    let Some(count) = tokens.next() else {
        return Ok(());
    };
    let count: usize = count
        .parse()
        .with_context(|| format!("invalid operation count {:?}", count))?;

    let mut next = |what: &str| {
        tokens
            .next()
            .ok_or_else(|| anyhow!("unexpected end of input, expected {}", what))
    };

    for _ in 0..count {
        match next("command")? {
            "insert" => {
                let key = next("key")?;
                let value = parse_value(next("value")?)?;
                absorb(tree.insert(key, value))?;
            }
            "delete" => {
                let key = next("key")?;
                let value = parse_value(next("value")?)?;
                absorb(tree.delete(key, value))?;
            }
            "find" => {
                let key = next("key")?;
                let values = match tree.find(key) {
                    Ok(values) => values,
                    Err(e @ (Error::KeyTooLong { .. } | Error::InvalidKey(_))) => {
                        warn!(error = %e, "lookup of unstorable key");
                        Vec::new()
                    }
                    Err(e) => return Err(e.into()),
                };
                write_values(out, &values)?;
            }
            other => warn!(command = other, "skipping unknown command"),
        }
    }
    Ok(())
}

/// Swallow duplicate/not-found outcomes and unstorable keys; keep faults.
fn absorb(result: bplusdb::Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_benign() => Ok(()),
        Err(e @ (Error::KeyTooLong { .. } | Error::InvalidKey(_))) => {
            warn!(error = %e, "ignoring operation");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_value(token: &str) -> Result<i32> {
    match token.parse() {
        Ok(value) => Ok(value),
        Err(_) => bail!("invalid value {:?}", token),
    }
}

fn write_values<W: Write>(out: &mut W, values: &[i32]) -> io::Result<()> {
    if values.is_empty() {
        return writeln!(out, "null");
    }
    let line = values
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "{}", line)
}
