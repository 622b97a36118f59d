//! arbor - build a directory tree concurrently and print it.
//!
//! Usage:
//!   arbor [PATH]             Print the tree under PATH
//!   arbor -j 8 [PATH]        Limit parallel directory reads to 8
//!   arbor --json [PATH]      Export the tree as JSON
//!   arbor --help             Show help

mod render;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use color_eyre::eyre::{Context, Result, eyre};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use arbor_core::{BuildConfig, DEFAULT_CONCURRENCY_LIMIT};
use arbor_scan::TreeBuilder;

use crate::render::{RenderOptions, render, summary};

#[derive(Debug, Parser)]
#[command(
    name = "arbor",
    version,
    about = "Print a directory tree, reading directories concurrently"
)]
struct Cli {
    /// Directory to list (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Maximum number of directory reads in flight at once
    #[arg(short = 'j', long, default_value_t = DEFAULT_CONCURRENCY_LIMIT)]
    concurrency: usize,

    /// Worker threads (0 = one per CPU)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Leave out entries whose name starts with '.'
    #[arg(long)]
    no_hidden: bool,

    /// Descend only this many levels when printing
    #[arg(short = 'L', long)]
    level: Option<usize>,

    /// Print the tree as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Print a directory and file count after the tree
    #[arg(short, long)]
    stats: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_tracing(cli.verbose);
    debug!("Parsed CLI arguments: {cli:?}");

    let config = BuildConfig::builder()
        .root(cli.path.clone())
        .concurrency_limit(cli.concurrency)
        .threads(cli.threads)
        .include_hidden(!cli.no_hidden)
        .build()
        .map_err(|e| eyre!("Invalid configuration: {e}"))?;

    let tree = TreeBuilder::new(config)
        .build()
        .with_context(|| format!("Failed to build tree for {}", cli.path.display()))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if cli.json {
        serde_json::to_writer_pretty(&mut out, tree.root.as_ref()).context("JSON export failed")?;
        writeln!(out)?;
    } else {
        render(&mut out, &tree.root, RenderOptions { max_depth: cli.level })?;
        if cli.stats {
            writeln!(out)?;
            writeln!(out, "{}", summary(&tree.stats))?;
        }
    }
    out.flush()?;

    Ok(())
}

/// Log to stderr. `RUST_LOG` overrides the level picked by `-v`.
fn setup_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .compact()
        .init();
}
