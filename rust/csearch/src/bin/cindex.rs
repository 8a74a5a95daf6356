//! cindex: build or update the trigram index used by `csearch`.
//!
//! ```bash
//! # Add two trees to the index (merging with what is already there)
//! cindex ~/src /usr/include
//!
//! # Re-index everything already in the index (e.g. from cron)
//! cindex
//!
//! # Start over with just one tree / remove the index
//! cindex --reset ~/src
//! cindex --reset
//! ```
//!
//! The index is `--indexdir DIR/csearch.idx`, else `--index` / `$CSEARCHINDEX`,
//! else `$HOME/.csearchindex`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use csearch::config::{legacy_long_flags, IndexLocation, DEFAULT_SHARD_THRESHOLD};
use csearch::{list_roots, logging, run_index, IndexOptions};

#[derive(Parser, Debug)]
#[command(name = "cindex")]
#[command(about = "Prepare the trigram index for use by csearch")]
#[command(version)]
#[command(after_help = "Single-dash long flags (-list, -reset, -verbose, -index, -indexdir) are also accepted.")]
struct Cli {
    /// List the indexed paths and exit
    #[arg(long)]
    list: bool,

    /// Discard the existing index; with no paths, remove it
    #[arg(long)]
    reset: bool,

    /// Print extra information
    #[arg(long)]
    verbose: bool,

    /// Index file
    #[arg(long, env = "CSEARCHINDEX", value_name = "FILE")]
    index: Option<PathBuf>,

    /// Index directory; the master is DIR/csearch.idx
    #[arg(long, value_name = "DIR")]
    indexdir: Option<PathBuf>,

    /// Start a new shard once this many bytes have been indexed
    #[arg(long, env = "CSEARCH_SHARD_SIZE", value_name = "BYTES", default_value_t = DEFAULT_SHARD_THRESHOLD)]
    shard_size: u64,

    /// Files or directory trees to index
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,
}

/// Long flags the command also accepts with a single dash.
const LEGACY_FLAGS: &[&str] = &["list", "reset", "verbose", "index", "indexdir"];

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_from(legacy_long_flags(std::env::args_os(), LEGACY_FLAGS));
    logging::init(cli.verbose);

    let location = IndexLocation::resolve(cli.index, cli.indexdir)?;
    let master = location.master_path();

    if cli.list {
        for root in list_roots(&master).with_context(|| format!("reading {}", master.display()))? {
            println!("{root}");
        }
        return Ok(());
    }

    let opts = IndexOptions {
        master,
        shard_threshold: cli.shard_size,
        reset: cli.reset,
    };
    run_index(&cli.paths, &opts)
        .with_context(|| format!("indexing into {}", opts.master.display()))?;
    Ok(())
}
