//! csearch: grep over every indexed file.
//!
//! Exits 0 if any line matched, 1 if none did, 2 on usage or fatal errors.
//! `-h` means "omit file names" as in grep, so help is `--help` only.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser};
use csearch::config::legacy_long_flags;
use csearch::{
    logging, search_shards, FanoutMode, IndexLocation, PlanOptions, ReportOptions, Reporter,
    SearchPlan, ShardSet,
};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "csearch")]
#[command(about = "Search all indexed files for a regular expression")]
#[command(version, disable_help_flag = true)]
#[command(after_help = "Single-dash long flags (-brute, -concur, -index, -indexdir, -verbose) are also accepted.")]
struct Cli {
    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Print only a count of matching lines per file
    #[arg(short = 'c')]
    count: bool,

    /// Omit file names from the output
    #[arg(short = 'h')]
    no_filename: bool,

    /// Case-insensitive search
    #[arg(short = 'i')]
    ignore_case: bool,

    /// Print only the names of matching files
    #[arg(short = 'l')]
    files_with_matches: bool,

    /// Print line numbers
    #[arg(short = 'n')]
    line_number: bool,

    /// Search only files whose names match this regexp
    #[arg(short = 'f', value_name = "FILEREGEXP")]
    file_filter: Option<String>,

    /// Brute force: search every file in the index
    #[arg(long)]
    brute: bool,

    /// Search the shards of --indexdir concurrently
    #[arg(long)]
    concur: bool,

    /// Print extra information
    #[arg(long)]
    verbose: bool,

    /// Index file
    #[arg(long, env = "CSEARCHINDEX", value_name = "FILE")]
    index: Option<PathBuf>,

    /// Directory of index shards
    #[arg(long, value_name = "DIR")]
    indexdir: Option<PathBuf>,

    /// Regular expression to search for
    pattern: String,
}

/// Long flags the command also accepts with a single dash.
const LEGACY_FLAGS: &[&str] = &["brute", "concur", "index", "indexdir", "verbose"];

fn main() -> ExitCode {
    let cli = Cli::parse_from(legacy_long_flags(std::env::args_os(), LEGACY_FLAGS));
    logging::init(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("csearch: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let plan = SearchPlan::compile(
        &cli.pattern,
        &PlanOptions {
            ignore_case: cli.ignore_case,
            file_filter: cli.file_filter,
            brute: cli.brute,
        },
    )?;
    debug!(query = %plan.query(), "compiled query");

    let location = IndexLocation::resolve(cli.index, cli.indexdir)?;
    let mode = if cli.concur {
        FanoutMode::Concurrent
    } else {
        FanoutMode::Sequential
    };
    let shards = ShardSet::discover(location.search_root(), mode)
        .with_context(|| format!("opening index {}", location.search_root().display()))?;
    debug!(shards = shards.len(), ?mode, "searching");

    let reporter = Reporter::new(
        io::BufWriter::new(io::stdout()),
        ReportOptions {
            line_numbers: cli.line_number,
            count_only: cli.count,
            files_only: cli.files_with_matches,
            omit_file_names: cli.no_filename,
        },
    );
    search_shards(&shards, &plan, &reporter, mode);

    let matched = reporter.matched();
    reporter.into_inner().flush().context("writing results")?;
    Ok(matched)
}
