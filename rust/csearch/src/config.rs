//! Where the index lives and how big shards may grow.
//!
//! Values are resolved once by the binaries (flags, then environment, then
//! defaults) and handed to the engines as plain structs.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{CsearchError, Result};

/// Default rotation threshold: 100 GiB of indexed content per shard.
pub const DEFAULT_SHARD_THRESHOLD: u64 = 100 * 1024 * 1024 * 1024;

/// Master file name inside an index directory.
pub const INDEX_DIR_MASTER_NAME: &str = "csearch.idx";

/// Master file name under `$HOME` when nothing else is configured.
pub const DEFAULT_INDEX_NAME: &str = ".csearchindex";

/// The configured index: a single file, or a directory of shards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLocation {
    File(PathBuf),
    Dir(PathBuf),
}

impl IndexLocation {
    /// `index_dir` wins over `index_file`; with neither, fall back to
    /// `$HOME/.csearchindex`. Empty values count as unset.
    pub fn resolve(index_file: Option<PathBuf>, index_dir: Option<PathBuf>) -> Result<Self> {
        let non_empty = |p: Option<PathBuf>| p.filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = non_empty(index_dir) {
            return Ok(IndexLocation::Dir(dir));
        }
        match non_empty(index_file) {
            Some(file) => Ok(IndexLocation::File(file)),
            None => default_index_path().map(IndexLocation::File),
        }
    }

    /// Path of the master index `cindex` maintains.
    pub fn master_path(&self) -> PathBuf {
        match self {
            IndexLocation::File(file) => file.clone(),
            IndexLocation::Dir(dir) => dir.join(INDEX_DIR_MASTER_NAME),
        }
    }

    /// Path `csearch` discovers shards from.
    pub fn search_root(&self) -> &Path {
        match self {
            IndexLocation::File(path) | IndexLocation::Dir(path) => path,
        }
    }
}

pub fn default_index_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_INDEX_NAME))
        .ok_or(CsearchError::NoHomeDir)
}

/// Rewrite single-dash long flags (`-brute`, `-index=x`) whose name is in
/// `names` to the `--brute` form clap parses. Arguments after `--` are
/// left alone.
pub fn legacy_long_flags<I>(args: I, names: &[&str]) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut in_flags = true;
    for arg in args {
        if in_flags && arg == "--" {
            in_flags = false;
        }
        let rewritten = arg
            .to_str()
            .filter(|_| in_flags)
            .and_then(|a| a.strip_prefix('-'))
            .filter(|rest| {
                let name = rest.split_once('=').map_or(*rest, |(name, _)| name);
                names.contains(&name)
            })
            .map(|rest| OsString::from(format!("--{rest}")));
        out.push(rewritten.unwrap_or(arg));
    }
    out
}
