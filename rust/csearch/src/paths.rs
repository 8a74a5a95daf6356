//! Input roots and tree walks for indexing.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Hidden or editor-temporary names: `.x`, `#x`, `~x` and `x~`.
///
/// Staging shards and merge temp files use this convention too, so the
/// same predicate keeps them out of both indexing and shard discovery.
pub fn is_skipped_name(name: &OsStr) -> bool {
    let bytes = name.as_encoded_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => matches!(first, b'.' | b'#' | b'~') || *last == b'~',
        _ => false,
    }
}

/// Make every argument absolute, normalise it lexically, then sort and dedup.
///
/// Arguments that cannot be resolved are logged and dropped. A root inside
/// another root is dropped too, so no file is walked twice.
pub fn collect_roots<I, P>(args: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut roots: Vec<PathBuf> = args
        .into_iter()
        .filter_map(|arg| {
            let arg = arg.as_ref();
            match std::path::absolute(arg) {
                Ok(abs) => Some(normalize(&abs)),
                Err(err) => {
                    warn!(path = %arg.display(), error = %err, "dropping unresolvable path");
                    None
                }
            }
        })
        .collect();
    roots.sort();

    // Sorting by components puts every root right after any root containing it.
    let mut kept: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        if let Some(outer) = kept.last().filter(|outer| root.starts_with(outer)) {
            debug!(path = %root.display(), within = %outer.display(), "dropping nested root");
            continue;
        }
        kept.push(root);
    }
    kept
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(out.components().next_back(), Some(Component::RootDir) | None) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Regular files under `root` in lexical order.
///
/// Hidden and temporary entries below the root are pruned (a pruned
/// directory takes its subtree with it); the root itself is always walked.
/// Walk errors are logged and skipped.
pub fn walk_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_name(entry.file_name()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
}
