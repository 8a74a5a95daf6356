//! Merge two serialized indexes into one builder.
//!
//! The newer index wins wherever both describe the same file. File ids are
//! reassigned in path order, so the result does not depend on which index
//! was built first.

use std::path::Path;

use ahash::AHashSet;

use super::builder::TrigramIndexBuilder;
use super::error::TrigramError;
use super::view::IndexView;

/// Which files of the older index the newer one supersedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Drop older files that live under any root of the newer index, or
    /// share a path with one of its files. Deleted files disappear.
    OverrideRoots,
    /// Drop only older files that share a path with a newer file.
    OverridePaths,
}

/// True when `path` is `root` or lies below it (component-wise).
pub fn is_under_root(path: &str, root: &str) -> bool {
    Path::new(path).starts_with(Path::new(root))
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Older(usize),
    Newer(usize),
}

/// Combine `newer` and `older` into a fresh builder.
pub fn merge_indexes(
    newer: &IndexView<'_>,
    older: &IndexView<'_>,
    policy: MergePolicy,
) -> Result<TrigramIndexBuilder, TrigramError> {
    let newer_paths = newer.file_paths()?;
    let newer_roots = newer.roots()?;
    let older_paths = older.file_paths()?;

    let superseded: AHashSet<&str> = newer_paths.iter().copied().collect();
    let dropped = |path: &str| {
        superseded.contains(path)
            || (policy == MergePolicy::OverrideRoots
                && newer_roots.iter().any(|root| is_under_root(path, root)))
    };

    let mut merged: Vec<(&str, Source)> = older_paths
        .iter()
        .enumerate()
        .filter(|(_, path)| !dropped(path))
        .map(|(id, path)| (*path, Source::Older(id)))
        .collect();
    merged.extend(
        newer_paths
            .iter()
            .enumerate()
            .map(|(id, path)| (*path, Source::Newer(id))),
    );
    merged.sort_by(|a, b| a.0.cmp(b.0));

    let mut builder = TrigramIndexBuilder::new();
    for root in older.roots()? {
        let covered = policy == MergePolicy::OverrideRoots
            && newer_roots.iter().any(|r| is_under_root(root, r));
        if !covered {
            builder.add_root(root);
        }
    }
    for root in &newer_roots {
        builder.add_root(root);
    }

    let mut older_map: Vec<Option<u32>> = vec![None; older_paths.len()];
    let mut newer_map: Vec<Option<u32>> = vec![None; newer_paths.len()];
    for (path, source) in merged {
        let id = builder.register_file(path)?;
        match source {
            Source::Older(old) => older_map[old] = Some(id),
            Source::Newer(new) => newer_map[new] = Some(id),
        }
    }

    for entry in older.posting_lists() {
        let (trigram, list) = entry?;
        builder.union_posting(trigram, &list.remap(&older_map));
    }
    for entry in newer.posting_lists() {
        let (trigram, list) = entry?;
        builder.union_posting(trigram, &list.remap(&newer_map));
    }

    Ok(builder)
}
