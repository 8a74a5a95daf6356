//! Shard writer controller: feeds files into shards and rotates them.
//!
//! A session is one open shard. It begins lazily with the first file that
//! arrives while no shard is open, so a run with zero files produces zero
//! shards and a rotation never leaves an empty shard behind. Each finished
//! shard path is handed back to the caller for merging.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::store::ShardStore;

pub struct ShardWriter<S: ShardStore> {
    store: S,
    master: PathBuf,
    threshold: u64,
    next_seq: u32,
    open: Option<PathBuf>,
    session_bytes: u64,
    files_added: u64,
    bytes_added: u64,
}

impl<S: ShardStore> ShardWriter<S> {
    /// Shards are staged next to `master` and rotate once a session has
    /// consumed at least `threshold` bytes.
    pub fn new(store: S, master: impl Into<PathBuf>, threshold: u64) -> Self {
        ShardWriter {
            store,
            master: master.into(),
            threshold,
            next_seq: 0,
            open: None,
            session_bytes: 0,
            files_added: 0,
            bytes_added: 0,
        }
    }

    /// Staging path for shard `seq`: `<master>.shard<seq>~`.
    pub fn shard_path(&self, seq: u32) -> PathBuf {
        let mut name = self
            .master
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".shard{seq}~"));
        self.master.with_file_name(name)
    }

    /// Open a new shard at the next staging path.
    pub fn begin_session(&mut self) -> Result<()> {
        let target = self.shard_path(self.next_seq);
        self.store.create(&target)?;
        debug!(shard = %target.display(), "began shard");
        self.next_seq += 1;
        self.open = Some(target);
        self.session_bytes = 0;
        Ok(())
    }

    /// Index one file, returning the path of a shard finished by rotation.
    ///
    /// A file that cannot be read is logged and skipped; it does not count
    /// towards the rotation threshold.
    pub fn add_file(&mut self, path: &Path) -> Result<Option<PathBuf>> {
        if self.open.is_none() {
            self.begin_session()?;
        }
        match self.store.add_file(path) {
            Ok(bytes) => {
                self.session_bytes += bytes;
                self.bytes_added += bytes;
                self.files_added += 1;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping file");
                return Ok(None);
            }
        }
        self.maybe_rotate()
    }

    /// Flush the open shard if its session reached the threshold.
    pub fn maybe_rotate(&mut self) -> Result<Option<PathBuf>> {
        if self.open.is_none() || self.session_bytes < self.threshold {
            return Ok(None);
        }
        debug!(bytes = self.session_bytes, threshold = self.threshold, "rotating shard");
        self.close()
    }

    /// Flush the open shard, if any. Zero files means no shard.
    pub fn finish_session(&mut self) -> Result<Option<PathBuf>> {
        self.close()
    }

    fn close(&mut self) -> Result<Option<PathBuf>> {
        let Some(target) = self.open.take() else {
            return Ok(None);
        };
        self.store.flush()?;
        self.session_bytes = 0;
        Ok(Some(target))
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Bytes consumed by the open session.
    pub fn session_bytes(&self) -> u64 {
        self.session_bytes
    }

    /// Files successfully handed to the store over the writer's lifetime.
    pub fn files_added(&self) -> u64 {
        self.files_added
    }

    pub fn bytes_added(&self) -> u64 {
        self.bytes_added
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;

    use proptest::prelude::*;

    /// Store with synthetic file sizes; `None` simulates a read failure.
    #[derive(Default)]
    struct FakeStore {
        sizes: HashMap<PathBuf, Option<u64>>,
        open: Option<(PathBuf, Vec<PathBuf>)>,
        flushed: Vec<(PathBuf, Vec<PathBuf>)>,
        fail_create: bool,
    }

    impl ShardStore for FakeStore {
        fn create(&mut self, target: &Path) -> Result<()> {
            if self.fail_create {
                return Err(crate::error::CsearchError::io(
                    target,
                    io::Error::from(io::ErrorKind::PermissionDenied),
                ));
            }
            assert!(self.open.is_none(), "create while a shard is open");
            self.open = Some((target.to_path_buf(), Vec::new()));
            Ok(())
        }

        fn add_file(&mut self, path: &Path) -> io::Result<u64> {
            let size = self.sizes.get(path).copied().flatten();
            let size = size.ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
            let (_, files) = self.open.as_mut().expect("add_file without open shard");
            files.push(path.to_path_buf());
            Ok(size)
        }

        fn flush(&mut self) -> Result<()> {
            let shard = self.open.take().expect("flush without open shard");
            self.flushed.push(shard);
            Ok(())
        }
    }

    fn writer(sizes: &[Option<u64>], threshold: u64) -> (ShardWriter<FakeStore>, Vec<PathBuf>) {
        let mut store = FakeStore::default();
        let files: Vec<PathBuf> = (0..sizes.len())
            .map(|i| PathBuf::from(format!("/src/f{i:04}")))
            .collect();
        for (path, size) in files.iter().zip(sizes) {
            store.sizes.insert(path.clone(), *size);
        }
        (ShardWriter::new(store, "/idx/master", threshold), files)
    }

    fn run(sizes: &[Option<u64>], threshold: u64) -> (Vec<PathBuf>, FakeStore) {
        let (mut w, files) = writer(sizes, threshold);
        let mut finished = Vec::new();
        for file in &files {
            finished.extend(w.add_file(file).unwrap());
        }
        finished.extend(w.finish_session().unwrap());
        (finished, w.into_store())
    }

    #[test]
    fn test_zero_files_zero_shards() {
        let (finished, store) = run(&[], 10);
        assert!(finished.is_empty());
        assert!(store.flushed.is_empty());
    }

    #[test]
    fn test_rotation_at_threshold() {
        // 6 + 4 reaches 10 and rotates; the last file opens a second shard.
        let (finished, store) = run(&[Some(6), Some(4), Some(3)], 10);
        assert_eq!(
            finished,
            vec![
                PathBuf::from("/idx/master.shard0~"),
                PathBuf::from("/idx/master.shard1~"),
            ]
        );
        assert_eq!(store.flushed[0].1.len(), 2);
        assert_eq!(store.flushed[1].1.len(), 1);
    }

    #[test]
    fn test_no_empty_trailing_shard() {
        let (finished, store) = run(&[Some(5), Some(5)], 10);
        assert_eq!(finished.len(), 1);
        assert_eq!(store.flushed.len(), 1);
    }

    #[test]
    fn test_failed_read_does_not_count() {
        let (mut w, files) = writer(&[Some(4), None, Some(4)], 10);
        w.add_file(&files[0]).unwrap();
        assert_eq!(w.add_file(&files[1]).unwrap(), None);
        assert_eq!(w.session_bytes(), 4);
        w.add_file(&files[2]).unwrap();
        assert_eq!(w.session_bytes(), 8);
        assert_eq!(w.files_added(), 2);
    }

    #[test]
    fn test_create_failure_is_fatal() {
        let (mut w, files) = writer(&[Some(1)], 10);
        w.store.fail_create = true;
        assert!(w.add_file(&files[0]).is_err());
        assert!(!w.is_open());
    }

    #[test]
    fn test_shard_path_naming() {
        let (w, _) = writer(&[], 1);
        assert_eq!(w.shard_path(3), PathBuf::from("/idx/master.shard3~"));
    }

    proptest! {
        /// Every readable file lands in exactly one shard, in input order,
        /// and every shard except the last reached the threshold.
        #[test]
        fn prop_rotation_partitions_input(
            sizes in prop::collection::vec(prop::option::weighted(0.9, 0u64..50), 0..60),
            threshold in 1u64..120,
        ) {
            let (finished, store) = run(&sizes, threshold);
            prop_assert_eq!(finished.len(), store.flushed.len());

            let expected: Vec<PathBuf> = sizes
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_some())
                .map(|(i, _)| PathBuf::from(format!("/src/f{i:04}")))
                .collect();
            let got: Vec<PathBuf> = store.flushed.iter().flat_map(|(_, f)| f.clone()).collect();
            prop_assert_eq!(got, expected);

            let size_of = |p: &PathBuf| store_size(&sizes, p);
            for (i, (_, files)) in store.flushed.iter().enumerate() {
                let total: u64 = files.iter().map(size_of).sum();
                if i + 1 < store.flushed.len() {
                    prop_assert!(total >= threshold);
                    // Rotation happens as soon as the threshold is reached.
                    let before_last: u64 = files[..files.len() - 1].iter().map(size_of).sum();
                    prop_assert!(before_last < threshold);
                }
            }
        }
    }

    fn store_size(sizes: &[Option<u64>], path: &Path) -> u64 {
        let name = path.file_name().unwrap().to_str().unwrap();
        let idx: usize = name[1..].parse().unwrap();
        sizes[idx].unwrap()
    }
}
