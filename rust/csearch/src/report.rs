//! Result reporter: grep-style output for candidate files plus the global
//! match flag that decides the process exit status.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use csearch_core::search::{search_lines, SearchMode};
use memmap2::Mmap;
use parking_lot::Mutex;

/// Output switches, as in grep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// `-n`: prefix lines with their line number.
    pub line_numbers: bool,
    /// `-c`: print a match count per file instead of lines.
    pub count_only: bool,
    /// `-l`: print only the names of matching files.
    pub files_only: bool,
    /// `-h`: do not prefix output with file names.
    pub omit_file_names: bool,
}

/// Shared by every shard task; output for one file is written in a single
/// locked call, so lines from different files never interleave.
pub struct Reporter<W: Write + Send> {
    sink: Mutex<W>,
    matched: AtomicBool,
    options: ReportOptions,
}

impl<W: Write + Send> Reporter<W> {
    pub fn new(sink: W, options: ReportOptions) -> Self {
        Reporter {
            sink: Mutex::new(sink),
            matched: AtomicBool::new(false),
            options,
        }
    }

    /// Search one file and print its matches. Returns whether it matched.
    ///
    /// Non-regular and zero-byte files are skipped without a search.
    pub fn report_file(&self, path: &Path, matcher: &SearchMode) -> io::Result<bool> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() || meta.len() == 0 {
            return Ok(false);
        }
        let file = File::open(path)?;
        // SAFETY: Read-only mmap.
        let mmap = unsafe { Mmap::map(&file)? };

        let limit = if self.options.files_only { 1 } else { usize::MAX };
        let matches = search_lines(&mmap, matcher, limit);
        if matches.is_empty() {
            return Ok(false);
        }
        self.matched.store(true, Ordering::Release);

        let name = path.to_string_lossy();
        let mut out = Vec::new();
        if self.options.files_only {
            writeln!(out, "{name}")?;
        } else if self.options.count_only {
            if !self.options.omit_file_names {
                write!(out, "{name}:")?;
            }
            writeln!(out, "{}", matches.len())?;
        } else {
            for m in &matches {
                if !self.options.omit_file_names {
                    write!(out, "{name}:")?;
                }
                if self.options.line_numbers {
                    write!(out, "{}:", m.line)?;
                }
                out.extend_from_slice(m.content);
                out.push(b'\n');
            }
        }
        self.sink.lock().write_all(&out)?;
        Ok(true)
    }

    /// True once any file reported so far has matched.
    pub fn matched(&self) -> bool {
        self.matched.load(Ordering::Acquire)
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}
