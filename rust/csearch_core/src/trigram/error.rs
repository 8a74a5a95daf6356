//! Error types for the trigram index.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during trigram index operations.
#[derive(Debug, Error)]
pub enum TrigramError {
    /// I/O error during index read/write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index file data is corrupted.
    #[error("corrupt index: {reason}")]
    CorruptIndex { reason: String },

    /// Invalid magic bytes or header checksum.
    #[error("invalid magic bytes in index header")]
    InvalidMagic,

    /// Index version does not match expected version.
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// Index file not found at expected path.
    #[error("index not found: {}", .0.display())]
    IndexNotFound(PathBuf),

    /// A path does not fit the on-disk string length field.
    #[error("path too long ({len} bytes, max {max}): {preview}")]
    PathTooLong {
        len: usize,
        max: usize,
        preview: String,
    },

    /// A section or posting list outgrew its on-disk length field.
    #[error("{what} too large for the index format ({size} bytes)")]
    TooLarge { what: &'static str, size: u64 },

    /// File id space of a single index is exhausted.
    #[error("too many files for one index (max {max})")]
    TooManyFiles { max: u32 },
}

impl TrigramError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        TrigramError::CorruptIndex {
            reason: reason.into(),
        }
    }

    pub(crate) fn path_too_long(path: &str) -> Self {
        let mut end = path.len().min(80);
        while !path.is_char_boundary(end) {
            end -= 1;
        }
        TrigramError::PathTooLong {
            len: path.len(),
            max: u16::MAX as usize,
            preview: path[..end].to_string(),
        }
    }
}
