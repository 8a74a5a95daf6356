use std::io;
use std::path::{Path, PathBuf};

use csearch_core::trigram::TrigramError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsearchError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Index(#[from] TrigramError),

    #[error("invalid {kind} pattern: {source}")]
    Pattern {
        kind: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("invalid pattern syntax: {0}")]
    Syntax(#[from] regex_syntax::Error),

    #[error("cannot determine home directory; set $CSEARCHINDEX or pass --index")]
    NoHomeDir,
}

pub type Result<T> = std::result::Result<T, CsearchError>;

impl CsearchError {
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        CsearchError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
