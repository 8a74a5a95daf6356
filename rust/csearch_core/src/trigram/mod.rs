//! Trigram inverted index in the style of Google Code Search.
//!
//! # Architecture
//!
//! - **extract**: Trigram extraction from byte content
//! - **builder**: In-memory index construction (roots, files, postings)
//! - **format**: Binary index header and section layout with CRC32 checks
//! - **writer**: Serialize a builder to bytes
//! - **view**: Validated, zero-copy view over serialized index bytes
//! - **posting**: Posting list operations using Roaring bitmaps
//! - **query**: Translate a regex syntax tree into a trigram query
//! - **merge**: Combine two serialized indexes into a new builder
//! - **error**: Error types
//!
//! The I/O layer (mmap, durable file writes) lives in `csearch::index`.

pub mod builder;
pub mod error;
pub mod extract;
pub mod format;
pub mod merge;
pub mod posting;
pub mod query;
pub mod view;
pub mod writer;

pub use builder::TrigramIndexBuilder;
pub use error::TrigramError;
pub use merge::{merge_indexes, MergePolicy};
pub use query::TrigramQuery;
pub use view::IndexView;
pub use writer::write_index;
