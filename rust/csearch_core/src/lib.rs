//! `csearch_core`: the trigram index engine behind `cindex` and `csearch`.
//!
//! Everything here works on byte slices and in-memory structures; file I/O
//! (mmap, durable writes, directory walks) lives in the `csearch` crate.
//!
//! Modules:
//! - `trigram`: extraction, builder, binary format, index view, query, merge
//! - `search` : line-oriented content matching (literal + regex)

pub mod search;
pub mod trigram;
