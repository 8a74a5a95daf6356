//! `csearch`: sharded index build/merge and concurrent multi-shard search.
//!
//! Indexing: [`paths`] collects roots, [`shard_writer`] feeds files through a
//! [`store::ShardStore`] and rotates shards, [`merge`] folds each finished
//! shard into the master. [`indexer`] wires the three together.
//!
//! Searching: [`plan`] compiles the pattern, [`fanout`] runs it over every
//! shard, [`report`] prints matches and tracks whether anything matched.
//!
//! The trigram engine itself lives in `csearch_core`.

pub mod config;
pub mod error;
pub mod fanout;
pub mod index;
pub mod indexer;
pub mod logging;
pub mod merge;
pub mod paths;
pub mod plan;
pub mod report;
pub mod shard_writer;
pub mod store;

pub use config::IndexLocation;
pub use error::{CsearchError, Result};
pub use fanout::{search_shards, FanoutMode, ShardSet};
pub use indexer::{list_roots, run_index, IndexOptions, IndexSummary};
pub use plan::{PlanOptions, SearchPlan};
pub use report::{ReportOptions, Reporter};
