//! Merge and deduplication pipeline for protocol records.
//!
//! Stages, leaf first:
//! - [`domain`]: URL → scheme + registrable root domain
//! - [`filter`]: inclusion policy for feed records
//! - [`rank`](mod@rank): stable size-descending order
//! - [`merge`](mod@merge): one canonical record per root domain
//! - [`partition`](mod@partition): category buckets and file stems
//! - [`sink`]: where rendered outputs go
//! - [`pipeline`]: the end-to-end run tying them together

pub mod domain;
pub mod filter;
pub mod merge;
pub mod partition;
pub mod pipeline;
pub mod rank;
pub mod sink;

pub use domain::{ResolveError, ResolvedDomain, resolve};
pub use filter::{FilterOutcome, RecordFilter, Rejection, RejectionCounts};
pub use merge::{MergeOutcome, MergedSet, merge};
pub use partition::{CategoryBuckets, partition, partition_by_file_stem, sanitize_category};
pub use pipeline::{
    COMBINED_OUTPUT, Processed, ProgressReporter, RunConfig, RunReport, RunStats, SilentProgress,
    plan_outputs, process, run,
};
pub use rank::rank;
pub use sink::{DirectorySink, MemorySink, OutputFile, OutputSink, WriteReport, write_all};
