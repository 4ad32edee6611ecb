//! End-to-end run: manual entries + feed → filter → rank → merge → partition → outputs.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, instrument, warn};

use protomerge_feed::{FeedSource, FetchOptions, load_feed, load_manual_entries};
use protomerge_shared::{CanonicalRecord, FilterPolicy, RawRecord, Result};

use crate::filter::{RecordFilter, RejectionCounts};
use crate::merge::merge;
use crate::partition::{partition, partition_by_file_stem};
use crate::rank::rank;
use crate::sink::{OutputFile, OutputSink, write_all};

/// Name of the output holding every canonical record.
pub const COMBINED_OUTPUT: &str = "combined";

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Where the feed comes from.
    pub feed: FeedSource,
    /// HTTP options for a remote feed.
    pub fetch: FetchOptions,
    /// Curated entries file; `None` skips manual entries entirely.
    pub manual_entries: Option<PathBuf>,
    /// Inclusion policy for feed records.
    pub policy: FilterPolicy,
}

/// Counters describing what happened to the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub manual_records: usize,
    pub feed_records: usize,
    /// Feed records that passed the filter.
    pub accepted: usize,
    pub rejected: RejectionCounts,
    /// Records whose URL had no resolvable root domain.
    pub dropped_unresolvable: usize,
    pub canonical_records: usize,
}

/// Merged records plus the counters that produced them.
#[derive(Debug, Clone)]
pub struct Processed {
    /// One record per root domain, in order of first appearance.
    pub records: Vec<CanonicalRecord>,
    pub stats: RunStats,
}

/// Result of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub stats: RunStats,
    /// Distinct category labels across all canonical records.
    pub categories: usize,
    pub files: Vec<OutputFile>,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _report: &RunReport) {}
}

/// The pure part of a run.
///
/// Feed records are filtered and ranked; manual entries skip both and are
/// placed first, so they win first-seen precedence in the merge.
pub fn process(manual: Vec<RawRecord>, feed: Vec<RawRecord>, filter: &RecordFilter) -> Processed {
    let mut stats = RunStats {
        manual_records: manual.len(),
        feed_records: feed.len(),
        ..RunStats::default()
    };

    let outcome = filter.apply(feed);
    stats.accepted = outcome.accepted.len();
    stats.rejected = outcome.rejected;

    let ranked = rank(outcome.accepted);
    let merged = merge(manual.into_iter().chain(ranked));

    stats.dropped_unresolvable = merged.dropped();
    stats.canonical_records = merged.len();

    Processed {
        records: merged.into_records(),
        stats,
    }
}

/// Name every output: the combined list plus one list per category file stem.
pub fn plan_outputs(records: &[CanonicalRecord]) -> BTreeMap<String, Vec<&CanonicalRecord>> {
    let mut outputs = BTreeMap::new();

    for (stem, bucket) in partition_by_file_stem(records) {
        let name = if stem == COMBINED_OUTPUT {
            let renamed = format!("category_{stem}");
            warn!(category = %stem, output = %renamed, "category file renamed to avoid the combined output");
            renamed
        } else {
            stem
        };
        outputs.insert(name, bucket);
    }

    outputs.insert(COMBINED_OUTPUT.to_string(), records.iter().collect());
    outputs
}

/// Run the full pipeline.
///
/// 1. Load manual entries (failures recovered as an empty set)
/// 2. Load the feed (failures are fatal)
/// 3. Filter, rank, merge
/// 4. Reset the sink and write every output, reporting all write failures together
///
/// The sink is only reset once the feed has been acquired, so a failed fetch
/// leaves the previous outputs in place.
#[instrument(skip_all, fields(feed = %config.feed))]
pub async fn run(
    config: &RunConfig,
    sink: &mut dyn OutputSink,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();

    progress.phase("Loading manual entries");
    let manual = match &config.manual_entries {
        Some(path) => load_manual_entries(path),
        None => Vec::new(),
    };

    progress.phase("Fetching protocol feed");
    let feed = load_feed(&config.feed, &config.fetch).await?;

    progress.phase("Filtering and merging");
    let filter = RecordFilter::new(config.policy.clone());
    let processed = process(manual, feed, &filter);
    let categories = partition(&processed.records).len();

    progress.phase("Writing outputs");
    let outputs = plan_outputs(&processed.records);
    sink.reset()?;
    let files = write_all(sink, &outputs).into_result()?;

    let report = RunReport {
        stats: processed.stats,
        categories,
        files,
        elapsed: start.elapsed(),
    };

    info!(
        canonical = report.stats.canonical_records,
        categories = report.categories,
        files = report.files.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "run complete"
    );
    progress.done(&report);

    Ok(report)
}
