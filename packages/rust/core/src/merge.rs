//! Deduplication of records by root domain.
//!
//! Records are folded in order into a [`MergedSet`]. The first record seen for a
//! domain fixes the URL scheme, name and description; later records for the same
//! domain only add categories and fill an icon that is still missing.

use std::collections::HashMap;

use protomerge_shared::{CanonicalRecord, RawRecord};
use tracing::{debug, info, trace};

use crate::domain::{self, ResolveError};

/// What happened to one record during the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First record for its domain; a new canonical record was created.
    Created,
    /// Folded into an existing canonical record.
    Merged,
    /// URL could not be resolved; the record was skipped.
    Dropped(ResolveError),
}

/// Canonical records keyed by root domain, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct MergedSet {
    records: Vec<CanonicalRecord>,
    domains: Vec<String>,
    index: HashMap<String, usize>,
    dropped: usize,
}

impl MergedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the set.
    pub fn push(&mut self, record: RawRecord) -> MergeOutcome {
        let resolved = match domain::resolve(&record.url) {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!(url = %record.url, error = %e, "dropping record with unresolvable url");
                self.dropped += 1;
                return MergeOutcome::Dropped(e);
            }
        };

        if let Some(&slot) = self.index.get(&resolved.root_domain) {
            let existing = &mut self.records[slot];
            existing.category.union_with(&record.category);
            if existing.icon.is_none() {
                existing.icon = record.effective_icon().map(str::to_string);
            }
            trace!(domain = %resolved.root_domain, url = %record.url, "merged into existing record");
            return MergeOutcome::Merged;
        }

        let icon = record.effective_icon().map(str::to_string);
        let canonical = CanonicalRecord {
            url: resolved.origin(),
            name: record.name,
            category: record.category,
            icon,
            description: record.description,
        };

        self.index
            .insert(resolved.root_domain.clone(), self.records.len());
        self.domains.push(resolved.root_domain);
        self.records.push(canonical);
        MergeOutcome::Created
    }

    /// Canonical record for a root domain.
    pub fn get(&self, root_domain: &str) -> Option<&CanonicalRecord> {
        self.index.get(root_domain).map(|&slot| &self.records[slot])
    }

    /// `(root_domain, record)` pairs in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CanonicalRecord)> {
        self.domains
            .iter()
            .map(String::as_str)
            .zip(self.records.iter())
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CanonicalRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records skipped because their URL did not resolve.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Merge an ordered sequence of records into one canonical record per root domain.
pub fn merge<I>(records: I) -> MergedSet
where
    I: IntoIterator<Item = RawRecord>,
{
    let merged = records.into_iter().fold(MergedSet::new(), |mut set, record| {
        set.push(record);
        set
    });

    info!(
        canonical = merged.len(),
        dropped = merged.dropped(),
        "records merged by root domain"
    );
    merged
}
