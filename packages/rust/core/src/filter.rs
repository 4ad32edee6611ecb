//! Inclusion policy for feed records.
//!
//! Rules are checked in a fixed order and the first failing rule decides the
//! [`Rejection`]:
//!
//! 1. `chains` must be present and non-empty.
//! 2. Unless a category is exempt, `tvl` must be present and `>= min_size`.
//! 3. No category may be in the excluded set.
//! 4. At least one chain must be outside the disallowed set.

use protomerge_shared::{FilterPolicy, RawRecord};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// The rule a record failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingChains,
    BelowMinimumSize,
    ExcludedCategory,
    DisallowedChainsOnly,
}

/// Per-rule rejection tallies for one filter pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectionCounts {
    pub missing_chains: usize,
    pub below_minimum_size: usize,
    pub excluded_category: usize,
    pub disallowed_chains_only: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::MissingChains => self.missing_chains += 1,
            Rejection::BelowMinimumSize => self.below_minimum_size += 1,
            Rejection::ExcludedCategory => self.excluded_category += 1,
            Rejection::DisallowedChainsOnly => self.disallowed_chains_only += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_chains
            + self.below_minimum_size
            + self.excluded_category
            + self.disallowed_chains_only
    }
}

/// Records that passed, plus why the others did not.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub accepted: Vec<RawRecord>,
    pub rejected: RejectionCounts,
}

/// Applies a [`FilterPolicy`] to feed records.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    policy: FilterPolicy,
}

impl RecordFilter {
    pub fn new(policy: FilterPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FilterPolicy {
        &self.policy
    }

    /// Check a single record against the policy.
    pub fn evaluate(&self, record: &RawRecord) -> Result<(), Rejection> {
        let chains = match record.chains.as_deref() {
            Some(chains) if !chains.is_empty() => chains,
            _ => return Err(Rejection::MissingChains),
        };

        let exempt = record
            .category
            .iter()
            .any(|c| self.policy.exempt_categories.contains(c));
        if !exempt {
            match record.tvl {
                Some(tvl) if tvl >= self.policy.min_size => {}
                _ => return Err(Rejection::BelowMinimumSize),
            }
        }

        if record
            .category
            .iter()
            .any(|c| self.policy.excluded_categories.contains(c))
        {
            return Err(Rejection::ExcludedCategory);
        }

        if !chains
            .iter()
            .any(|chain| !self.policy.disallowed_chains.contains(chain))
        {
            return Err(Rejection::DisallowedChainsOnly);
        }

        Ok(())
    }

    /// Boolean form of [`evaluate`](Self::evaluate).
    pub fn accepts(&self, record: &RawRecord) -> bool {
        self.evaluate(record).is_ok()
    }

    /// Split `records` into the accepted ones (input order kept) and rejection counts.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn apply(&self, records: Vec<RawRecord>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for record in records {
            match self.evaluate(&record) {
                Ok(()) => outcome.accepted.push(record),
                Err(rejection) => {
                    debug!(url = %record.url, ?rejection, "record filtered out");
                    outcome.rejected.record(rejection);
                }
            }
        }

        info!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.total(),
            "feed filtered"
        );
        outcome
    }
}
