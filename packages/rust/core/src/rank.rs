//! Ordering of filtered feed records by size.

use std::cmp::Ordering;

use protomerge_shared::RawRecord;

/// Stable sort by `tvl`, largest first.
///
/// Ties keep their input order, which decides first-seen precedence in the
/// merge. Records without a usable `tvl` (only exempt categories get this far
/// without one) sort after every record that has one.
pub fn rank(mut records: Vec<RawRecord>) -> Vec<RawRecord> {
    records.sort_by(|a, b| by_size_desc(size(a), size(b)));
    records
}

fn size(record: &RawRecord) -> Option<f64> {
    record.tvl.filter(|tvl| !tvl.is_nan())
}

fn by_size_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
