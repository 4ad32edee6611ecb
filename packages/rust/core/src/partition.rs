//! Grouping of canonical records into category buckets.

use std::collections::BTreeMap;

use protomerge_shared::CanonicalRecord;

/// Records per category label. A record with several categories appears in
/// several buckets; buckets borrow the records rather than copying them.
pub type CategoryBuckets<'a> = BTreeMap<String, Vec<&'a CanonicalRecord>>;

/// Bucket records by their original category labels.
///
/// Within a bucket, records keep the order of `records`.
pub fn partition(records: &[CanonicalRecord]) -> CategoryBuckets<'_> {
    group_by(records, str::to_string)
}

/// Bucket records by output file stem (see [`sanitize_category`]).
///
/// Labels that sanitize to the same stem, such as `"Liquid Staking"` and
/// `"Liquid-Staking"`, share one bucket and each record appears in it once.
pub fn partition_by_file_stem(records: &[CanonicalRecord]) -> CategoryBuckets<'_> {
    group_by(records, sanitize_category)
}

/// Turn a category label into a file-safe stem: every character that is not an
/// ASCII letter or digit becomes `_`, and the result is lower-cased.
pub fn sanitize_category(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn group_by<'a>(
    records: &'a [CanonicalRecord],
    key: impl Fn(&str) -> String,
) -> CategoryBuckets<'a> {
    let mut buckets = CategoryBuckets::new();

    for record in records {
        let mut keys: Vec<String> = Vec::with_capacity(record.category.len());
        for label in &record.category {
            let k = key(label.as_str());
            if !keys.contains(&k) {
                keys.push(k);
            }
        }
        for k in keys {
            buckets.entry(k).or_default().push(record);
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(url: &str, categories: &[&str]) -> CanonicalRecord {
        CanonicalRecord {
            url: url.into(),
            name: None,
            category: categories.iter().copied().collect(),
            icon: None,
            description: None,
        }
    }

    fn urls(bucket: &[&CanonicalRecord]) -> Vec<String> {
        bucket.iter().map(|r| r.url.clone()).collect()
    }

    #[test]
    fn multi_category_record_lands_in_every_bucket() {
        let records = vec![
            canonical("https://aave.com", &["Lending", "DeFi"]),
            canonical("https://uniswap.org", &["Dexes"]),
            canonical("https://curve.fi", &["Dexes", "Stablecoins"]),
        ];

        let buckets = partition(&records);
        assert_eq!(buckets.len(), 4);
        assert_eq!(urls(&buckets["Lending"]), ["https://aave.com"]);
        assert_eq!(urls(&buckets["DeFi"]), ["https://aave.com"]);
        assert_eq!(urls(&buckets["Dexes"]), ["https://uniswap.org", "https://curve.fi"]);
        assert_eq!(urls(&buckets["Stablecoins"]), ["https://curve.fi"]);
    }

    #[test]
    fn buckets_borrow_the_same_records() {
        let records = vec![canonical("https://aave.com", &["Lending", "DeFi"])];
        let buckets = partition(&records);
        assert!(std::ptr::eq(buckets["Lending"][0], &records[0]));
        assert!(std::ptr::eq(buckets["DeFi"][0], &records[0]));
    }

    #[test]
    fn records_without_categories_are_in_no_bucket() {
        let records = vec![canonical("https://aave.com", &[])];
        assert!(partition(&records).is_empty());
    }

    #[test]
    fn bucket_keys_are_the_original_labels() {
        let records = vec![canonical("https://lido.fi", &["Liquid Staking"])];
        let buckets = partition(&records);
        assert!(buckets.contains_key("Liquid Staking"));
    }

    #[test]
    fn sanitize_replaces_and_lowercases() {
        assert_eq!(sanitize_category("Liquid Staking"), "liquid_staking");
        assert_eq!(sanitize_category("RWA Lending"), "rwa_lending");
        assert_eq!(sanitize_category("Algo-Stables"), "algo_stables");
        assert_eq!(sanitize_category("NFT/Marketplace"), "nft_marketplace");
        assert_eq!(sanitize_category("Dexes"), "dexes");
        assert_eq!(sanitize_category("Crédit"), "cr_dit");
    }

    #[test]
    fn colliding_stems_share_a_bucket_without_duplicates() {
        let records = vec![
            canonical("https://lido.fi", &["Liquid Staking", "Liquid-Staking"]),
            canonical("https://rocketpool.net", &["Liquid-Staking"]),
            canonical("https://aave.com", &["Lending"]),
        ];

        let buckets = partition_by_file_stem(&records);
        assert_eq!(buckets.len(), 2);
        assert_eq!(
            urls(&buckets["liquid_staking"]),
            ["https://lido.fi", "https://rocketpool.net"]
        );
        assert_eq!(urls(&buckets["lending"]), ["https://aave.com"]);
    }
}
