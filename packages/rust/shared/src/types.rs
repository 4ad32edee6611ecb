//! Core domain types for protocol records.

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// CategorySet
// ---------------------------------------------------------------------------

/// An insertion-ordered, duplicate-free set of category labels.
///
/// Feed records carry a single category string while manual entries may carry
/// an array; both (and a missing or null value) deserialize into this one type,
/// so later stages never see the raw shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategorySet(Vec<String>);

impl CategorySet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label. Empty labels and duplicates are ignored.
    /// Returns `true` if the label was added.
    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if label.is_empty() || self.contains(&label) {
            return false;
        }
        self.0.push(label);
        true
    }

    /// Add every label of `other` not already present, keeping this set's order.
    pub fn union_with(&mut self, other: &CategorySet) {
        for label in other.iter() {
            self.insert(label.as_str());
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l == label)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Labels sorted alphabetically, for order-insensitive comparison.
    pub fn sorted(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.0.iter().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }
}

impl<S: Into<String>> FromIterator<S> for CategorySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for label in iter {
            set.insert(label);
        }
        set
    }
}

impl<'a> IntoIterator for &'a CategorySet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Accepted wire shapes for a `category` field.
#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryRepr {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for CategorySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let set = match Option::<CategoryRepr>::deserialize(deserializer)? {
            None => CategorySet::new(),
            Some(CategoryRepr::One(label)) => std::iter::once(label).collect(),
            Some(CategoryRepr::Many(labels)) => labels.into_iter().collect(),
        };
        Ok(set)
    }
}

// ---------------------------------------------------------------------------
// RawRecord
// ---------------------------------------------------------------------------

/// A protocol record as it arrives from the remote feed or the manual file.
///
/// Unknown fields are ignored; the feed carries many more than we use.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRecord {
    /// Protocol website. Must parse as an absolute URL to survive the merge.
    pub url: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Category labels, normalized from string/array/null.
    #[serde(default)]
    pub category: CategorySet,
    /// Chains the protocol is deployed on. `None` when the field is missing.
    #[serde(default)]
    pub chains: Option<Vec<String>>,
    /// Total value locked; used as the size threshold and the sort key.
    #[serde(default)]
    pub tvl: Option<f64>,
    /// Logo URL as published by the feed.
    #[serde(default)]
    pub logo: Option<String>,
    /// Icon URL, as curated manual entries usually name it.
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RawRecord {
    /// Create a bare record with a URL and name.
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The first non-empty of `logo` and `icon`.
    pub fn effective_icon(&self) -> Option<&str> {
        [self.logo.as_deref(), self.icon.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// CanonicalRecord
// ---------------------------------------------------------------------------

/// One merged record per root domain, as written to the output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Scheme plus root domain only, e.g. `https://aave.com`.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Union of every contributing record's categories.
    #[serde(default)]
    pub category: CategorySet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
