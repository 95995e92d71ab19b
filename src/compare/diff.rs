//! Keyed differences and their statistics

use crate::domain::{value_text, MergedConfig, NOT_FOUND};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::ops::AddAssign;

/// How one key compares across the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffStatus {
    Same,
    Diff,
    /// Present only on side B.
    MissingInA,
    /// Present only on side A.
    MissingInB,
}

impl DiffStatus {
    pub fn classify(value_a: Option<&str>, value_b: Option<&str>) -> Option<Self> {
        match (value_a, value_b) {
            (Some(a), Some(b)) if a == b => Some(Self::Same),
            (Some(_), Some(_)) => Some(Self::Diff),
            (None, Some(_)) => Some(Self::MissingInA),
            (Some(_), None) => Some(Self::MissingInB),
            (None, None) => None,
        }
    }

    /// `SAME`, `DIFF` or `<label>-missing`.
    pub fn label(self, label_a: &str, label_b: &str) -> String {
        match self {
            Self::Same => "SAME".to_string(),
            Self::Diff => "DIFF".to_string(),
            Self::MissingInA => missing_label(label_a),
            Self::MissingInB => missing_label(label_b),
        }
    }
}

pub fn missing_label(label: &str) -> String {
    format!("{label}-missing")
}

/// One key's values and sources on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDifference {
    pub key: String,
    pub value_a: String,
    pub value_b: String,
    pub source_a: String,
    pub source_b: String,
    pub status: String,
    #[serde(skip)]
    pub kind: DiffStatus,
}

/// A side of a comparison: ordered `key -> (value text, source)`.
pub type Side = Vec<(String, String, String)>;

/// Diff two sides. Keys keep first-seen order (A, then B-only keys) before sorting
/// by status descending, then key ascending.
pub fn compute_differences(side_a: &Side, side_b: &Side, label_a: &str, label_b: &str) -> Vec<ConfigDifference> {
    let mut seen = BTreeSet::new();
    let keys: Vec<&String> = side_a
        .iter()
        .chain(side_b.iter())
        .map(|(key, _, _)| key)
        .filter(|key| seen.insert(key.as_str()))
        .collect();

    let index_a = index(side_a);
    let index_b = index(side_b);

    let mut differences = Vec::with_capacity(keys.len());
    for key in keys {
        let a = index_a.get(key.as_str()).map(|&(v, s)| (v.to_string(), s.to_string()));
        let b = index_b.get(key.as_str()).map(|&(v, s)| (v.to_string(), s.to_string()));
        let Some(kind) = DiffStatus::classify(
            a.as_ref().map(|(v, _)| v.as_str()),
            b.as_ref().map(|(v, _)| v.as_str()),
        ) else {
            continue;
        };
        let (value_a, source_a) = a.unwrap_or_else(|| (NOT_FOUND.to_string(), NOT_FOUND.to_string()));
        let (value_b, source_b) = b.unwrap_or_else(|| (NOT_FOUND.to_string(), NOT_FOUND.to_string()));
        differences.push(ConfigDifference {
            key: key.clone(),
            value_a,
            value_b,
            source_a,
            source_b,
            status: kind.label(label_a, label_b),
            kind,
        });
    }

    sort_differences(&mut differences);
    differences
}

fn index(side: &Side) -> HashMap<&str, (&str, &str)> {
    side.iter().map(|(k, v, s)| (k.as_str(), (v.as_str(), s.as_str()))).collect()
}

/// Status descending, byte-wise (`*-missing`, then `SAME`, then `DIFF`), then key ascending.
pub fn sort_differences(differences: &mut [ConfigDifference]) {
    differences.sort_by(|d1, d2| d2.status.cmp(&d1.status).then_with(|| d1.key.cmp(&d2.key)));
}

/// Side built from a raw file: every key carries the file label as its source.
pub fn side_from_flat<'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a serde_json::Value)>,
    source: &str,
) -> Side {
    entries.into_iter().map(|(k, v)| (k.clone(), value_text(v), source.to_string())).collect()
}

/// Side built from a merged configuration: every key carries its recorded source.
pub fn side_from_merged(merged: &MergedConfig) -> Side {
    merged.iter().map(|(k, v, s)| (k.clone(), value_text(v), s.to_string())).collect()
}

/// Counters for one comparison, labelled with the two profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonStatistics {
    pub label_a: String,
    pub label_b: String,
    pub total: usize,
    pub matched: usize,
    pub no_match: usize,
    pub missing_in_a: usize,
    pub missing_in_b: usize,
}

impl ComparisonStatistics {
    pub fn new(label_a: &str, label_b: &str) -> Self {
        Self {
            label_a: label_a.to_string(),
            label_b: label_b.to_string(),
            total: 0,
            matched: 0,
            no_match: 0,
            missing_in_a: 0,
            missing_in_b: 0,
        }
    }

    pub fn from_differences(differences: &[ConfigDifference], label_a: &str, label_b: &str) -> Self {
        let mut stats = Self::new(label_a, label_b);
        stats.total = differences.len();
        for diff in differences {
            match diff.kind {
                DiffStatus::Same => stats.matched += 1,
                DiffStatus::Diff => stats.no_match += 1,
                DiffStatus::MissingInA => stats.missing_in_a += 1,
                DiffStatus::MissingInB => stats.missing_in_b += 1,
            }
        }
        stats
    }

    /// `total == match + noMatch + both missing counters`.
    pub fn is_consistent(&self) -> bool {
        self.total == self.matched + self.no_match + self.missing_in_a + self.missing_in_b
    }
}

impl AddAssign<&ComparisonStatistics> for ComparisonStatistics {
    fn add_assign(&mut self, other: &ComparisonStatistics) {
        self.total += other.total;
        self.matched += other.matched;
        self.no_match += other.no_match;
        self.missing_in_a += other.missing_in_a;
        self.missing_in_b += other.missing_in_b;
    }
}

fn serialize_counters<M: SerializeMap>(map: &mut M, stats: &ComparisonStatistics) -> Result<(), M::Error> {
    map.serialize_entry("total", &stats.total)?;
    map.serialize_entry("match", &stats.matched)?;
    map.serialize_entry("noMatch", &stats.no_match)?;
    if stats.label_a == stats.label_b {
        map.serialize_entry(&missing_label(&stats.label_a), &(stats.missing_in_a + stats.missing_in_b))?;
    } else {
        map.serialize_entry(&missing_label(&stats.label_a), &stats.missing_in_a)?;
        map.serialize_entry(&missing_label(&stats.label_b), &stats.missing_in_b)?;
    }
    Ok(())
}

impl Serialize for ComparisonStatistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        serialize_counters(&mut map, self)?;
        map.end()
    }
}

/// Aggregate counters across applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateStatistics {
    pub total_apps: usize,
    pub counters: ComparisonStatistics,
}

impl AggregateStatistics {
    pub fn new(label_a: &str, label_b: &str) -> Self {
        Self { total_apps: 0, counters: ComparisonStatistics::new(label_a, label_b) }
    }

    pub fn include(&mut self, app_stats: &ComparisonStatistics) {
        self.total_apps += 1;
        self.counters += app_stats;
    }
}

impl Serialize for AggregateStatistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("totalApps", &self.total_apps)?;
        serialize_counters(&mut map, &self.counters)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn side(entries: &[(&str, &str)], source: &str) -> Side {
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string(), source.to_string())).collect()
    }

    #[test]
    fn test_classification() {
        assert_eq!(DiffStatus::classify(Some("1"), Some("1")), Some(DiffStatus::Same));
        assert_eq!(DiffStatus::classify(Some("1"), Some("2")), Some(DiffStatus::Diff));
        assert_eq!(DiffStatus::classify(None, Some("2")), Some(DiffStatus::MissingInA));
        assert_eq!(DiffStatus::classify(Some("1"), None), Some(DiffStatus::MissingInB));
        assert_eq!(DiffStatus::classify(None, None), None);
    }

    #[test]
    fn test_value_literally_not_found_is_still_present() {
        let a = side(&[("k", "NOT_FOUND")], "a.properties");
        let diffs = compute_differences(&a, &Side::new(), "uat", "prod");
        assert_eq!(diffs[0].status, "prod-missing");
    }

    #[test]
    fn test_differences_sorted_by_status_desc_then_key() {
        let a = side(&[("same", "1"), ("diff", "1"), ("only_a", "x"), ("b_same", "2")], "svc_uat.properties");
        let b = side(&[("same", "1"), ("diff", "2"), ("only_b", "y"), ("b_same", "2")], "svc_prod.properties");

        let diffs = compute_differences(&a, &b, "uat", "prod");
        let order: Vec<(&str, &str)> = diffs.iter().map(|d| (d.status.as_str(), d.key.as_str())).collect();
        assert_eq!(
            order,
            vec![
                ("uat-missing", "only_b"),
                ("prod-missing", "only_a"),
                ("SAME", "b_same"),
                ("SAME", "same"),
                ("DIFF", "diff"),
            ]
        );
        let only_b = &diffs[0];
        assert_eq!(only_b.value_a, NOT_FOUND);
        assert_eq!(only_b.source_a, NOT_FOUND);
        assert_eq!(only_b.value_b, "y");
        assert_eq!(only_b.source_b, "svc_prod.properties");
    }

    #[test]
    fn test_statistics_invariant() {
        let a = side(&[("k1", "1"), ("k2", "2"), ("k3", "3")], "a");
        let b = side(&[("k1", "1"), ("k2", "x"), ("k4", "4")], "b");
        let diffs = compute_differences(&a, &b, "uat", "prod");
        let stats = ComparisonStatistics::from_differences(&diffs, "uat", "prod");
        assert_eq!(stats.total, 4);
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.no_match, 1);
        assert_eq!(stats.missing_in_a, 1);
        assert_eq!(stats.missing_in_b, 1);
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_statistics_serialize_with_profile_labels() {
        let mut stats = ComparisonStatistics::new("uat", "prod");
        stats.total = 3;
        stats.matched = 1;
        stats.missing_in_a = 2;
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({"total": 3, "match": 1, "noMatch": 0, "uat-missing": 2, "prod-missing": 0})
        );

        let mut aggregate = AggregateStatistics::new("uat", "prod");
        aggregate.include(&stats);
        aggregate.include(&stats);
        assert_eq!(
            serde_json::to_value(&aggregate).unwrap(),
            json!({"totalApps": 2, "total": 6, "match": 2, "noMatch": 0, "uat-missing": 4, "prod-missing": 0})
        );
    }

    #[test]
    fn test_same_labels_collapse_missing_counter() {
        let mut stats = ComparisonStatistics::new("uat", "uat");
        stats.total = 2;
        stats.missing_in_a = 1;
        stats.missing_in_b = 1;
        let encoded = serde_json::to_value(&stats).unwrap();
        assert_eq!(encoded["uat-missing"], json!(2));
    }
}
