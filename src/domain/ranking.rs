//! Ranking - Top-N plus Others Reduction
//!
//! Turns grouped query rows into a bounded, descending series. The same
//! reducer backs every ranking chart; only the field names and the
//! [`RankingConfig`] differ.

use serde::{Deserialize, Serialize};

use super::query::{Row, value_as_f64, value_as_label};
use crate::constants::{OTHERS_LABEL, RANKING_CAP_COUNT, RANKING_MIN_SHARE_PERCENT};

/// Reducer tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Maximum number of named entries
    pub cap_count: usize,
    /// Entries below this share of the total are cut when truncating
    pub minimum_share_percent: f64,
    /// Append an "Others" entry carrying the truncated mass
    pub append_others: bool,
    /// Drop zero-valued entries from the tail
    pub trim_trailing_zeros: bool,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            cap_count: RANKING_CAP_COUNT,
            minimum_share_percent: RANKING_MIN_SHARE_PERCENT,
            append_others: true,
            trim_trailing_zeros: true,
        }
    }
}

/// One labelled value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub label: String,
    pub value: f64,
    /// Synthetic "Others" bucket
    pub others: bool,
}

/// Ordered series, descending by value with an optional trailing Others
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedSeries {
    pub entries: Vec<RankedEntry>,
    /// Sum of every input value, kept or not
    pub total: f64,
}

impl RankedSeries {
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_others(&self) -> bool {
        self.entries.last().is_some_and(|e| e.others)
    }
}

/// Reduce grouped rows to a ranked series
///
/// Rows without a readable label are skipped; missing values count as zero.
pub fn reduce(
    rows: &[Row],
    name_field: &str,
    value_field: &str,
    config: &RankingConfig,
) -> RankedSeries {
    let pairs: Vec<(String, f64)> = rows
        .iter()
        .filter_map(|row| {
            let label = row.get(name_field).and_then(value_as_label)?;
            Some((label, value_as_f64(row.get(value_field))))
        })
        .collect();
    reduce_pairs(pairs, config)
}

/// Reduce already-projected `(label, value)` pairs
pub fn reduce_pairs(mut pairs: Vec<(String, f64)>, config: &RankingConfig) -> RankedSeries {
    // sort_by is stable: equal values keep their input order
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    let total: f64 = pairs.iter().map(|(_, v)| v).sum();

    let truncated = pairs.len() > config.cap_count;
    if truncated {
        pairs.truncate(config.cap_count);
        let threshold = total * config.minimum_share_percent / 100.0;
        if let Some(cut) = pairs.iter().position(|(_, v)| *v < threshold) {
            pairs.truncate(cut);
        }
    }

    let mut entries: Vec<RankedEntry> = pairs
        .into_iter()
        .map(|(label, value)| RankedEntry {
            label,
            value,
            others: false,
        })
        .collect();

    if config.append_others && truncated {
        let kept: f64 = entries.iter().map(|e| e.value).sum();
        entries.push(RankedEntry {
            label: OTHERS_LABEL.to_string(),
            value: total - kept,
            others: true,
        });
    }

    if config.trim_trailing_zeros {
        while entries.last().is_some_and(|e| e.value == 0.0) {
            entries.pop();
        }
    }

    RankedSeries { entries, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, f64)]) -> Vec<(String, f64)> {
        items.iter().map(|(l, v)| (l.to_string(), *v)).collect()
    }

    fn config(cap_count: usize, minimum_share_percent: f64) -> RankingConfig {
        RankingConfig {
            cap_count,
            minimum_share_percent,
            append_others: true,
            trim_trailing_zeros: true,
        }
    }

    #[test]
    fn top_three_with_others() {
        let series = reduce_pairs(
            pairs(&[("DL", 500.0), ("AA", 300.0), ("WN", 150.0), ("UA", 40.0), ("B6", 10.0)]),
            &config(3, 5.0),
        );
        assert_eq!(series.labels(), vec!["DL", "AA", "WN", "Others"]);
        assert_eq!(series.values(), vec![500.0, 300.0, 150.0, 50.0]);
        assert_eq!(series.total, 1000.0);
        assert!(series.has_others());
    }

    #[test]
    fn minimum_share_cuts_at_first_small_entry() {
        let series = reduce_pairs(
            pairs(&[("A", 900.0), ("B", 60.0), ("C", 20.0), ("D", 10.0), ("E", 10.0)]),
            &config(4, 5.0),
        );
        // threshold is 50: C falls below, so C and D go to Others
        assert_eq!(series.labels(), vec!["A", "B", "Others"]);
        assert_eq!(series.values(), vec![900.0, 60.0, 40.0]);
    }

    #[test]
    fn no_truncation_no_others_and_no_share_pruning() {
        let series = reduce_pairs(pairs(&[("A", 100.0), ("B", 1.0)]), &config(3, 50.0));
        assert_eq!(series.labels(), vec!["A", "B"]);
        assert!(!series.has_others());
    }

    #[test]
    fn ties_keep_input_order() {
        let series = reduce_pairs(
            pairs(&[("first", 10.0), ("big", 30.0), ("second", 10.0), ("third", 10.0)]),
            &config(10, 0.0),
        );
        assert_eq!(series.labels(), vec!["big", "first", "second", "third"]);
    }

    #[test]
    fn trailing_zeros_trimmed() {
        let series = reduce_pairs(
            pairs(&[("A", 5.0), ("B", 0.0), ("C", 0.0)]),
            &RankingConfig {
                cap_count: 5,
                ..config(5, 0.0)
            },
        );
        assert_eq!(series.labels(), vec!["A"]);

        // a zero Others bucket is trimmed as well
        let series = reduce_pairs(pairs(&[("A", 5.0), ("B", 3.0), ("C", 0.0)]), &config(2, 0.0));
        assert_eq!(series.labels(), vec!["A", "B"]);
    }

    #[test]
    fn zeros_kept_without_trim() {
        let series = reduce_pairs(
            pairs(&[("A", 5.0), ("B", 0.0)]),
            &RankingConfig {
                trim_trailing_zeros: false,
                ..config(5, 0.0)
            },
        );
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn bounded_and_mass_conserving() {
        let input: Vec<(String, f64)> = (0..40)
            .map(|i| (format!("k{i}"), ((i * 37) % 11) as f64 + 0.5))
            .collect();
        let sum: f64 = input.iter().map(|(_, v)| v).sum();
        for cap in [1usize, 3, 6, 7, 39, 40, 41] {
            let series = reduce_pairs(input.clone(), &config(cap, 3.0));
            assert!(series.len() <= cap + 1);
            let named: Vec<f64> = series
                .entries
                .iter()
                .filter(|e| !e.others)
                .map(|e| e.value)
                .collect();
            assert!(named.windows(2).all(|w| w[0] >= w[1]));
            if series.has_others() {
                let kept: f64 = series.values().iter().sum();
                assert!((kept - sum).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn reduces_rows_by_field_names() {
        let rows: Vec<Row> = [("DL", 2.0), ("AA", 3.0)]
            .iter()
            .map(|(name, value)| {
                let mut row = Row::new();
                row.insert("carrier".into(), (*name).into());
                row.insert("value".into(), (*value).into());
                row
            })
            .collect();
        let series = reduce(&rows, "carrier", "value", &RankingConfig::default());
        assert_eq!(series.labels(), vec!["AA", "DL"]);
    }

    #[test]
    fn empty_input() {
        let series = reduce_pairs(Vec::new(), &RankingConfig::default());
        assert!(series.is_empty());
        assert_eq!(series.total, 0.0);
    }
}
