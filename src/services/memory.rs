//! In-Memory Feature Service
//!
//! Evaluates aggregation queries over feature rows held in memory. Backs
//! the command-line dashboard (rows loaded from a JSON dataset) and the
//! test suite.

use std::collections::BTreeMap;
use std::path::Path;

use ahash::{AHashMap, AHashSet};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::feature_service::{FeatureQueryService, SummaryStatistics};
use crate::domain::predicate::Predicate;
use crate::domain::query::{
    Aggregation, AggregationQuery, Row, SortDirection, value_as_f64, value_as_label,
};
use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: u64,
}

impl Accumulator {
    fn add(&mut self, value: Option<&Value>) {
        if matches!(value, None | Some(Value::Null)) {
            return;
        }
        self.sum += value_as_f64(value);
        self.count += 1;
    }

    fn finish(&self, kind: Aggregation) -> f64 {
        match kind {
            Aggregation::Sum => self.sum,
            Aggregation::Avg if self.count == 0 => 0.0,
            Aggregation::Avg => self.sum / self.count as f64,
        }
    }
}

/// Feature service over in-memory layers
pub struct MemoryFeatureService {
    /// Feature rows per layer
    layers: AHashMap<String, Vec<Row>>,
    /// Rows per query page
    max_record_count: usize,
    /// Active view filter per layer, as rendered text
    view_filters: RwLock<AHashMap<String, Option<String>>>,
}

impl MemoryFeatureService {
    /// Create a service with the given page size and no layers
    pub fn new(max_record_count: usize) -> Self {
        Self {
            layers: AHashMap::new(),
            max_record_count: max_record_count.max(1),
            view_filters: RwLock::new(AHashMap::new()),
        }
    }

    /// Add or replace a layer
    pub fn with_layer(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.layers.insert(name.into(), rows);
        self
    }

    /// Parse a dataset of the form `{"routes": [...], "markets": [...]}`
    pub fn from_json_str(json: &str, max_record_count: usize) -> Result<Self> {
        let layers: BTreeMap<String, Vec<Row>> = serde_json::from_str(json)?;
        Ok(layers
            .into_iter()
            .fold(Self::new(max_record_count), |service, (name, rows)| {
                service.with_layer(name, rows)
            }))
    }

    /// Load a dataset file
    pub fn from_json_path(path: impl AsRef<Path>, max_record_count: usize) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let service = Self::from_json_str(&content, max_record_count)?;
        tracing::info!(
            "Loaded dataset {} ({} layers)",
            path.as_ref().display(),
            service.layers.len()
        );
        Ok(service)
    }

    /// Text of the filter currently applied to a layer view
    pub fn view_filter(&self, layer: &str) -> Option<String> {
        self.view_filters.read().get(layer).cloned().flatten()
    }

    /// Number of features in a layer
    pub fn feature_count(&self, layer: &str) -> usize {
        self.layers.get(layer).map_or(0, Vec::len)
    }

    fn rows(&self, layer: &str) -> Result<&[Row]> {
        self.layers
            .get(layer)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::query(format!("unknown layer {layer}")))
    }

    fn matching<'a>(
        &'a self,
        layer: &str,
        predicate: Option<&'a Predicate>,
    ) -> Result<impl Iterator<Item = &'a Row> + 'a> {
        let rows = self.rows(layer)?;
        Ok(rows
            .iter()
            .filter(move |row| predicate.is_none_or(|p| p.matches(row))))
    }
}

#[async_trait]
impl FeatureQueryService for MemoryFeatureService {
    fn max_record_count(&self) -> usize {
        self.max_record_count
    }

    async fn query(&self, query: &AggregationQuery) -> Result<Vec<Row>> {
        let stats: Vec<_> = query.statistics().collect();

        // groups in first-seen order
        let mut order: Vec<String> = Vec::new();
        let mut groups: AHashMap<String, Vec<Accumulator>> = AHashMap::new();
        for row in self.matching(&query.layer, query.predicate.as_ref())? {
            let Some(label) = query.grouping.evaluate(row) else {
                continue;
            };
            let accumulators = groups.entry(label.clone()).or_insert_with(|| {
                order.push(label);
                vec![Accumulator::default(); stats.len()]
            });
            for (acc, stat) in accumulators.iter_mut().zip(&stats) {
                acc.add(row.get(&stat.on_field));
            }
        }

        let mut rows: Vec<Row> = order
            .into_iter()
            .filter_map(|label| {
                let accumulators = groups.remove(&label)?;
                let mut out = Row::new();
                out.insert(query.grouping.output_name().to_string(), Value::String(label));
                for (acc, stat) in accumulators.iter().zip(&stats) {
                    out.insert(stat.out_name.clone(), Value::from(acc.finish(stat.kind)));
                }
                Some(out)
            })
            .collect();

        if let Some(ordering) = &query.ordering {
            rows.sort_by(|a, b| {
                let (x, y) = (
                    value_as_f64(a.get(&ordering.field)),
                    value_as_f64(b.get(&ordering.field)),
                );
                match ordering.direction {
                    SortDirection::Asc => x.total_cmp(&y),
                    SortDirection::Desc => y.total_cmp(&x),
                }
            });
        }

        let limit = self
            .max_record_count
            .saturating_mul(query.record_ceiling_multiplier.unwrap_or(1).max(1) as usize);
        if rows.len() > limit {
            tracing::debug!(
                "Truncating {} groups to record cap {} for {}",
                rows.len(),
                limit,
                query.grouping.expression()
            );
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn distinct_values(&self, layer: &str, field: &str) -> Result<Vec<String>> {
        let mut seen = AHashSet::new();
        let mut values: Vec<String> = self
            .rows(layer)?
            .iter()
            .filter_map(|row| row.get(field).and_then(value_as_label))
            .filter(|v| !v.trim().is_empty())
            .filter(|v| seen.insert(v.clone()))
            .collect();
        values.sort();
        Ok(values)
    }

    async fn summary_statistics(
        &self,
        layer: &str,
        field: &str,
        predicate: Option<&Predicate>,
        min_value: f64,
    ) -> Result<SummaryStatistics> {
        let mut sum = 0.0;
        let mut max = f64::MIN;
        let mut count = 0u64;
        for row in self.matching(layer, predicate)? {
            let value = value_as_f64(row.get(field));
            if value < min_value {
                continue;
            }
            sum += value;
            max = max.max(value);
            count += 1;
        }

        if count == 0 {
            return Ok(SummaryStatistics::default());
        }
        Ok(SummaryStatistics {
            avg: sum / count as f64,
            max,
            count,
        })
    }

    async fn filter_layer(&self, layer: &str, predicate: Option<&Predicate>) -> Result<()> {
        self.rows(layer)?;
        self.view_filters
            .write()
            .insert(layer.to_string(), predicate.map(Predicate::to_sql));
        Ok(())
    }
}

impl std::fmt::Debug for MemoryFeatureService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFeatureService")
            .field("layers", &self.layers.keys().collect::<Vec<_>>())
            .field("max_record_count", &self.max_record_count)
            .finish()
    }
}
