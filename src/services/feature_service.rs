//! Feature Query Service
//!
//! The narrow interface the dashboard needs from the spatial data service:
//! grouped statistics, distinct values, summary statistics and layer view
//! filters. Transport is the implementor's concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::predicate::Predicate;
use crate::domain::query::{AggregationQuery, Row};
use crate::error::Result;

/// Average, maximum and count of one field over a filtered feature set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub avg: f64,
    pub max: f64,
    pub count: u64,
}

/// External feature query service
#[async_trait]
pub trait FeatureQueryService: Send + Sync {
    /// Rows returned per query when no ceiling multiplier is given
    fn max_record_count(&self) -> usize;

    /// Execute a grouped statistics query
    ///
    /// Each row maps the grouping key's output name and every statistic's
    /// `out_name` to its value.
    async fn query(&self, query: &AggregationQuery) -> Result<Vec<Row>>;

    /// Distinct non-empty values of a field, sorted
    async fn distinct_values(&self, layer: &str, field: &str) -> Result<Vec<String>>;

    /// Statistics of `field` over features matching `predicate` whose value
    /// is at least `min_value`
    async fn summary_statistics(
        &self,
        layer: &str,
        field: &str,
        predicate: Option<&Predicate>,
        min_value: f64,
    ) -> Result<SummaryStatistics>;

    /// Narrow what a layer view displays; `None` shows every feature
    async fn filter_layer(&self, layer: &str, predicate: Option<&Predicate>) -> Result<()>;
}
