//! Query - Aggregation Requests Sent to the Feature Service

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::predicate::{Predicate, quote_literal};

/// One feature row or grouped result row: output field name -> value
pub type Row = serde_json::Map<String, Value>;

/// Output field name used for the grouping label of a derived key
pub const GROUP_LABEL_FIELD: &str = "group_label";

/// A field name with a `{year}` placeholder, e.g. `pass_{year}_7`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearField(pub String);

impl YearField {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Resolve the concrete field for a year
    pub fn resolve(&self, year: &str) -> String {
        self.0.replace("{year}", year)
    }
}

/// Column or derived expression rows are bucketed by
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupingKey {
    /// A plain column that is already a readable label
    Column(String),
    /// `left || 'separator' || right`
    Concat {
        left: String,
        separator: String,
        right: String,
    },
}

impl GroupingKey {
    pub fn column(name: impl Into<String>) -> Self {
        GroupingKey::Column(name.into())
    }

    pub fn concat(
        left: impl Into<String>,
        separator: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        GroupingKey::Concat {
            left: left.into(),
            separator: separator.into(),
            right: right.into(),
        }
    }

    /// Textual expression for the service
    pub fn expression(&self) -> String {
        match self {
            GroupingKey::Column(name) => name.clone(),
            GroupingKey::Concat {
                left,
                separator,
                right,
            } => format!("{left} || {} || {right}", quote_literal(separator)),
        }
    }

    /// Name of the label field in result rows
    pub fn output_name(&self) -> &str {
        match self {
            GroupingKey::Column(name) => name,
            GroupingKey::Concat { .. } => GROUP_LABEL_FIELD,
        }
    }

    /// Evaluate against a raw feature row; `None` when a column is missing
    pub fn evaluate(&self, row: &Row) -> Option<String> {
        match self {
            GroupingKey::Column(name) => row.get(name).and_then(value_as_label),
            GroupingKey::Concat {
                left,
                separator,
                right,
            } => {
                let l = row.get(left).and_then(value_as_label)?;
                let r = row.get(right).and_then(value_as_label)?;
                Some(format!("{l}{separator}{r}"))
            }
        }
    }
}

/// Read a row value as a label
pub fn value_as_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a row value as a number; null and missing read as zero
pub fn value_as_f64(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Statistic kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Avg,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Avg => "avg",
        }
    }
}

/// One requested statistic
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatField {
    /// Field the statistic is computed on
    pub on_field: String,
    pub kind: Aggregation,
    /// Name of the statistic in result rows
    pub out_name: String,
}

impl StatField {
    pub fn new(
        on_field: impl Into<String>,
        kind: Aggregation,
        out_name: impl Into<String>,
    ) -> Self {
        Self {
            on_field: on_field.into(),
            kind,
            out_name: out_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Result ordering
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ordering {
    pub field: String,
    pub direction: SortDirection,
}

impl Ordering {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A single statistical request
///
/// Built fresh from the filter state on every refresh and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationQuery {
    /// Layer the statistics run against
    pub layer: String,
    pub grouping: GroupingKey,
    /// Primary statistic; its `out_name` is the ranked value
    pub value: StatField,
    /// Optional companion average
    pub secondary: Option<StatField>,
    pub predicate: Option<Predicate>,
    pub ordering: Option<Ordering>,
    /// Multiplies the service's default record cap
    pub record_ceiling_multiplier: Option<u32>,
}

impl AggregationQuery {
    /// All statistics requested, primary first
    pub fn statistics(&self) -> impl Iterator<Item = &StatField> {
        std::iter::once(&self.value).chain(self.secondary.iter())
    }

    /// Predicate text, `None` meaning unfiltered
    pub fn where_clause(&self) -> Option<String> {
        self.predicate.as_ref().map(Predicate::to_sql)
    }
}
