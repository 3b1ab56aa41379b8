//! Predicate - Row Filter Expressions
//!
//! Filters are kept as a small AST and only turned into the feature
//! service's SQL-like text at the service boundary, where literals are
//! escaped.

use std::fmt;

use serde_json::Value;

use super::filter::FilterSnapshot;
use super::query::Row;

/// Boolean row filter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// `field = 'literal'`
    Equals { field: String, literal: String },
    /// Conjunction, rendered in order
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn equals(field: impl Into<String>, literal: impl Into<String>) -> Self {
        Predicate::Equals {
            field: field.into(),
            literal: literal.into(),
        }
    }

    /// Render to the service's textual form
    pub fn to_sql(&self) -> String {
        self.to_string()
    }

    /// Evaluate against a single feature row
    ///
    /// Missing fields never match. Numbers compare by their display form so
    /// a numeric airport code column still matches its literal.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Equals { field, literal } => match row.get(field) {
                Some(Value::String(s)) => s == literal,
                Some(Value::Number(n)) => n.to_string() == *literal,
                Some(Value::Bool(b)) => b.to_string() == *literal,
                _ => false,
            },
            Predicate::And(parts) => parts.iter().all(|p| p.matches(row)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals { field, literal } => {
                write!(f, "{field} = {}", quote_literal(literal))
            }
            Predicate::And(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    match part {
                        Predicate::And(_) => write!(f, "({part})")?,
                        _ => write!(f, "{part}")?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// Single-quote a literal, doubling embedded quotes
pub fn quote_literal(literal: &str) -> String {
    format!("'{}'", literal.replace('\'', "''"))
}

/// Build the row predicate for a filter snapshot
///
/// Returns `None` ("no constraint") when every dimension is at its sentinel.
/// The year never contributes a clause.
pub fn build_predicate(snapshot: &FilterSnapshot) -> Option<Predicate> {
    let mut clauses: Vec<Predicate> = snapshot
        .constraints()
        .map(|(dimension, value)| Predicate::equals(dimension.field(), value))
        .collect();

    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(Predicate::And(clauses)),
    }
}

/// Render an optional predicate, `None` meaning "do not filter"
pub fn render_predicate(predicate: Option<&Predicate>) -> Option<String> {
    predicate.map(Predicate::to_sql)
}
