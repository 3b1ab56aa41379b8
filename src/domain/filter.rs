//! Filter - Dimensions and Filter Snapshots

use serde::{Deserialize, Serialize};

use crate::constants::{
    AIRLINE_FIELD, ALL_AIRLINES, ALL_DEST_AIRPORTS, ALL_DEST_MARKETS, ALL_ORIGIN_AIRPORTS,
    ALL_ORIGIN_MARKETS, DEST_AIRPORT_FIELD, DEST_MARKET_FIELD, ORIGIN_AIRPORT_FIELD,
    ORIGIN_MARKET_FIELD,
};

/// One independently filterable row dimension
///
/// Year is not a dimension: it selects which field is read,
/// never which rows are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Airline,
    OriginMarket,
    OriginAirport,
    DestMarket,
    DestAirport,
}

impl Dimension {
    /// All dimensions in predicate clause order
    pub const ALL: [Dimension; 5] = [
        Dimension::Airline,
        Dimension::OriginMarket,
        Dimension::OriginAirport,
        Dimension::DestMarket,
        Dimension::DestAirport,
    ];

    /// The "All ..." sentinel meaning "unconstrained"
    pub fn sentinel(&self) -> &'static str {
        match self {
            Dimension::Airline => ALL_AIRLINES,
            Dimension::OriginMarket => ALL_ORIGIN_MARKETS,
            Dimension::OriginAirport => ALL_ORIGIN_AIRPORTS,
            Dimension::DestMarket => ALL_DEST_MARKETS,
            Dimension::DestAirport => ALL_DEST_AIRPORTS,
        }
    }

    /// Backing column in the feature service
    pub fn field(&self) -> &'static str {
        match self {
            Dimension::Airline => AIRLINE_FIELD,
            Dimension::OriginMarket => ORIGIN_MARKET_FIELD,
            Dimension::OriginAirport => ORIGIN_AIRPORT_FIELD,
            Dimension::DestMarket => DEST_MARKET_FIELD,
            Dimension::DestAirport => DEST_AIRPORT_FIELD,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Airline => "airline",
            Dimension::OriginMarket => "origin market",
            Dimension::OriginAirport => "origin airport",
            Dimension::DestMarket => "destination market",
            Dimension::DestAirport => "destination airport",
        }
    }

    fn index(&self) -> usize {
        match self {
            Dimension::Airline => 0,
            Dimension::OriginMarket => 1,
            Dimension::OriginAirport => 2,
            Dimension::DestMarket => 3,
            Dimension::DestAirport => 4,
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable copy of every filter selection at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSnapshot {
    /// Selected value per dimension, indexed in [`Dimension::ALL`] order
    values: [String; 5],
    /// Selected year, e.g. "2019"
    pub year: String,
    /// Whether the competition overlay is shown
    pub competition_overlay: bool,
}

impl FilterSnapshot {
    /// All dimensions at their sentinel, overlay off
    pub fn unfiltered(year: impl Into<String>) -> Self {
        Self {
            values: Dimension::ALL.map(|d| d.sentinel().to_string()),
            year: year.into(),
            competition_overlay: false,
        }
    }

    /// Current value of a dimension
    pub fn value(&self, dimension: Dimension) -> &str {
        &self.values[dimension.index()]
    }

    /// Whether a dimension is left at its sentinel
    pub fn is_unconstrained(&self, dimension: Dimension) -> bool {
        self.value(dimension) == dimension.sentinel()
    }

    /// Builder-style setter, mostly for tests and fixtures
    pub fn with(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.values[dimension.index()] = value.into();
        self
    }

    pub(crate) fn replace(&mut self, dimension: Dimension, value: String) -> String {
        std::mem::replace(&mut self.values[dimension.index()], value)
    }

    /// Constrained dimensions and their values, in clause order
    pub fn constraints(&self) -> impl Iterator<Item = (Dimension, &str)> {
        Dimension::ALL
            .into_iter()
            .filter(|d| !self.is_unconstrained(*d))
            .map(|d| (d, self.value(d)))
    }
}
