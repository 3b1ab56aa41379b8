//! FilterState - Current Dashboard Selections
//!
//! The single source of truth for what the user has selected. Everything
//! else on the dashboard is derived from a [`FilterSnapshot`] of this state.

use ahash::{AHashMap, AHashSet};

use crate::domain::filter::{Dimension, FilterSnapshot};
use crate::error::{Error, Result};

/// Distinct values a dimension may take, in display order
#[derive(Debug, Clone, Default)]
pub struct DimensionCatalog {
    values: Vec<String>,
    index: AHashSet<String>,
}

impl DimensionCatalog {
    pub fn new(values: Vec<String>) -> Self {
        let index = values.iter().cloned().collect();
        Self { values, index }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn contains(&self, value: &str) -> bool {
        self.index.contains(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Mutable filter selections owned by the dashboard controller
#[derive(Debug, Clone)]
pub struct FilterState {
    current: FilterSnapshot,
    years: Vec<String>,
    catalogs: AHashMap<Dimension, DimensionCatalog>,
}

impl FilterState {
    /// All dimensions unconstrained, overlay off
    pub fn new(years: Vec<String>, initial_year: &str) -> Result<Self> {
        if !years.iter().any(|y| y == initial_year) {
            return Err(Error::invalid(format!("unknown year {initial_year}")));
        }
        Ok(Self {
            current: FilterSnapshot::unfiltered(initial_year),
            years,
            catalogs: AHashMap::new(),
        })
    }

    // ==================== Getters ====================

    /// Immutable copy of the current selections
    pub fn snapshot(&self) -> FilterSnapshot {
        self.current.clone()
    }

    pub fn current(&self) -> &FilterSnapshot {
        &self.current
    }

    pub fn years(&self) -> &[String] {
        &self.years
    }

    /// Selectable values for a dimension, sentinel excluded
    pub fn catalog(&self, dimension: Dimension) -> Option<&DimensionCatalog> {
        self.catalogs.get(&dimension)
    }

    // ==================== Setters ====================

    /// Replace the distinct values known for a dimension
    ///
    /// A selection no longer present falls back to the sentinel.
    pub fn set_catalog(&mut self, dimension: Dimension, values: Vec<String>) {
        let catalog = DimensionCatalog::new(values);
        if !self.current.is_unconstrained(dimension)
            && !catalog.contains(self.current.value(dimension))
        {
            tracing::debug!("Resetting {} selection no longer in catalog", dimension);
            self.current
                .replace(dimension, dimension.sentinel().to_string());
        }
        self.catalogs.insert(dimension, catalog);
    }

    /// Record a dimension selection and return the previous value
    ///
    /// The value must be the dimension's sentinel or one of its catalog
    /// values.
    pub fn set_dimension(&mut self, dimension: Dimension, value: &str) -> Result<String> {
        if value.trim().is_empty() {
            return Err(Error::invalid(format!("empty {dimension} selection")));
        }
        if value != dimension.sentinel()
            && !self
                .catalogs
                .get(&dimension)
                .is_some_and(|c| c.contains(value))
        {
            return Err(Error::UnknownValue {
                dimension: dimension.label().to_string(),
                value: value.to_string(),
            });
        }
        Ok(self.current.replace(dimension, value.to_string()))
    }

    /// Select a year and return the previous one
    pub fn set_year(&mut self, year: &str) -> Result<String> {
        if year.trim().is_empty() {
            return Err(Error::invalid("empty year selection"));
        }
        if !self.years.iter().any(|y| y == year) {
            return Err(Error::invalid(format!("unknown year {year}")));
        }
        Ok(std::mem::replace(&mut self.current.year, year.to_string()))
    }

    /// Toggle the competition overlay and return the previous flag
    pub fn set_competition_overlay(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.current.competition_overlay, enabled)
    }

    /// Return every dimension to its sentinel, keeping year and overlay
    pub fn clear_dimensions(&mut self) {
        for dimension in Dimension::ALL {
            self.current
                .replace(dimension, dimension.sentinel().to_string());
        }
    }
}
