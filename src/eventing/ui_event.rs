//! UiEvent - Control Events Consumed by the Dashboard
//!
//! Each dashboard control emits one "selection changed" event carrying the
//! new literal value.

use crate::domain::filter::Dimension;

/// Selection events from the dashboard controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A dimension dropdown changed
    DimensionSelected {
        dimension: Dimension,
        value: String,
    },

    /// The year selector changed
    YearSelected { year: String },

    /// The competition overlay checkbox changed
    CompetitionToggled { enabled: bool },
}

impl UiEvent {
    pub fn dimension(dimension: Dimension, value: impl Into<String>) -> Self {
        Self::DimensionSelected {
            dimension,
            value: value.into(),
        }
    }

    pub fn year(year: impl Into<String>) -> Self {
        Self::YearSelected { year: year.into() }
    }
}
