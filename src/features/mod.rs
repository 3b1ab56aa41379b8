//! Features - Vertical Feature Slices
//!
//! Each feature owns one part of the dashboard: chart bindings, map layer
//! renderers, and the controller tying them to the filter state.

pub mod charts;
pub mod dashboard;
pub mod layers;
