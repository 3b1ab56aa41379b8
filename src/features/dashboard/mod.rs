//! Dashboard Feature
//!
//! The controller owning the filter state and driving the map and chart
//! surfaces.

pub mod controller;

pub use controller::*;
