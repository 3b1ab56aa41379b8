//! Domain - Pure Data Structures
//!
//! These types carry no I/O and represent the dashboard's filter, query,
//! ranking and renderer vocabulary.

pub mod chart;
pub mod config;
pub mod filter;
pub mod predicate;
pub mod query;
pub mod ranking;
pub mod renderer;
