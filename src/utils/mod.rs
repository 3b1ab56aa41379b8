//! Utility functions

pub mod config_store;
pub mod format;
