//! Map Layers Feature

pub mod policy;

pub use policy::*;
