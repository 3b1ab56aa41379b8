//! Charts Feature

pub mod binding;

pub use binding::*;
