//! State - Mutable Dashboard State
//!
//! Follows a unidirectional data flow pattern:
//!
//! ```text
//! UI Event → Controller → FilterState → Snapshot → Predicate / Queries → Surfaces
//! ```

pub mod filter_state;

pub use filter_state::*;
