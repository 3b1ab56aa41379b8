//! Service Layer
//!
//! Seams to the external collaborators (feature query service, map and
//! chart surfaces) plus the implementations shipped with the crate.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   DashboardController                        │
//! └─────────────────────────────────────────────────────────────┘
//!            │ AggregationQuery         │ renderers / series
//!            ▼                          ▼
//! ┌──────────────────────┐  ┌───────────────────────────────────┐
//! │ FeatureQueryService  │  │   MapSurface   │   ChartSurface    │
//! │ (MemoryFeature...)   │  │  (Console...)  │   (Console...)    │
//! └──────────────────────┘  └───────────────────────────────────┘
//!            │
//!            ▼ DashboardEvent
//! ```

mod console;
mod events;
mod feature_service;
mod memory;
mod runtime;
mod surfaces;

pub use console::*;
pub use events::*;
pub use feature_service::*;
pub use memory::*;
pub use runtime::*;
pub use surfaces::*;
