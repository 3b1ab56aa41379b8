//! Dashboard Events
//!
//! Observability stream published by the controller. Query failures are
//! reported here (and logged) instead of being drawn on the dashboard.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Events emitted while the dashboard applies filters and refreshes
#[derive(Clone, Debug)]
pub enum DashboardEvent {
    // ==================== Map ====================
    /// A layer view filter was applied; `None` shows everything
    LayerFiltered {
        layer: Arc<str>,
        predicate: Option<Arc<str>>,
    },

    /// A layer renderer was swapped
    RendererApplied { layer: Arc<str> },

    // ==================== Charts ====================
    /// A chart received a full redraw
    ChartRendered {
        chart_id: Arc<str>,
        generation: u64,
        entries: usize,
    },

    /// A response arrived after a newer request was issued and was dropped
    StaleResponseDiscarded {
        target: Arc<str>,
        generation: u64,
        latest: u64,
    },

    // ==================== Failures ====================
    /// A query failed; the affected visual keeps its last good state
    QueryFailed {
        /// Chart id or layer name
        target: Arc<str>,
        message: Arc<str>,
        at: DateTime<Utc>,
    },

    /// A selection event was ignored
    SelectionIgnored { reason: Arc<str> },
}

impl DashboardEvent {
    /// Create a failure event stamped now
    pub fn query_failed(target: impl Into<Arc<str>>, message: impl Into<Arc<str>>) -> Self {
        Self::QueryFailed {
            target: target.into(),
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::QueryFailed { .. })
    }
}
