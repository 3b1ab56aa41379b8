//! Config - Application Configuration

use serde::{Deserialize, Serialize};

use super::chart::{ChartTemplate, default_catalog};
use super::query::YearField;
use super::ranking::RankingConfig;
use crate::constants::{
    COMPETITION_FIELD_TEMPLATE, DEFAULT_YEARS, DENSE_ROUTE_COUNT, MARKETS_LAYER,
    PASSENGER_MILES_FIELD_TEMPLATE, PASSENGERS_FIELD_TEMPLATE, ROUTE_STATS_MIN_VALUE,
    ROUTES_LAYER, SERVICE_MAX_RECORD_COUNT, SPARSE_ROUTE_COUNT,
};
use crate::error::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Years and field templates
    pub dashboard: DashboardConfig,
    /// Default reducer tuning
    pub ranking: RankingConfig,
    /// Chart catalog; empty means the built-in catalog
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<ChartTemplate>,
    /// Map layer parameters
    pub layers: LayersConfig,
    /// In-memory feature service parameters
    pub service: ServiceConfig,
    /// Log output
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.dashboard.years.is_empty() {
            return Err(Error::invalid("dashboard.years must not be empty"));
        }
        if let Some(year) = &self.dashboard.default_year {
            if !self.dashboard.years.contains(year) {
                return Err(Error::invalid(format!(
                    "default_year {year} is not one of the configured years"
                )));
            }
        }
        if self.layers.sparse_route_count >= self.layers.dense_route_count {
            return Err(Error::invalid(
                "layers.sparse_route_count must be below layers.dense_route_count",
            ));
        }
        let charts = self.chart_templates();
        let mut ids: Vec<&str> = charts.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::invalid("chart ids must be unique"));
        }
        Ok(())
    }

    /// Configured charts, or the built-in catalog bound to `[dashboard]` fields
    pub fn chart_templates(&self) -> Vec<ChartTemplate> {
        if self.charts.is_empty() {
            default_catalog(&self.dashboard)
        } else {
            self.charts.clone()
        }
    }

    /// Year selected at startup
    pub fn initial_year(&self) -> Option<&str> {
        self.dashboard
            .default_year
            .as_deref()
            .or_else(|| self.dashboard.years.first().map(String::as_str))
    }
}

/// Years and year-suffixed fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Selectable years, in display order
    pub years: Vec<String>,
    /// Year selected at startup; first year when unset
    pub default_year: Option<String>,
    /// Passenger count field
    pub passengers_field: YearField,
    /// Passenger-miles field
    pub passenger_miles_field: YearField,
    /// Precomputed competition index field
    pub competition_field: YearField,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            years: DEFAULT_YEARS.iter().map(|y| y.to_string()).collect(),
            default_year: None,
            passengers_field: YearField::new(PASSENGERS_FIELD_TEMPLATE),
            passenger_miles_field: YearField::new(PASSENGER_MILES_FIELD_TEMPLATE),
            competition_field: YearField::new(COMPETITION_FIELD_TEMPLATE),
        }
    }
}

/// Opacity at the low, mid and high breakpoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpacityTier {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

/// Map layer parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayersConfig {
    pub routes_layer: String,
    pub markets_layer: String,
    /// Routes below this value are left out of summary statistics
    pub stats_min_value: f64,
    /// Fewer matching routes than this use the sparse tier
    pub sparse_route_count: u64,
    /// More matching routes than this use the dense tier
    pub dense_route_count: u64,
    pub sparse_opacity: OpacityTier,
    pub default_opacity: OpacityTier,
    pub dense_opacity: OpacityTier,
}

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            routes_layer: ROUTES_LAYER.to_string(),
            markets_layer: MARKETS_LAYER.to_string(),
            stats_min_value: ROUTE_STATS_MIN_VALUE,
            sparse_route_count: SPARSE_ROUTE_COUNT,
            dense_route_count: DENSE_ROUTE_COUNT,
            sparse_opacity: OpacityTier {
                low: 0.30,
                mid: 0.60,
                high: 0.90,
            },
            default_opacity: OpacityTier {
                low: 0.10,
                mid: 0.40,
                high: 0.80,
            },
            dense_opacity: OpacityTier {
                low: 0.03,
                mid: 0.25,
                high: 0.60,
            },
        }
    }
}

/// In-memory feature service parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Rows returned per query before any ceiling multiplier
    pub max_record_count: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_record_count: SERVICE_MAX_RECORD_COUNT,
        }
    }
}

/// Log output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    pub level: String,
    /// Directory for daily log files; stderr only when unset
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
