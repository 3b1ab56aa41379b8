//! Chart - Declarative Chart Templates
//!
//! Each ranking chart on the dashboard is one [`ChartTemplate`]. Templates are
//! data so new breakdowns are configuration, not code.

use serde::{Deserialize, Serialize};

use super::config::DashboardConfig;
use super::query::{Aggregation, GroupingKey, YearField};
use super::ranking::RankingConfig;
use crate::constants::{
    AIRLINE_FIELD, DEST_AIRPORT_FIELD, DEST_MARKET_FIELD, ORIGIN_AIRPORT_FIELD,
    ORIGIN_MARKET_FIELD, ROUTES_LAYER,
};

/// How the charting surface draws the series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Doughnut,
    Bar,
}

impl ChartKind {
    /// Whether each datum is a share of a whole
    pub fn is_proportional(&self) -> bool {
        matches!(self, ChartKind::Pie | ChartKind::Doughnut)
    }
}

/// Static description of one ranking chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTemplate {
    /// Stable chart identifier
    pub id: String,
    /// Title shown above the chart
    pub title: String,
    pub kind: ChartKind,
    /// Layer the statistics run against
    #[serde(default = "default_layer")]
    pub layer: String,
    pub grouping: GroupingKey,
    /// Year-suffixed value field
    pub value_field: YearField,
    #[serde(default = "default_aggregation")]
    pub aggregation: Aggregation,
    /// Optional field averaged alongside the value
    #[serde(default)]
    pub secondary_field: Option<YearField>,
    /// Reducer override; the dashboard default applies when absent
    #[serde(default)]
    pub ranking: Option<RankingConfig>,
    /// Shorten long airline names in labels
    #[serde(default)]
    pub abbreviate_labels: bool,
    /// Upper bound on the number of groups this chart can produce
    #[serde(default)]
    pub expected_groups: Option<usize>,
    /// Record cap multiplier used when `expected_groups` exceeds the cap
    #[serde(default)]
    pub record_ceiling_multiplier: Option<u32>,
}

fn default_layer() -> String {
    ROUTES_LAYER.to_string()
}

fn default_aggregation() -> Aggregation {
    Aggregation::Sum
}

impl ChartTemplate {
    /// Record cap multiplier for a service whose page holds `service_cap` rows
    ///
    /// Charts that can outgrow one page get the configured multiplier, or
    /// the smallest one that fits when none is configured.
    pub fn ceiling_multiplier(&self, service_cap: usize) -> Option<u32> {
        match self.expected_groups {
            Some(expected) if expected > service_cap => {
                let needed = expected.div_ceil(service_cap.max(1));
                let needed = u32::try_from(needed).unwrap_or(u32::MAX);
                Some(self.record_ceiling_multiplier.map_or(needed, |m| m.max(needed)))
            }
            Some(_) => None,
            None => self.record_ceiling_multiplier,
        }
    }

    fn new(
        id: &str,
        title: &str,
        kind: ChartKind,
        grouping: GroupingKey,
        value_field: &YearField,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            layer: default_layer(),
            grouping,
            value_field: value_field.clone(),
            aggregation: Aggregation::Sum,
            secondary_field: None,
            ranking: None,
            abbreviate_labels: false,
            expected_groups: None,
            record_ceiling_multiplier: None,
        }
    }
}

/// The built-in chart catalog, reading the dashboard's year fields
pub fn default_catalog(dashboard: &DashboardConfig) -> Vec<ChartTemplate> {
    let passengers = &dashboard.passengers_field;
    let airport = |code: &str, name: &str| GroupingKey::concat(code, " - ", name);

    vec![
        ChartTemplate {
            abbreviate_labels: true,
            ..ChartTemplate::new(
                "airline_passengers",
                "Passengers by Airline",
                ChartKind::Doughnut,
                GroupingKey::column(AIRLINE_FIELD),
                passengers,
            )
        },
        ChartTemplate {
            abbreviate_labels: true,
            ..ChartTemplate::new(
                "airline_passenger_miles",
                "Passenger Miles by Airline",
                ChartKind::Doughnut,
                GroupingKey::column(AIRLINE_FIELD),
                &dashboard.passenger_miles_field,
            )
        },
        ChartTemplate {
            ranking: Some(RankingConfig {
                cap_count: 10,
                minimum_share_percent: 0.0,
                append_others: false,
                trim_trailing_zeros: true,
            }),
            ..ChartTemplate::new(
                "origin_markets",
                "Top Origin Markets",
                ChartKind::Bar,
                GroupingKey::column(ORIGIN_MARKET_FIELD),
                passengers,
            )
        },
        ChartTemplate {
            ranking: Some(RankingConfig {
                cap_count: 10,
                minimum_share_percent: 0.0,
                append_others: false,
                trim_trailing_zeros: true,
            }),
            ..ChartTemplate::new(
                "dest_markets",
                "Top Destination Markets",
                ChartKind::Bar,
                GroupingKey::column(DEST_MARKET_FIELD),
                passengers,
            )
        },
        ChartTemplate {
            expected_groups: Some(3000),
            ..ChartTemplate::new(
                "origin_airports",
                "Passengers by Origin Airport",
                ChartKind::Pie,
                airport(ORIGIN_AIRPORT_FIELD, "origin_airport_name"),
                passengers,
            )
        },
        ChartTemplate {
            expected_groups: Some(3000),
            ..ChartTemplate::new(
                "dest_airports",
                "Passengers by Destination Airport",
                ChartKind::Pie,
                airport(DEST_AIRPORT_FIELD, "dest_airport_name"),
                passengers,
            )
        },
        ChartTemplate {
            secondary_field: Some(dashboard.competition_field.clone()),
            expected_groups: Some(20000),
            record_ceiling_multiplier: Some(10),
            ranking: Some(RankingConfig {
                cap_count: 10,
                minimum_share_percent: 0.0,
                append_others: false,
                trim_trailing_zeros: true,
            }),
            ..ChartTemplate::new(
                "routes",
                "Top Routes",
                ChartKind::Bar,
                GroupingKey::concat(ORIGIN_AIRPORT_FIELD, " - ", DEST_AIRPORT_FIELD),
                passengers,
            )
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let catalog = default_catalog(&DashboardConfig::default());
        let mut ids: Vec<_> = catalog.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn ceiling_only_raised_when_groups_exceed_cap() {
        let catalog = default_catalog(&DashboardConfig::default());
        let airports = catalog
            .iter()
            .find(|t| t.id == "origin_airports")
            .expect("origin_airports");
        assert_eq!(airports.ceiling_multiplier(2000), Some(2));
        assert_eq!(airports.ceiling_multiplier(5000), None);

        let routes = catalog.iter().find(|t| t.id == "routes").expect("routes");
        assert_eq!(routes.ceiling_multiplier(2000), Some(10));
        assert_eq!(routes.ceiling_multiplier(1000), Some(20));
    }

    #[test]
    fn template_parses_from_toml() {
        let template: ChartTemplate = toml::from_str(
            r#"
            id = "hubs"
            title = "Hubs"
            kind = "bar"
            grouping = { left = "origin", separator = " / ", right = "origin_market_name" }
            value_field = "pass_{year}_7"
            "#,
        )
        .expect("template");
        assert_eq!(template.layer, ROUTES_LAYER);
        assert_eq!(template.aggregation, Aggregation::Sum);
        assert_eq!(
            template.grouping,
            GroupingKey::concat("origin", " / ", "origin_market_name")
        );
    }

    #[test]
    fn catalog_follows_dashboard_fields() {
        let dashboard = DashboardConfig {
            passengers_field: YearField::new("pax_{year}"),
            passenger_miles_field: YearField::new("miles_{year}"),
            competition_field: YearField::new("index_{year}"),
            ..DashboardConfig::default()
        };
        let catalog = default_catalog(&dashboard);

        let miles = catalog
            .iter()
            .find(|t| t.id == "airline_passenger_miles")
            .expect("airline_passenger_miles");
        assert_eq!(miles.value_field.resolve("2018"), "miles_2018");

        let routes = catalog.iter().find(|t| t.id == "routes").expect("routes");
        assert_eq!(
            routes.secondary_field.as_ref().map(|f| f.resolve("2018")),
            Some("index_2018".to_string())
        );
        assert!(
            catalog
                .iter()
                .filter(|t| t.id != "airline_passenger_miles")
                .all(|t| t.value_field.resolve("2018") == "pax_2018")
        );
    }
}
