//! Layer Renderer Policy
//!
//! Derives map renderer descriptors from the selected year and, for the
//! routes layer, from live summary statistics of the filtered route set.

use crate::domain::config::{DashboardConfig, LayersConfig, OpacityTier};
use crate::domain::filter::FilterSnapshot;
use crate::domain::query::YearField;
use crate::domain::renderer::{Channel, RendererDescriptor, Stop, Symbol, VisualVariable};
use crate::services::SummaryStatistics;
use crate::utils::format::abbreviate_value;

const ROUTE_COLOR: &str = "#00c5ff";
const MARKET_OUTLINE: &str = "#d6d6d6";

/// Competition index bands: (upper value, color, legend)
const COMPETITION_STOPS: [(f64, &str, &str); 3] = [
    (1500.0, "#38a800", "Unconcentrated (< 1,500)"),
    (2500.0, "#ffaa00", "Moderately concentrated"),
    (4000.0, "#e60000", "Highly concentrated (> 2,500)"),
];

/// Route opacity stops when no statistics are available
const FALLBACK_ROUTE_STOPS: [(f64, f64); 3] = [(10000.0, 0.03), (30000.0, 0.25), (50000.0, 0.80)];

/// Three strictly increasing opacity breakpoints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityBreaks {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

/// Breakpoints from route statistics
///
/// `low = avg`, `mid = max / 2`, `high = max`; when the average is not below
/// the midpoint, `low` is pulled down to half the midpoint. Returns `None`
/// when there is nothing to scale against.
pub fn compute_route_opacity_breaks(stats: &SummaryStatistics) -> Option<OpacityBreaks> {
    if stats.count == 0 || stats.max <= 0.0 {
        return None;
    }
    let high = stats.max;
    let mid = high * 0.5;
    let mut low = stats.avg;
    if mid <= low {
        low = mid * 0.5;
    }
    Some(OpacityBreaks { low, mid, high })
}

/// Map renderer policy for the routes and markets layers
#[derive(Debug, Clone)]
pub struct LayerRendererPolicy {
    layers: LayersConfig,
    passengers_field: YearField,
    competition_field: YearField,
}

impl LayerRendererPolicy {
    pub fn new(layers: LayersConfig, dashboard: &DashboardConfig) -> Self {
        Self {
            layers,
            passengers_field: dashboard.passengers_field.clone(),
            competition_field: dashboard.competition_field.clone(),
        }
    }

    pub fn routes_layer(&self) -> &str {
        &self.layers.routes_layer
    }

    pub fn markets_layer(&self) -> &str {
        &self.layers.markets_layer
    }

    /// Minimum value counted in route statistics
    pub fn stats_min_value(&self) -> f64 {
        self.layers.stats_min_value
    }

    /// Passenger field for a year
    pub fn passengers_field(&self, year: &str) -> String {
        self.passengers_field.resolve(year)
    }

    /// Opacity tier for the number of matching routes
    pub fn opacity_tier(&self, count: u64) -> OpacityTier {
        if count < self.layers.sparse_route_count {
            self.layers.sparse_opacity
        } else if count > self.layers.dense_route_count {
            self.layers.dense_opacity
        } else {
            self.layers.default_opacity
        }
    }

    /// Routes renderer for the current selections and statistics
    pub fn route_renderer(
        &self,
        snapshot: &FilterSnapshot,
        stats: &SummaryStatistics,
    ) -> RendererDescriptor {
        let field = self.passengers_field(&snapshot.year);

        let stops = match compute_route_opacity_breaks(stats) {
            Some(breaks) => {
                let tier = self.opacity_tier(stats.count);
                vec![
                    Stop::opacity(breaks.low, tier.low).labelled(abbreviate_value(breaks.low)),
                    Stop::opacity(breaks.mid, tier.mid).labelled(abbreviate_value(breaks.mid)),
                    Stop::opacity(breaks.high, tier.high).labelled(abbreviate_value(breaks.high)),
                ]
            }
            None => FALLBACK_ROUTE_STOPS
                .iter()
                .map(|(value, opacity)| Stop::opacity(*value, *opacity))
                .collect(),
        };

        let mut visual_variables = vec![VisualVariable {
            channel: Channel::Opacity,
            field,
            stops,
        }];

        if snapshot.competition_overlay {
            visual_variables.push(VisualVariable {
                channel: Channel::Color,
                field: self.competition_field.resolve(&snapshot.year),
                stops: COMPETITION_STOPS
                    .iter()
                    .map(|(value, color, label)| Stop::color(*value, *color).labelled(*label))
                    .collect(),
            });
        }

        RendererDescriptor {
            symbol: Symbol::SimpleLine {
                color: ROUTE_COLOR.to_string(),
                width: 1.0,
            },
            visual_variables,
        }
    }

    /// Markets renderer bound to the year's passenger field
    pub fn market_renderer(&self, year: &str) -> RendererDescriptor {
        let field = self.passengers_field(year);
        RendererDescriptor {
            symbol: Symbol::SimpleMarker {
                color: [0, 0, 0, 0],
                outline_color: MARKET_OUTLINE.to_string(),
                outline_width: 1.0,
                size: 8.0,
            },
            visual_variables: vec![
                VisualVariable {
                    channel: Channel::Size,
                    field: field.clone(),
                    stops: vec![
                        Stop::size(100_000.0, 4.0).labelled("< 100,000"),
                        Stop::size(2_500_000.0, 17.0).labelled("1 million"),
                        Stop::size(5_000_000.0, 30.0).labelled("> 5 million"),
                    ],
                },
                VisualVariable {
                    channel: Channel::Opacity,
                    field,
                    stops: vec![
                        Stop::opacity(0.0, 0.30),
                        Stop::opacity(100_000.0, 0.60),
                        Stop::opacity(500_000.0, 0.90),
                    ],
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::renderer::StopParam;

    fn policy() -> LayerRendererPolicy {
        LayerRendererPolicy::new(LayersConfig::default(), &DashboardConfig::default())
    }

    fn stats(avg: f64, max: f64, count: u64) -> SummaryStatistics {
        SummaryStatistics { avg, max, count }
    }

    fn opacities(renderer: &RendererDescriptor) -> Vec<f64> {
        renderer
            .channel(Channel::Opacity)
            .expect("opacity")
            .stops
            .iter()
            .filter_map(|s| match s.param {
                StopParam::Opacity(o) => Some(o),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn average_above_midpoint_is_pulled_down() {
        let breaks = compute_route_opacity_breaks(&stats(1000.0, 1500.0, 50)).expect("breaks");
        assert_eq!(breaks, OpacityBreaks { low: 375.0, mid: 750.0, high: 1500.0 });
    }

    #[test]
    fn average_below_midpoint_kept() {
        let breaks = compute_route_opacity_breaks(&stats(200.0, 1000.0, 300)).expect("breaks");
        assert_eq!(breaks, OpacityBreaks { low: 200.0, mid: 500.0, high: 1000.0 });
    }

    #[test]
    fn breaks_always_increase() {
        for (avg, max) in [(1.0, 1.0), (0.0, 10.0), (9.0, 10.0), (5.0, 10.0), (123.4, 124.0)] {
            let b = compute_route_opacity_breaks(&stats(avg, max, 10)).expect("breaks");
            assert!(b.low < b.mid && b.mid < b.high, "{avg} {max} -> {b:?}");
        }
    }

    #[test]
    fn empty_stats_fall_back_to_static_stops() {
        assert_eq!(compute_route_opacity_breaks(&stats(0.0, 0.0, 0)), None);
        let renderer =
            policy().route_renderer(&FilterSnapshot::unfiltered("2019"), &stats(0.0, 0.0, 0));
        assert_eq!(opacities(&renderer), vec![0.03, 0.25, 0.80]);
    }

    #[test]
    fn tier_follows_route_count() {
        let policy = policy();
        let config = LayersConfig::default();
        assert_eq!(policy.opacity_tier(50), config.sparse_opacity);
        assert_eq!(policy.opacity_tier(100), config.default_opacity);
        assert_eq!(policy.opacity_tier(500), config.default_opacity);
        assert_eq!(policy.opacity_tier(501), config.dense_opacity);
    }

    #[test]
    fn sparse_routes_use_sparse_opacities() {
        let snapshot = FilterSnapshot::unfiltered("2019");
        let renderer = policy().route_renderer(&snapshot, &stats(1000.0, 1500.0, 50));
        let variable = renderer.channel(Channel::Opacity).expect("opacity");
        assert_eq!(variable.field, "pass_2019_7");
        let values: Vec<f64> = variable.stops.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![375.0, 750.0, 1500.0]);
        assert_eq!(opacities(&renderer), vec![0.30, 0.60, 0.90]);
    }

    #[test]
    fn competition_overlay_adds_color_channel() {
        let mut snapshot = FilterSnapshot::unfiltered("2018");
        let plain = policy().route_renderer(&snapshot, &stats(10.0, 100.0, 200));
        assert!(plain.channel(Channel::Color).is_none());

        snapshot.competition_overlay = true;
        let overlay = policy().route_renderer(&snapshot, &stats(10.0, 100.0, 200));
        let color = overlay.channel(Channel::Color).expect("color");
        assert_eq!(color.field, "hhi_2018");
        assert_eq!(color.stops.len(), 3);
        assert!(overlay.channel(Channel::Opacity).is_some());
    }

    #[test]
    fn market_renderer_tracks_year() {
        let renderer = policy().market_renderer("2017");
        assert_eq!(renderer.visual_variables.len(), 2);
        assert!(renderer.visual_variables.iter().all(|v| v.field == "pass_2017_7"));
        assert_eq!(
            renderer.channel(Channel::Size).expect("size").stops[1].label.as_deref(),
            Some("1 million")
        );
    }
}
