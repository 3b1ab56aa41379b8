//! Rendering Surfaces
//!
//! Map and chart drawing is delegated. The dashboard only hands over
//! complete renderer descriptors and complete chart series; surfaces never
//! receive partial patches.

use serde::Serialize;

use crate::domain::chart::ChartKind;
use crate::domain::ranking::RankedSeries;
use crate::domain::renderer::RendererDescriptor;
use crate::utils::format::{abbreviate_value, format_number, format_percent};

/// Map layer rendering surface
pub trait MapSurface: Send + Sync {
    /// Swap a layer's renderer atomically
    fn set_renderer(&self, layer: &str, renderer: RendererDescriptor);
}

/// Charting surface
pub trait ChartSurface: Send + Sync {
    /// Replace a chart's labels, series and style, then redraw
    fn render(&self, chart_id: &str, update: ChartUpdate);
}

/// Everything a chart needs for one full redraw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartUpdate {
    pub title: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<f64>,
    /// Companion average per datum; `None` for Others
    pub secondary: Vec<Option<f64>>,
    /// Sum of every input value
    pub total: f64,
}

impl ChartUpdate {
    /// Build from a ranked series with display labels already applied
    pub fn from_series(
        title: impl Into<String>,
        kind: ChartKind,
        series: &RankedSeries,
        labels: Vec<String>,
        secondary: Vec<Option<f64>>,
    ) -> Self {
        Self {
            title: title.into(),
            kind,
            labels,
            series: series.values(),
            secondary,
            total: series.total,
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Text drawn on a datum: its share for pie/doughnut, else its value
    pub fn data_label(&self, index: usize) -> Option<String> {
        let value = *self.series.get(index)?;
        if self.kind.is_proportional() {
            Some(format_percent(value, self.total))
        } else {
            Some(abbreviate_value(value))
        }
    }

    /// Tooltip text for a datum
    pub fn tooltip(&self, index: usize) -> Option<String> {
        let label = self.labels.get(index)?;
        let value = *self.series.get(index)?;
        let mut text = format!(
            "{label}: {} ({})",
            format_number(value.round() as i64),
            format_percent(value, self.total)
        );
        if let Some(Some(secondary)) = self.secondary.get(index) {
            text.push_str(&format!(", avg {secondary:.0}"));
        }
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ranking::{RankingConfig, reduce_pairs};

    fn update(kind: ChartKind) -> ChartUpdate {
        let series = reduce_pairs(
            vec![("DL".to_string(), 1_500_000.0), ("AA".to_string(), 500_000.0)],
            &RankingConfig::default(),
        );
        ChartUpdate::from_series(
            "Passengers",
            kind,
            &series,
            series.labels(),
            vec![Some(2400.0), None],
        )
    }

    #[test]
    fn proportional_labels_show_share() {
        let update = update(ChartKind::Doughnut);
        assert_eq!(update.data_label(0).as_deref(), Some("75.0%"));
        assert_eq!(update.data_label(2), None);
    }

    #[test]
    fn bar_labels_show_value() {
        let update = update(ChartKind::Bar);
        assert_eq!(update.data_label(0).as_deref(), Some("1.50M"));
        assert_eq!(update.data_label(1).as_deref(), Some("500,000"));
    }

    #[test]
    fn tooltip_includes_secondary() {
        let update = update(ChartKind::Bar);
        assert_eq!(
            update.tooltip(0).as_deref(),
            Some("DL: 1,500,000 (75.0%), avg 2400")
        );
        assert_eq!(update.tooltip(1).as_deref(), Some("AA: 500,000 (25.0%)"));
    }
}
