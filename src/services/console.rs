//! Console Surfaces
//!
//! Text-mode map and chart surfaces used by the command-line dashboard.
//! Each redraw prints the complete chart.

use std::io::Write;

use super::surfaces::{ChartSurface, ChartUpdate, MapSurface};
use crate::domain::renderer::RendererDescriptor;

/// Prints every chart redraw as a table
#[derive(Debug, Default)]
pub struct ConsoleChartSurface;

/// Text table for one chart redraw
fn chart_table(chart_id: &str, update: &ChartUpdate) -> String {
    let mut table = format!("\n== {} [{}] ==\n", update.title, chart_id);
    if update.is_empty() {
        table.push_str("  (no data)\n");
        return table;
    }
    let width = update.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    for (index, label) in update.labels.iter().enumerate() {
        let Some(data_label) = update.data_label(index) else {
            break;
        };
        table.push_str(&format!("  {label:<width$}  {data_label:>10}\n"));
    }
    table
}

impl ChartSurface for ConsoleChartSurface {
    fn render(&self, chart_id: &str, update: ChartUpdate) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let _ = out.write_all(chart_table(chart_id, &update).as_bytes());
    }
}

/// Prints every renderer swap as JSON
#[derive(Debug, Default)]
pub struct ConsoleMapSurface;

impl MapSurface for ConsoleMapSurface {
    fn set_renderer(&self, layer: &str, renderer: RendererDescriptor) {
        match serde_json::to_string(&renderer) {
            Ok(json) => println!("\n== renderer [{layer}] ==\n  {json}"),
            Err(e) => tracing::warn!("Failed to serialize renderer for {}: {}", layer, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::ChartKind;

    fn update(labels: &[&str], series: &[f64]) -> ChartUpdate {
        ChartUpdate {
            title: "Top Routes".to_string(),
            kind: ChartKind::Bar,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            series: series.to_vec(),
            secondary: vec![None; series.len()],
            total: series.iter().sum(),
        }
    }

    #[test]
    fn table_lists_every_datum() {
        let table = chart_table("routes", &update(&["ATL - LAX", "JFK - LAX"], &[500.0, 200.0]));
        assert!(table.contains("== Top Routes [routes] =="));
        assert!(table.contains("ATL - LAX"));
        assert!(table.contains("JFK - LAX"));
    }

    #[test]
    fn short_label_list_stops_at_last_label() {
        let table = chart_table("routes", &update(&["ATL - LAX"], &[500.0, 200.0, 100.0]));
        assert_eq!(table.lines().filter(|l| l.starts_with("  ")).count(), 1);
    }

    #[test]
    fn empty_update_says_so() {
        assert!(chart_table("routes", &update(&[], &[])).contains("(no data)"));
    }
}
