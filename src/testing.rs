//! Test doubles shared by the unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use crate::domain::predicate::Predicate;
use crate::domain::query::{AggregationQuery, Row};
use crate::domain::renderer::RendererDescriptor;
use crate::error::{Error, Result};
use crate::services::{
    ChartSurface, ChartUpdate, FeatureQueryService, MapSurface, MemoryFeatureService,
    SummaryStatistics,
};

/// Chart surface that records every redraw
#[derive(Debug, Default)]
pub struct RecordingCharts {
    renders: Mutex<Vec<(String, ChartUpdate)>>,
}

impl RecordingCharts {
    pub fn last(&self, chart_id: &str) -> Option<ChartUpdate> {
        self.renders
            .lock()
            .iter()
            .rev()
            .find(|(id, _)| id == chart_id)
            .map(|(_, update)| update.clone())
    }

    pub fn count(&self, chart_id: &str) -> usize {
        self.renders.lock().iter().filter(|(id, _)| id == chart_id).count()
    }

    pub fn total(&self) -> usize {
        self.renders.lock().len()
    }
}

impl ChartSurface for RecordingCharts {
    fn render(&self, chart_id: &str, update: ChartUpdate) {
        self.renders.lock().push((chart_id.to_string(), update));
    }
}

/// Map surface that records every renderer swap
#[derive(Debug, Default)]
pub struct RecordingMap {
    renderers: Mutex<Vec<(String, RendererDescriptor)>>,
}

impl RecordingMap {
    pub fn last(&self, layer: &str) -> Option<RendererDescriptor> {
        self.renderers
            .lock()
            .iter()
            .rev()
            .find(|(l, _)| l == layer)
            .map(|(_, r)| r.clone())
    }

    pub fn count(&self, layer: &str) -> usize {
        self.renderers.lock().iter().filter(|(l, _)| l == layer).count()
    }
}

impl MapSurface for RecordingMap {
    fn set_renderer(&self, layer: &str, renderer: RendererDescriptor) {
        self.renderers.lock().push((layer.to_string(), renderer));
    }
}

/// Wraps the memory service; holds back queries whose predicate mentions a
/// needle until released, and can be switched to fail
pub struct GatedService {
    pub inner: MemoryFeatureService,
    needle: Option<String>,
    gate: Semaphore,
    failing: AtomicBool,
    queries: AtomicUsize,
}

impl GatedService {
    pub fn new(inner: MemoryFeatureService, needle: &str) -> Self {
        Self {
            inner,
            needle: Some(needle.to_string()),
            gate: Semaphore::new(0),
            failing: AtomicBool::new(false),
            queries: AtomicUsize::new(0),
        }
    }

    /// Never holds anything back
    pub fn open(inner: MemoryFeatureService) -> Self {
        Self {
            needle: None,
            ..Self::new(inner, "")
        }
    }

    /// Let every held and future query through
    pub fn release(&self) {
        self.gate.close();
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::query("service unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl FeatureQueryService for GatedService {
    fn max_record_count(&self) -> usize {
        self.inner.max_record_count()
    }

    async fn query(&self, query: &AggregationQuery) -> Result<Vec<Row>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let held = match (&self.needle, query.where_clause()) {
            (Some(needle), Some(clause)) => clause.contains(needle.as_str()),
            _ => false,
        };
        if held {
            // closed semaphore means released
            let _ = self.gate.acquire().await;
        }
        self.check()?;
        self.inner.query(query).await
    }

    async fn distinct_values(&self, layer: &str, field: &str) -> Result<Vec<String>> {
        self.check()?;
        self.inner.distinct_values(layer, field).await
    }

    async fn summary_statistics(
        &self,
        layer: &str,
        field: &str,
        predicate: Option<&Predicate>,
        min_value: f64,
    ) -> Result<SummaryStatistics> {
        self.check()?;
        self.inner
            .summary_statistics(layer, field, predicate, min_value)
            .await
    }

    async fn filter_layer(&self, layer: &str, predicate: Option<&Predicate>) -> Result<()> {
        self.check()?;
        self.inner.filter_layer(layer, predicate).await
    }
}

fn market(airport: &str) -> (&'static str, &'static str) {
    match airport {
        "ATL" => ("Atlanta, GA", "Hartsfield-Jackson Atlanta International"),
        "LAX" => ("Los Angeles, CA", "Los Angeles International"),
        "JFK" => ("New York City, NY", "John F. Kennedy International"),
        "ORD" => ("Chicago, IL", "Chicago O'Hare International"),
        "MDW" => ("Chicago, IL", "Chicago Midway International"),
        "DAL" => ("Dallas, TX", "Dallas Love Field"),
        "DFW" => ("Dallas, TX", "Dallas/Fort Worth International"),
        "SFO" => ("San Francisco, CA", "San Francisco International"),
        "SEA" => ("Seattle, WA", "Seattle/Tacoma International"),
        _ => ("Boston, MA", "Logan International"),
    }
}

fn route(carrier: &str, origin: &str, dest: &str, passengers: f64, hhi: f64) -> Row {
    let (origin_market, origin_name) = market(origin);
    let (dest_market, dest_name) = market(dest);
    let value = json!({
        "unique_carrier_name": carrier,
        "origin": origin,
        "origin_airport_name": origin_name,
        "origin_market_name": origin_market,
        "dest": dest,
        "dest_airport_name": dest_name,
        "dest_market_name": dest_market,
        "pass_2017_7": passengers * 0.8,
        "pass_2018_7": passengers * 0.9,
        "pass_2019_7": passengers,
        "rpm_2019_7": passengers * 1000.0,
        "hhi_2019": hhi,
    });
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// Routes for eight carriers; 2019 passenger total is 2,365,000
pub fn fixture_routes() -> Vec<Row> {
    vec![
        route("Delta Air Lines Inc.", "ATL", "LAX", 500_000.0, 3200.0),
        route("Delta Air Lines Inc.", "ATL", "JFK", 300_000.0, 2800.0),
        route("Delta Air Lines Inc.", "JFK", "LAX", 200_000.0, 1900.0),
        route("Southwest Airlines Co.", "DAL", "MDW", 250_000.0, 5000.0),
        route("Southwest Airlines Co.", "MDW", "ATL", 150_000.0, 2100.0),
        route("American Airlines Inc.", "ORD", "LAX", 200_000.0, 1700.0),
        route("American Airlines Inc.", "DFW", "ORD", 180_000.0, 2600.0),
        route("United Air Lines Inc.", "ORD", "SFO", 220_000.0, 2300.0),
        route("United Air Lines Inc.", "SFO", "BOS", 90_000.0, 1400.0),
        route("Alaska Airlines Inc.", "SEA", "LAX", 120_000.0, 2000.0),
        route("JetBlue Airways", "JFK", "BOS", 110_000.0, 2400.0),
        route("Spirit Air Lines", "ATL", "BOS", 40_000.0, 1200.0),
        route("Omni Air International LLC", "ATL", "DFW", 5_000.0, 10000.0),
    ]
}

fn market_row(name: &str, passengers: f64) -> Row {
    match json!({ "market_name": name, "pass_2019_7": passengers }) {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// Memory service with the fixture routes and a small markets layer
pub fn fixture_service() -> MemoryFeatureService {
    MemoryFeatureService::new(2000)
        .with_layer("routes", fixture_routes())
        .with_layer(
            "markets",
            vec![
                market_row("Atlanta, GA", 1_000_000.0),
                market_row("Chicago, IL", 650_000.0),
            ],
        )
}
