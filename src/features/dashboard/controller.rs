//! Dashboard Controller
//!
//! Owns the [`FilterState`] and turns every UI event into one transition:
//!
//! 1. update the filter state
//! 2. rebuild the predicate and apply it to the routes layer view filter
//! 3. recompute the routes renderer from fresh statistics (the markets
//!    renderer is re-pointed directly on year changes)
//! 4. refresh every chart binding
//!
//! All work after step 1 is spawned; the returned [`Refresh`] can be awaited
//! by callers that need to know when the dashboard has settled.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Receiver;
use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::domain::config::AppConfig;
use crate::domain::filter::{Dimension, FilterSnapshot};
use crate::domain::predicate::{Predicate, build_predicate, render_predicate};
use crate::domain::renderer::RendererDescriptor;
use crate::error::{Error, Result};
use crate::eventing::UiEvent;
use crate::features::charts::{ChartBinding, RefreshContext, RefreshOutcome};
use crate::features::layers::LayerRendererPolicy;
use crate::services::{ChartSurface, DashboardEvent, FeatureQueryService, MapSurface, spawn_named};
use crate::state::FilterState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Start,
    Dimension,
    Year,
    Overlay,
    Reset,
}

impl Transition {
    fn repoints_markets(self) -> bool {
        matches!(self, Self::Start | Self::Year)
    }
}

/// Handles to the work spawned by one transition
#[derive(Debug, Default)]
pub struct Refresh {
    pub layers: Vec<JoinHandle<()>>,
    pub charts: Vec<(String, JoinHandle<RefreshOutcome>)>,
}

impl Refresh {
    /// Nothing was spawned
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.charts.is_empty()
    }

    /// Wait for every spawned task and collect chart outcomes
    pub async fn settled(self) -> Vec<(String, RefreshOutcome)> {
        for result in join_all(self.layers).await {
            if let Err(e) = result {
                tracing::warn!("Layer task aborted: {}", e);
            }
        }

        let (ids, handles): (Vec<String>, Vec<_>) = self.charts.into_iter().unzip();
        ids.into_iter()
            .zip(join_all(handles).await)
            .map(|(id, result)| {
                let outcome = result.unwrap_or_else(|e| RefreshOutcome::Failed {
                    message: e.to_string(),
                });
                (id, outcome)
            })
            .collect()
    }
}

/// Dashboard state machine
pub struct DashboardController {
    filter: FilterState,
    policy: Arc<LayerRendererPolicy>,
    bindings: Vec<Arc<ChartBinding>>,
    ctx: RefreshContext,
    map: Arc<dyn MapSurface>,
    layer_generation: Arc<AtomicU64>,
    /// Markets renderer last handed to the map
    markets_renderer: Option<RendererDescriptor>,
    events: Receiver<DashboardEvent>,
}

impl DashboardController {
    pub fn new(
        config: &AppConfig,
        service: Arc<dyn FeatureQueryService>,
        map: Arc<dyn MapSurface>,
        charts: Arc<dyn ChartSurface>,
    ) -> Result<Self> {
        config.validate()?;
        let initial_year = config
            .initial_year()
            .ok_or_else(|| Error::invalid("no year configured"))?;
        let filter = FilterState::new(config.dashboard.years.clone(), initial_year)?;

        let bindings = config
            .chart_templates()
            .into_iter()
            .map(|template| Arc::new(ChartBinding::new(template, config.ranking)))
            .collect();

        let (sender, events) = crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            filter,
            policy: Arc::new(LayerRendererPolicy::new(
                config.layers.clone(),
                &config.dashboard,
            )),
            bindings,
            ctx: RefreshContext {
                service,
                charts,
                events: sender,
            },
            map,
            layer_generation: Arc::new(AtomicU64::new(0)),
            markets_renderer: None,
            events,
        })
    }

    // ==================== Getters ====================

    /// Observability stream
    pub fn events(&self) -> &Receiver<DashboardEvent> {
        &self.events
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn bindings(&self) -> &[Arc<ChartBinding>] {
        &self.bindings
    }

    // ==================== Startup ====================

    /// Fetch the selectable values of every dimension
    ///
    /// A failed fetch leaves that dimension's catalog empty; only its
    /// sentinel can then be selected.
    pub async fn load_catalogs(&mut self) {
        let layer = self.policy.routes_layer().to_string();
        for dimension in Dimension::ALL {
            match self
                .ctx
                .service
                .distinct_values(&layer, dimension.field())
                .await
            {
                Ok(values) => {
                    tracing::debug!("Loaded {} {} values", values.len(), dimension);
                    self.filter.set_catalog(dimension, values);
                }
                Err(e) => {
                    tracing::warn!("Failed to load {} values: {}", dimension, e);
                    self.ctx.emit(DashboardEvent::query_failed(
                        dimension.field(),
                        e.to_string(),
                    ));
                }
            }
        }
    }

    /// Load catalogs and draw the initial dashboard
    pub async fn start(&mut self) -> Refresh {
        self.load_catalogs().await;
        tracing::info!(
            "Starting dashboard: year {}, {} charts",
            self.filter.current().year,
            self.bindings.len()
        );
        self.apply(Transition::Start)
    }

    // ==================== Transitions ====================

    /// Dispatch a control event
    pub fn handle(&mut self, event: UiEvent) -> Refresh {
        match event {
            UiEvent::DimensionSelected { dimension, value } => {
                self.select_dimension(dimension, &value)
            }
            UiEvent::YearSelected { year } => self.select_year(&year),
            UiEvent::CompetitionToggled { enabled } => self.set_competition_overlay(enabled),
        }
    }

    pub fn select_dimension(&mut self, dimension: Dimension, value: &str) -> Refresh {
        match self.filter.set_dimension(dimension, value) {
            Ok(previous) if previous == value => Refresh::none(),
            Ok(_) => {
                tracing::info!("{} -> {}", dimension, value);
                self.apply(Transition::Dimension)
            }
            Err(e) => self.ignore(e),
        }
    }

    pub fn select_year(&mut self, year: &str) -> Refresh {
        match self.filter.set_year(year) {
            Ok(previous) if previous == year => Refresh::none(),
            Ok(_) => {
                tracing::info!("Year -> {}", year);
                self.apply(Transition::Year)
            }
            Err(e) => self.ignore(e),
        }
    }

    pub fn set_competition_overlay(&mut self, enabled: bool) -> Refresh {
        if self.filter.set_competition_overlay(enabled) == enabled {
            return Refresh::none();
        }
        tracing::info!("Competition overlay -> {}", enabled);
        self.apply(Transition::Overlay)
    }

    /// Return every dimension to its sentinel
    pub fn reset(&mut self) -> Refresh {
        if Dimension::ALL
            .iter()
            .all(|d| self.filter.current().is_unconstrained(*d))
        {
            return Refresh::none();
        }
        self.filter.clear_dimensions();
        tracing::info!("Selections reset");
        self.apply(Transition::Reset)
    }

    /// Refresh every chart for the current selections
    pub fn refresh_all(&self) -> Vec<(String, JoinHandle<RefreshOutcome>)> {
        let snapshot = self.filter.snapshot();
        let predicate = build_predicate(&snapshot);
        self.refresh_charts(&snapshot, predicate)
    }

    fn ignore(&self, error: Error) -> Refresh {
        tracing::debug!("Ignoring selection: {}", error);
        self.ctx.emit(DashboardEvent::SelectionIgnored {
            reason: error.to_string().into(),
        });
        Refresh::none()
    }

    fn refresh_charts(
        &self,
        snapshot: &FilterSnapshot,
        predicate: Option<Predicate>,
    ) -> Vec<(String, JoinHandle<RefreshOutcome>)> {
        self.bindings
            .iter()
            .map(|binding| {
                let handle = binding.refresh(snapshot, predicate.clone(), &self.ctx);
                (binding.id().to_string(), handle)
            })
            .collect()
    }

    fn apply(&mut self, transition: Transition) -> Refresh {
        let snapshot = self.filter.snapshot();
        let predicate = build_predicate(&snapshot);

        if transition.repoints_markets() {
            self.repoint_markets(&snapshot.year);
        }

        let layers = vec![self.spawn_routes_layer(snapshot.clone(), predicate.clone())];
        let charts = self.refresh_charts(&snapshot, predicate);

        Refresh { layers, charts }
    }

    /// Point the markets renderer at the year's passenger field
    ///
    /// No statistics are needed; an existing renderer only has its field
    /// swapped.
    fn repoint_markets(&mut self, year: &str) {
        let renderer = match self.markets_renderer.take() {
            Some(current) => current.with_field(&self.policy.passengers_field(year)),
            None => self.policy.market_renderer(year),
        };
        self.markets_renderer = Some(renderer.clone());

        let layer = self.policy.markets_layer();
        self.map.set_renderer(layer, renderer);
        self.ctx.emit(DashboardEvent::RendererApplied {
            layer: layer.into(),
        });
    }

    /// Apply the view filter, then rebuild the routes renderer from statistics
    fn spawn_routes_layer(
        &self,
        snapshot: FilterSnapshot,
        predicate: Option<Predicate>,
    ) -> JoinHandle<()> {
        let generation = self.layer_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.layer_generation);
        let policy = Arc::clone(&self.policy);
        let map = Arc::clone(&self.map);
        let ctx = self.ctx.clone();

        spawn_named(format!("layer:{}", policy.routes_layer()), async move {
            let layer = policy.routes_layer();
            let is_stale = || {
                let current = latest.load(Ordering::SeqCst);
                if current != generation {
                    tracing::debug!(
                        "Discarding stale layer update #{} for {} (latest #{})",
                        generation,
                        layer,
                        current
                    );
                    ctx.emit(DashboardEvent::StaleResponseDiscarded {
                        target: layer.into(),
                        generation,
                        latest: current,
                    });
                    return true;
                }
                false
            };

            if is_stale() {
                return;
            }
            match ctx.service.filter_layer(layer, predicate.as_ref()).await {
                Ok(()) => ctx.emit(DashboardEvent::LayerFiltered {
                    layer: layer.into(),
                    predicate: render_predicate(predicate.as_ref()).map(Into::into),
                }),
                Err(e) => {
                    tracing::warn!("Filtering layer {} failed: {}", layer, e);
                    ctx.emit(DashboardEvent::query_failed(layer, e.to_string()));
                }
            }

            let field = policy.passengers_field(&snapshot.year);
            let stats = ctx
                .service
                .summary_statistics(layer, &field, predicate.as_ref(), policy.stats_min_value())
                .await;
            if is_stale() {
                return;
            }
            match stats {
                Ok(stats) => {
                    tracing::debug!(
                        "Route stats for {}: avg {:.1}, max {:.1}, count {}",
                        field,
                        stats.avg,
                        stats.max,
                        stats.count
                    );
                    map.set_renderer(layer, policy.route_renderer(&snapshot, &stats));
                    ctx.emit(DashboardEvent::RendererApplied {
                        layer: layer.into(),
                    });
                }
                Err(e) => {
                    tracing::warn!("Route statistics for {} failed: {}", layer, e);
                    ctx.emit(DashboardEvent::query_failed(layer, e.to_string()));
                }
            }
        })
    }
}
