//! Chart Binding
//!
//! Binds one [`ChartTemplate`] to one chart on the charting surface. A
//! refresh builds a fresh query from the filter snapshot, runs it, reduces
//! the rows and hands the complete series to the surface.
//!
//! Every refresh takes a new generation number. A response is drawn only if
//! its generation is still the latest issued for this chart, so a slow,
//! outdated query can never overwrite a newer result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use ahash::AHashMap;
use crossbeam_channel::Sender;
use tokio::task::JoinHandle;

use crate::domain::chart::ChartTemplate;
use crate::domain::filter::FilterSnapshot;
use crate::domain::predicate::Predicate;
use crate::domain::query::{
    Aggregation, AggregationQuery, Ordering, Row, StatField, value_as_f64, value_as_label,
};
use crate::domain::ranking::{RankingConfig, reduce};
use crate::services::{ChartSurface, ChartUpdate, DashboardEvent, FeatureQueryService, spawn_named};
use crate::utils::format::abbreviate_airline;

/// Result field holding the ranked statistic
pub const VALUE_FIELD: &str = "value";
/// Result field holding the companion average
pub const SECONDARY_FIELD: &str = "secondary";

/// Collaborators a refresh needs
#[derive(Clone)]
pub struct RefreshContext {
    pub service: Arc<dyn FeatureQueryService>,
    pub charts: Arc<dyn ChartSurface>,
    pub events: Sender<DashboardEvent>,
}

impl RefreshContext {
    pub(crate) fn emit(&self, event: DashboardEvent) {
        let _ = self.events.try_send(event);
    }
}

/// How one refresh ended
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The chart was redrawn with this many entries
    Rendered { entries: usize },
    /// A newer refresh was issued meanwhile; nothing was drawn
    Stale { generation: u64, latest: u64 },
    /// The query failed; the chart keeps its previous drawing
    Failed { message: String },
}

/// One chart kept in sync with the filter state
#[derive(Debug)]
pub struct ChartBinding {
    template: ChartTemplate,
    ranking: RankingConfig,
    generation: AtomicU64,
}

impl ChartBinding {
    /// Bind a template, using `default_ranking` unless it overrides it
    pub fn new(template: ChartTemplate, default_ranking: RankingConfig) -> Self {
        let ranking = template.ranking.unwrap_or(default_ranking);
        Self {
            template,
            ranking,
            generation: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.template.id
    }

    pub fn template(&self) -> &ChartTemplate {
        &self.template
    }

    pub fn ranking(&self) -> &RankingConfig {
        &self.ranking
    }

    /// Latest generation issued
    pub fn generation(&self) -> u64 {
        self.generation.load(AtomicOrdering::SeqCst)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, AtomicOrdering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Query for the given selections
    pub fn build_query(
        &self,
        snapshot: &FilterSnapshot,
        predicate: Option<Predicate>,
        service_cap: usize,
    ) -> AggregationQuery {
        let template = &self.template;
        AggregationQuery {
            layer: template.layer.clone(),
            grouping: template.grouping.clone(),
            value: StatField::new(
                template.value_field.resolve(&snapshot.year),
                template.aggregation,
                VALUE_FIELD,
            ),
            secondary: template
                .secondary_field
                .as_ref()
                .map(|field| {
                    StatField::new(
                        field.resolve(&snapshot.year),
                        Aggregation::Avg,
                        SECONDARY_FIELD,
                    )
                }),
            predicate,
            ordering: Some(Ordering::desc(VALUE_FIELD)),
            record_ceiling_multiplier: template.ceiling_multiplier(service_cap),
        }
    }

    /// Reduce grouped rows into a full chart update
    pub fn present(&self, rows: &[Row], query: &AggregationQuery) -> ChartUpdate {
        let name_field = query.grouping.output_name();
        let series = reduce(rows, name_field, &query.value.out_name, &self.ranking);

        let labels = series
            .entries
            .iter()
            .map(|entry| {
                if self.template.abbreviate_labels && !entry.others {
                    abbreviate_airline(&entry.label)
                } else {
                    entry.label.clone()
                }
            })
            .collect();

        let secondary = match &query.secondary {
            Some(stat) => {
                let by_label: AHashMap<String, f64> = rows
                    .iter()
                    .filter_map(|row| {
                        let label = row.get(name_field).and_then(value_as_label)?;
                        Some((label, value_as_f64(row.get(&stat.out_name))))
                    })
                    .collect();
                series
                    .entries
                    .iter()
                    .map(|entry| {
                        if entry.others {
                            None
                        } else {
                            by_label.get(&entry.label).copied()
                        }
                    })
                    .collect()
            }
            None => vec![None; series.len()],
        };

        ChartUpdate::from_series(
            &self.template.title,
            self.template.kind,
            &series,
            labels,
            secondary,
        )
    }

    /// Issue a refresh for the given selections
    ///
    /// The generation is taken before this returns, so refreshes issued
    /// later always win regardless of completion order. Must be called from
    /// within a tokio runtime.
    pub fn refresh(
        self: &Arc<Self>,
        snapshot: &FilterSnapshot,
        predicate: Option<Predicate>,
        ctx: &RefreshContext,
    ) -> JoinHandle<RefreshOutcome> {
        let generation = self.next_generation();
        let query = self.build_query(snapshot, predicate, ctx.service.max_record_count());
        let binding = Arc::clone(self);
        let ctx = ctx.clone();

        spawn_named(format!("chart:{}", self.id()), async move {
            binding.complete(generation, query, ctx).await
        })
    }

    async fn complete(
        &self,
        generation: u64,
        query: AggregationQuery,
        ctx: RefreshContext,
    ) -> RefreshOutcome {
        tracing::debug!(
            "Chart {} query #{}: group by {} where {}",
            self.id(),
            generation,
            query.grouping.expression(),
            query.where_clause().as_deref().unwrap_or("1=1")
        );
        let result = ctx.service.query(&query).await;

        let latest = self.generation();
        if latest != generation {
            tracing::debug!(
                "Discarding stale response #{} for chart {} (latest #{})",
                generation,
                self.id(),
                latest
            );
            ctx.emit(DashboardEvent::StaleResponseDiscarded {
                target: self.id().into(),
                generation,
                latest,
            });
            return RefreshOutcome::Stale { generation, latest };
        }

        match result {
            Ok(rows) => {
                let update = self.present(&rows, &query);
                let entries = update.len();
                // a newer refresh may have been issued while reducing
                if !self.is_current(generation) {
                    return RefreshOutcome::Stale {
                        generation,
                        latest: self.generation(),
                    };
                }
                ctx.charts.render(self.id(), update);
                ctx.emit(DashboardEvent::ChartRendered {
                    chart_id: self.id().into(),
                    generation,
                    entries,
                });
                RefreshOutcome::Rendered { entries }
            }
            Err(e) => {
                tracing::warn!("Chart {} query failed: {}", self.id(), e);
                let message = e.to_string();
                ctx.emit(DashboardEvent::query_failed(self.id(), message.as_str()));
                RefreshOutcome::Failed { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::default_catalog;
    use crate::domain::config::DashboardConfig;
    use crate::domain::filter::Dimension;
    use crate::testing::{GatedService, RecordingCharts, fixture_service};

    const DELTA: &str = "Delta Air Lines Inc.";

    fn binding(id: &str) -> Arc<ChartBinding> {
        let template = default_catalog(&DashboardConfig::default())
            .into_iter()
            .find(|t| t.id == id)
            .expect("template");
        Arc::new(ChartBinding::new(template, RankingConfig::default()))
    }

    fn context(
        service: Arc<dyn FeatureQueryService>,
        charts: Arc<RecordingCharts>,
    ) -> (RefreshContext, crossbeam_channel::Receiver<DashboardEvent>) {
        let (events, rx) = crossbeam_channel::unbounded();
        let ctx = RefreshContext {
            service,
            charts,
            events,
        };
        (ctx, rx)
    }

    #[test]
    fn query_uses_year_fields_and_predicate() {
        let binding = binding("routes");
        let snapshot = FilterSnapshot::unfiltered("2018").with(Dimension::Airline, DELTA);
        let predicate = Predicate::equals("unique_carrier_name", DELTA);
        let query = binding.build_query(&snapshot, Some(predicate.clone()), 2000);

        assert_eq!(query.value.on_field, "pass_2018_7");
        assert_eq!(query.secondary.as_ref().map(|s| s.on_field.as_str()), Some("hhi_2018"));
        assert_eq!(query.predicate, Some(predicate));
        assert_eq!(query.grouping.expression(), "origin || ' - ' || dest");
        assert_eq!(query.record_ceiling_multiplier, Some(10));
    }

    #[tokio::test]
    async fn refresh_renders_abbreviated_airlines_with_others() {
        let charts = Arc::new(RecordingCharts::default());
        let (ctx, rx) = context(Arc::new(fixture_service()), charts.clone());
        let binding = binding("airline_passengers");

        let outcome = binding
            .refresh(&FilterSnapshot::unfiltered("2019"), None, &ctx)
            .await
            .expect("task");
        assert!(matches!(outcome, RefreshOutcome::Rendered { .. }));

        let update = charts.last("airline_passengers").expect("rendered");
        assert_eq!(update.labels.first().map(String::as_str), Some("Delta"));
        assert!(update.labels.contains(&"Southwest".to_string()));
        let total: f64 = update.series.iter().sum();
        assert!((total - update.total).abs() < 1e-6);
        assert!(rx.try_iter().any(|e| matches!(e, DashboardEvent::ChartRendered { .. })));
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let charts = Arc::new(RecordingCharts::default());
        let service = Arc::new(GatedService::new(fixture_service(), "Delta"));
        let (ctx, rx) = context(service.clone(), charts.clone());
        let binding = binding("origin_markets");

        let delta = FilterSnapshot::unfiltered("2019").with(Dimension::Airline, DELTA);
        let predicate = Predicate::equals("unique_carrier_name", DELTA);
        let slow = binding.refresh(&delta, Some(predicate), &ctx);
        let fast = binding.refresh(&FilterSnapshot::unfiltered("2019"), None, &ctx);

        assert!(matches!(fast.await.expect("task"), RefreshOutcome::Rendered { .. }));
        service.release();
        assert_eq!(
            slow.await.expect("task"),
            RefreshOutcome::Stale { generation: 1, latest: 2 }
        );

        assert_eq!(charts.count("origin_markets"), 1);
        assert!(rx.try_iter().any(|e| matches!(
            e,
            DashboardEvent::StaleResponseDiscarded { generation: 1, .. }
        )));
    }

    #[tokio::test]
    async fn failure_keeps_last_render() {
        let charts = Arc::new(RecordingCharts::default());
        let service = Arc::new(GatedService::open(fixture_service()));
        let (ctx, rx) = context(service.clone(), charts.clone());
        let binding = binding("dest_markets");
        let snapshot = FilterSnapshot::unfiltered("2019");

        binding.refresh(&snapshot, None, &ctx).await.expect("task");
        let before = charts.last("dest_markets").expect("rendered");

        service.set_failing(true);
        let outcome = binding.refresh(&snapshot, None, &ctx).await.expect("task");
        assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
        assert_eq!(charts.count("dest_markets"), 1);
        assert_eq!(charts.last("dest_markets"), Some(before));
        assert!(rx.try_iter().any(|e| e.is_failure()));
    }
}
