//! Air Markets - Main Entry Point
//!
//! Loads a route/market dataset, applies the selections given on the command
//! line through the dashboard controller, and prints every chart and map
//! renderer to the console.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use air_markets::domain::config::{AppConfig, LoggingConfig};
use air_markets::domain::filter::Dimension;
use air_markets::eventing::UiEvent;
use air_markets::features::charts::RefreshOutcome;
use air_markets::features::dashboard::DashboardController;
use air_markets::services::{
    ConsoleChartSurface, ConsoleMapSurface, DashboardEvent, MemoryFeatureService,
};
use air_markets::utils::config_store::load_config_or_default;
use air_markets::utils::format::format_datetime;

#[derive(Parser, Debug)]
#[command(name = "air-markets")]
#[command(about = "Filter-driven charts over flight routes and air-travel markets")]
#[command(version)]
struct Args {
    /// Config file (defaults to config.toml in the platform config directory)
    #[arg(long, env = "AIR_MARKETS_CONFIG")]
    config: Option<PathBuf>,

    /// JSON dataset: {"routes": [...], "markets": [...]}
    #[arg(long, env = "AIR_MARKETS_DATA")]
    data: PathBuf,

    /// Airline (unique carrier name)
    #[arg(long)]
    airline: Option<String>,

    /// Origin market name
    #[arg(long)]
    origin_market: Option<String>,

    /// Origin airport code
    #[arg(long)]
    origin_airport: Option<String>,

    /// Destination market name
    #[arg(long)]
    dest_market: Option<String>,

    /// Destination airport code
    #[arg(long)]
    dest_airport: Option<String>,

    /// Year selecting the statistics fields
    #[arg(long)]
    year: Option<String>,

    /// Color routes by the competition index
    #[arg(long)]
    competition: bool,

    /// Print the selectable years, dimension values and charts, then exit
    #[arg(long)]
    list: bool,
}

impl Args {
    /// Selections in the order the controls would emit them
    fn selections(&self) -> Vec<UiEvent> {
        let mut events: Vec<UiEvent> = self.year.iter().map(UiEvent::year).collect();
        let dimensions = [
            (Dimension::Airline, &self.airline),
            (Dimension::OriginMarket, &self.origin_market),
            (Dimension::OriginAirport, &self.origin_airport),
            (Dimension::DestMarket, &self.dest_market),
            (Dimension::DestAirport, &self.dest_airport),
        ];
        events.extend(
            dimensions
                .into_iter()
                .filter_map(|(dimension, value)| {
                    value.as_ref().map(|v| UiEvent::dimension(dimension, v.as_str()))
                }),
        );
        if self.competition {
            events.push(UiEvent::CompetitionToggled { enabled: true });
        }
        events
    }
}

fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "air-markets.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

/// Print what the dashboard controls would offer
fn print_choices(controller: &DashboardController) {
    let filter = controller.filter();
    println!("years: {}", filter.years().join(", "));
    for dimension in Dimension::ALL {
        let values = filter.catalog(dimension).map(|c| c.values()).unwrap_or_default();
        println!("{} ({}):", dimension, values.len());
        for value in values {
            println!("  {value}");
        }
    }
    println!("charts:");
    for binding in controller.bindings() {
        println!(
            "  {} - {} (top {})",
            binding.id(),
            binding.template().title,
            binding.ranking().cap_count
        );
    }
}

/// Print failures and ignored selections from the event stream
fn report(controller: &DashboardController, outcomes: &[(String, RefreshOutcome)]) {
    for (chart_id, outcome) in outcomes {
        if let RefreshOutcome::Stale { generation, latest } = outcome {
            tracing::debug!("Chart {} settled stale (#{} < #{})", chart_id, generation, latest);
        }
    }

    for event in controller.events().try_iter() {
        match event {
            DashboardEvent::QueryFailed { target, message, at } => {
                eprintln!("[{}] {} failed: {}", format_datetime(&at), target, message);
            }
            DashboardEvent::SelectionIgnored { reason } => {
                eprintln!("Ignored selection: {reason}");
            }
            _ => {}
        }
    }
}

async fn run(args: Args, config: AppConfig) -> anyhow::Result<()> {
    let service = Arc::new(MemoryFeatureService::from_json_path(
        &args.data,
        config.service.max_record_count,
    )?);
    let mut controller = DashboardController::new(
        &config,
        service,
        Arc::new(ConsoleMapSurface),
        Arc::new(ConsoleChartSurface),
    )?;

    if args.list {
        controller.load_catalogs().await;
        print_choices(&controller);
        return Ok(());
    }

    let outcomes = controller.start().await.settled().await;
    report(&controller, &outcomes);

    for event in args.selections() {
        let outcomes = controller.handle(event).settled().await;
        report(&controller, &outcomes);
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config_or_default(args.config.as_deref())?;
    let _guard = init_tracing(&config.logging);

    tracing::info!("Starting air-markets...");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args, config))
}
