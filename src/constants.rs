//! Dashboard Constants
//!
//! Centralized defaults for dimensions, layers and ranking so the
//! configuration layer and tests agree on the same values.

/// "All ..." sentinels, one per dimension
pub const ALL_AIRLINES: &str = "All Airlines";
pub const ALL_ORIGIN_MARKETS: &str = "All Origin Markets";
pub const ALL_ORIGIN_AIRPORTS: &str = "All Origin Airports";
pub const ALL_DEST_MARKETS: &str = "All Destination Markets";
pub const ALL_DEST_AIRPORTS: &str = "All Destination Airports";

/// Backing columns for each dimension
pub const AIRLINE_FIELD: &str = "unique_carrier_name";
pub const ORIGIN_MARKET_FIELD: &str = "origin_market_name";
pub const ORIGIN_AIRPORT_FIELD: &str = "origin";
pub const DEST_MARKET_FIELD: &str = "dest_market_name";
pub const DEST_AIRPORT_FIELD: &str = "dest";

/// Years available in the dataset
pub const DEFAULT_YEARS: [&str; 3] = ["2017", "2018", "2019"];

/// Year-suffixed field templates
pub const PASSENGERS_FIELD_TEMPLATE: &str = "pass_{year}_7";
pub const PASSENGER_MILES_FIELD_TEMPLATE: &str = "rpm_{year}_7";
pub const COMPETITION_FIELD_TEMPLATE: &str = "hhi_{year}";

/// Layer identifiers understood by the map and feature services
pub const ROUTES_LAYER: &str = "routes";
pub const MARKETS_LAYER: &str = "markets";

/// Ranking defaults
pub const RANKING_CAP_COUNT: usize = 7;
pub const RANKING_MIN_SHARE_PERCENT: f64 = 3.0;
pub const OTHERS_LABEL: &str = "Others";

/// Default record cap of a feature service page
pub const SERVICE_MAX_RECORD_COUNT: usize = 2000;

/// Route-count thresholds for opacity tiers
pub const SPARSE_ROUTE_COUNT: u64 = 100;
pub const DENSE_ROUTE_COUNT: u64 = 500;

/// Minimum value considered when computing route summary statistics
pub const ROUTE_STATS_MIN_VALUE: f64 = 1.0;

/// Chart labels longer than this are abbreviated
pub const LABEL_MAX_LEN: usize = 15;

/// Decimal places used for abbreviated (M/B) values
pub const ABBREVIATED_PRECISION: usize = 2;

/// Dashboard event channel capacity
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
