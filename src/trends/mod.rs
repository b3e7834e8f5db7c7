pub mod analyzer;
pub mod types;

pub use analyzer::{EstimatorParams, TrendEstimator};
pub use types::{AnomalyFlag, AnomalyKind, ForecastEstimate, GrowthEstimate, LinearFit};

pub const DEFAULT_GROWTH_WINDOW_HOURS: i64 = 24;
pub const DEFAULT_HORIZON_DAYS: f64 = 7.0;
pub const DEFAULT_TARGET: f64 = 1000.0;
pub const MIN_FORECAST_SAMPLES: usize = 3;
pub const DEFAULT_ANOMALY_WINDOW: usize = 5;
pub const MIN_ANOMALY_SAMPLES: usize = 10;
pub const DROP_THRESHOLD_PERCENT: f64 = -10.0;
pub const SPIKE_THRESHOLD_PERCENT: f64 = 50.0;
