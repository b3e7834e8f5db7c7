use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthEstimate {
    pub rate_per_hour: f64, // percent per hour
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastEstimate {
    pub current: f64,
    pub predicted_at_horizon: f64,
    pub daily_delta: f64,
    /// Only set when the fitted line is rising.
    pub days_to_target: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Drop,
    Spike,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::Drop => write!(f, "drop"),
            AnomalyKind::Spike => write!(f, "spike"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    pub kind: AnomalyKind,
    pub observed: f64,
    pub baseline: f64,
    pub percent_change: f64,
}

impl AnomalyFlag {
    /// Signed change as shown in reports, e.g. `-15.0%` or `+60.0%`.
    pub fn change_label(&self) -> String {
        format!("{:+.1}%", self.percent_change)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}
