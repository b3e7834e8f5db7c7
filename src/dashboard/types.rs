use crate::collectors::Platform;
use crate::history::Metric;
use crate::trends::{AnomalyFlag, ForecastEstimate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything one dashboard build derives, as written to `dashboard.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub youtube: YoutubeSection,
    pub telegram: TelegramSection,
    pub predictions: Predictions,
    pub alerts: Vec<ChannelAlert>,
    pub roi: Vec<RoiEstimate>,
    pub recommendations: Vec<Recommendation>,
}

impl Dashboard {
    pub fn profitable_count(&self) -> usize {
        self.roi.iter().filter(|r| r.status == RoiStatus::Profitable).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_reach: u64,
    pub growth_last_24h: f64,
    pub best_channel: String,
    pub alerts_count: usize,
    pub days_to_1000: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YoutubeSection {
    pub total_subscribers: u64,
    pub total_views: u64,
    pub channels: Vec<YoutubeChannelRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeChannelRecord {
    pub name: String,
    pub channel_id: String,
    pub subscribers: u64,
    pub views: u64,
    pub videos: u64,
    pub growth_rate_hourly: f64,
    pub engagement_rate: f64,
    pub prediction: Option<ForecastEstimate>,
    #[serde(default)]
    pub alerts: Vec<MetricAnomaly>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelegramSection {
    pub total_subscribers: u64,
    pub channels: Vec<TelegramChannelRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramChannelRecord {
    pub name: String,
    pub username: String,
    pub subscribers: Option<u64>,
    pub bot_is_admin: bool,
    pub growth_rate_hourly: f64,
    #[serde(default)]
    pub alerts: Vec<MetricAnomaly>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Predictions {
    pub total_subscribers: Option<ForecastEstimate>,
    pub total_views: Option<ForecastEstimate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricAnomaly {
    pub metric: Metric,
    pub anomaly: AnomalyFlag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAlert {
    pub channel: String,
    pub platform: Platform,
    pub metric: Metric,
    pub anomaly: AnomalyFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoiStatus {
    Profitable,
    Loss,
}

impl fmt::Display for RoiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoiStatus::Profitable => write!(f, "profitable"),
            RoiStatus::Loss => write!(f, "loss"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiEstimate {
    pub channel: String,
    pub platform: Platform,
    pub cost: f64,
    pub potential_revenue: f64,
    pub roi_percent: f64,
    pub status: RoiStatus,
}

/// Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Urgent => write!(f, "URGENT"),
            Priority::High => write!(f, "HIGH"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::Low => write!(f, "LOW"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub channel: String,
    pub action: String,
    pub reason: String,
}
