use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use crate::error::{Error, Result};
use crate::trends::{self, EstimatorParams};

pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";
pub const TELEGRAM_BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub youtube: YoutubeConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub trends: TrendConfig,
    #[serde(default)]
    pub roi: RoiConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,
    #[serde(default = "default_recent_videos")]
    pub recent_videos: usize,
    #[serde(default)]
    pub channels: Vec<YoutubeChannel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeChannel {
    pub handle: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default = "default_telegram_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub channels: Vec<TelegramChannel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChannel {
    pub username: String,
    pub name: String,
    /// Linked discussion group, if the channel has one.
    #[serde(default)]
    pub chat: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    #[serde(default = "default_growth_window_hours")]
    pub growth_window_hours: i64,
    #[serde(default = "default_forecast_horizon_days")]
    pub forecast_horizon_days: f64,
    #[serde(default = "default_target_subscribers")]
    pub target_subscribers: f64,
    #[serde(default = "default_anomaly_window")]
    pub anomaly_window: usize,
    #[serde(default = "default_min_anomaly_samples")]
    pub min_anomaly_samples: usize,
    #[serde(default = "default_drop_threshold")]
    pub drop_threshold_percent: f64,
    #[serde(default = "default_spike_threshold")]
    pub spike_threshold_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiConfig {
    #[serde(default = "default_youtube_cost")]
    pub youtube_monthly_cost: f64,
    #[serde(default = "default_telegram_cost")]
    pub telegram_monthly_cost: f64,
    /// Ad revenue per view in USD ($2 per 1000 views).
    #[serde(default = "default_revenue_per_view")]
    pub revenue_per_view: f64,
    #[serde(default = "default_conversion_rate")]
    pub telegram_conversion_rate: f64,
    #[serde(default = "default_subscription_price_rub")]
    pub telegram_price_rub: f64,
    #[serde(default = "default_rub_per_usd")]
    pub rub_per_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_critical_drop")]
    pub critical_drop_percent: f64,
    #[serde(default = "default_roi_loss")]
    pub roi_loss_percent: f64,
    #[serde(default = "default_milestone_days")]
    pub milestone_days: f64,
}

fn default_interval_secs() -> u64 { 3600 }
fn default_http_timeout() -> u64 { 30 }
fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_reports_dir() -> PathBuf { PathBuf::from(".") }
fn default_youtube_base_url() -> String { "https://www.googleapis.com/youtube/v3".to_string() }
fn default_telegram_base_url() -> String { "https://api.telegram.org".to_string() }
fn default_recent_videos() -> usize { 5 }
fn default_growth_window_hours() -> i64 { trends::DEFAULT_GROWTH_WINDOW_HOURS }
fn default_forecast_horizon_days() -> f64 { trends::DEFAULT_HORIZON_DAYS }
fn default_target_subscribers() -> f64 { trends::DEFAULT_TARGET }
fn default_anomaly_window() -> usize { trends::DEFAULT_ANOMALY_WINDOW }
fn default_min_anomaly_samples() -> usize { trends::MIN_ANOMALY_SAMPLES }
fn default_drop_threshold() -> f64 { trends::DROP_THRESHOLD_PERCENT }
fn default_spike_threshold() -> f64 { trends::SPIKE_THRESHOLD_PERCENT }
fn default_youtube_cost() -> f64 { 500.0 }
fn default_telegram_cost() -> f64 { 100.0 }
fn default_revenue_per_view() -> f64 { 0.002 }
fn default_conversion_rate() -> f64 { 0.01 }
fn default_subscription_price_rub() -> f64 { 10_000.0 }
fn default_rub_per_usd() -> f64 { 70.0 }
fn default_enabled() -> bool { true }
fn default_critical_drop() -> f64 { -20.0 }
fn default_roi_loss() -> f64 { -75.0 }
fn default_milestone_days() -> f64 { 7.0 }

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            reports_dir: default_reports_dir(),
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_youtube_base_url(),
            recent_videos: default_recent_videos(),
            channels: Vec::new(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            base_url: default_telegram_base_url(),
            channels: Vec::new(),
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            growth_window_hours: default_growth_window_hours(),
            forecast_horizon_days: default_forecast_horizon_days(),
            target_subscribers: default_target_subscribers(),
            anomaly_window: default_anomaly_window(),
            min_anomaly_samples: default_min_anomaly_samples(),
            drop_threshold_percent: default_drop_threshold(),
            spike_threshold_percent: default_spike_threshold(),
        }
    }
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            youtube_monthly_cost: default_youtube_cost(),
            telegram_monthly_cost: default_telegram_cost(),
            revenue_per_view: default_revenue_per_view(),
            telegram_conversion_rate: default_conversion_rate(),
            telegram_price_rub: default_subscription_price_rub(),
            rub_per_usd: default_rub_per_usd(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            critical_drop_percent: default_critical_drop(),
            roi_loss_percent: default_roi_loss(),
            milestone_days: default_milestone_days(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh: RefreshConfig::default(),
            storage: StorageConfig::default(),
            youtube: YoutubeConfig::default(),
            telegram: TelegramConfig::default(),
            trends: TrendConfig::default(),
            roi: RoiConfig::default(),
            alerts: AlertsConfig::default(),
        }
    }
}

impl TrendConfig {
    pub fn estimator_params(&self) -> Result<EstimatorParams> {
        let growth_window = chrono::Duration::try_hours(self.growth_window_hours)
            .filter(|window| *window > chrono::Duration::zero())
            .ok_or_else(|| Error::Config(format!(
                "trends.growth_window_hours out of range: {}",
                self.growth_window_hours
            )))?;

        Ok(EstimatorParams {
            growth_window,
            min_forecast_samples: trends::MIN_FORECAST_SAMPLES,
            anomaly_window: self.anomaly_window,
            min_anomaly_samples: self.min_anomaly_samples,
            drop_threshold_percent: self.drop_threshold_percent,
            spike_threshold_percent: self.spike_threshold_percent,
        })
    }
}

impl Config {
    /// Loads `path` when given, otherwise the per-user config file if one
    /// exists, otherwise defaults. Secrets from the environment win.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => match Self::config_path() {
                Ok(default_path) if default_path.exists() => Self::load_file(&default_path)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.trends.estimator_params()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!("Config file not found: {}", path.display())));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(YOUTUBE_API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.youtube.api_key = Some(key);
        }
        if let Some(token) = lookup(TELEGRAM_BOT_TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.telegram.bot_token = Some(token);
        }
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| Error::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config/channel-pulse/config.toml"))
    }
}
