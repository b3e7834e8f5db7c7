use super::recommendations::recommend;
use super::roi::{telegram_roi, youtube_roi};
use super::types::*;
use crate::collectors::{Platform, TelegramSnapshot, YoutubeSnapshot};
use crate::config::{Config, RoiConfig, TrendConfig};
use crate::error::Result;
use crate::history::{DataStore, Metric, MetricsHistory, Series};
use crate::trends::{ForecastEstimate, TrendEstimator};
use chrono::{DateTime, Utc};

/// Metrics checked for anomalies on every channel.
const WATCHED_METRICS: [Metric; 2] = [Metric::Subscribers, Metric::Views];

/// What a dashboard is built from: the newest snapshot per platform plus the
/// CSV histories.
#[derive(Debug, Clone, Default)]
pub struct DashboardInputs {
    pub youtube: Option<YoutubeSnapshot>,
    pub telegram: Option<TelegramSnapshot>,
    pub youtube_history: MetricsHistory,
    pub telegram_history: MetricsHistory,
}

impl DashboardInputs {
    pub fn load(store: &DataStore) -> Result<Self> {
        Ok(Self {
            youtube: store.load_youtube_latest()?,
            telegram: store.load_telegram_latest()?,
            youtube_history: store.load_youtube_history()?,
            telegram_history: store.load_telegram_history()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.youtube.is_none() && self.telegram.is_none()
    }
}

pub struct DashboardBuilder {
    estimator: TrendEstimator,
    trends: TrendConfig,
    roi: RoiConfig,
}

impl DashboardBuilder {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            estimator: TrendEstimator::new(config.trends.estimator_params()?),
            trends: config.trends.clone(),
            roi: config.roi.clone(),
        })
    }

    pub fn build(&self, inputs: &DashboardInputs, now: DateTime<Utc>) -> Dashboard {
        let mut alerts = Vec::new();
        let mut roi = Vec::new();

        let youtube = match &inputs.youtube {
            Some(snapshot) => {
                self.youtube_section(snapshot, &inputs.youtube_history, now, &mut alerts, &mut roi)
            }
            None => YoutubeSection::default(),
        };

        let telegram = match &inputs.telegram {
            Some(snapshot) => {
                self.telegram_section(snapshot, &inputs.telegram_history, now, &mut alerts, &mut roi)
            }
            None => TelegramSection::default(),
        };

        let total_subscribers = inputs.youtube_history.total_series(Metric::Subscribers);
        let predictions = Predictions {
            total_subscribers: self.forecast(&total_subscribers),
            total_views: self.forecast(&inputs.youtube_history.total_series(Metric::Views)),
        };

        let summary = Summary {
            total_reach: youtube.total_subscribers + telegram.total_subscribers,
            growth_last_24h: self.estimator.growth_rate_at(&total_subscribers, now).rate_per_hour,
            best_channel: best_channel(&youtube, &telegram),
            alerts_count: alerts.len(),
            days_to_1000: predictions.total_subscribers.and_then(|f| f.days_to_target),
        };

        let recommendations = recommend(&youtube.channels, &roi, alerts.len());

        log::debug!("Dashboard built: {} YouTube, {} Telegram channel(s), {} alert(s)",
            youtube.channels.len(), telegram.channels.len(), alerts.len());

        Dashboard {
            generated_at: now,
            summary,
            youtube,
            telegram,
            predictions,
            alerts,
            roi,
            recommendations,
        }
    }

    fn youtube_section(
        &self,
        snapshot: &YoutubeSnapshot,
        history: &MetricsHistory,
        now: DateTime<Utc>,
        alerts: &mut Vec<ChannelAlert>,
        roi: &mut Vec<RoiEstimate>,
    ) -> YoutubeSection {
        let mut section = YoutubeSection::default();

        for channel in &snapshot.channels {
            section.total_subscribers += channel.subscribers;
            section.total_views += channel.views;

            let subscribers = history.series(&channel.channel_id, Metric::Subscribers);
            let anomalies = self.anomalies(history, &channel.channel_id);
            alerts.extend(anomalies.iter().map(|a| ChannelAlert {
                channel: channel.title.clone(),
                platform: Platform::Youtube,
                metric: a.metric,
                anomaly: a.anomaly,
            }));
            roi.push(youtube_roi(channel, &self.roi));

            section.channels.push(YoutubeChannelRecord {
                name: channel.title.clone(),
                channel_id: channel.channel_id.clone(),
                subscribers: channel.subscribers,
                views: channel.views,
                videos: channel.videos,
                growth_rate_hourly: subscribers
                    .map(|s| self.estimator.growth_rate_at(s, now).rate_per_hour)
                    .unwrap_or(0.0),
                engagement_rate: engagement_rate(channel.views, channel.videos, channel.subscribers),
                prediction: subscribers.and_then(|s| self.forecast(s)),
                alerts: anomalies,
            });
        }

        section
    }

    fn telegram_section(
        &self,
        snapshot: &TelegramSnapshot,
        history: &MetricsHistory,
        now: DateTime<Utc>,
        alerts: &mut Vec<ChannelAlert>,
        roi: &mut Vec<RoiEstimate>,
    ) -> TelegramSection {
        let mut section = TelegramSection::default();

        for channel in snapshot.accessible() {
            section.total_subscribers += channel.subscribers.unwrap_or(0);

            let anomalies = self.anomalies(history, &channel.username);
            alerts.extend(anomalies.iter().map(|a| ChannelAlert {
                channel: channel.name.clone(),
                platform: Platform::Telegram,
                metric: a.metric,
                anomaly: a.anomaly,
            }));
            roi.push(telegram_roi(channel, &self.roi));

            section.channels.push(TelegramChannelRecord {
                name: channel.name.clone(),
                username: channel.username.clone(),
                subscribers: channel.subscribers,
                bot_is_admin: channel.bot_is_admin,
                growth_rate_hourly: history.series(&channel.username, Metric::Subscribers)
                    .map(|s| self.estimator.growth_rate_at(s, now).rate_per_hour)
                    .unwrap_or(0.0),
                alerts: anomalies,
            });
        }

        section
    }

    fn anomalies(&self, history: &MetricsHistory, key: &str) -> Vec<MetricAnomaly> {
        WATCHED_METRICS.iter()
            .filter_map(|&metric| {
                let series = history.series(key, metric)?;
                let anomaly = self.estimator.anomaly(series)?;
                log::warn!("{} {} {}: {}", key, metric, anomaly.kind, anomaly.change_label());
                Some(MetricAnomaly { metric, anomaly })
            })
            .collect()
    }

    fn forecast(&self, series: &Series) -> Option<ForecastEstimate> {
        self.estimator.forecast(series, self.trends.forecast_horizon_days, self.trends.target_subscribers)
    }
}

/// Average views per video as a percentage of the subscriber base.
pub fn engagement_rate(views: u64, videos: u64, subscribers: u64) -> f64 {
    if videos == 0 || subscribers == 0 {
        return 0.0;
    }
    let average_views = views as f64 / videos as f64;
    average_views / subscribers as f64 * 100.0
}

/// Highest hourly growth across both platforms. The first channel wins a tie.
fn best_channel(youtube: &YoutubeSection, telegram: &TelegramSection) -> String {
    let candidates = youtube.channels.iter()
        .map(|c| (c.name.as_str(), c.growth_rate_hourly))
        .chain(telegram.channels.iter().map(|c| (c.name.as_str(), c.growth_rate_hourly)));

    let mut best: Option<(&str, f64)> = None;
    for (name, growth) in candidates {
        if best.map_or(true, |(_, top)| growth > top) {
            best = Some((name, growth));
        }
    }

    best.map(|(name, _)| name.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{TelegramChannelStats, YoutubeChannelStats};
    use crate::trends::AnomalyKind;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn yt_channel(id: &str, title: &str, subscribers: u64, views: u64, videos: u64) -> YoutubeChannelStats {
        YoutubeChannelStats {
            channel_id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            published_at: String::new(),
            country: "N/A".to_string(),
            subscribers,
            views,
            videos,
            uploads_playlist: String::new(),
            handle: String::new(),
            timestamp: now(),
        }
    }

    fn tg_channel(username: &str, name: &str, subscribers: Option<u64>) -> TelegramChannelStats {
        let mut channel = TelegramChannelStats::inaccessible(now(), username, name, "");
        channel.error = None;
        channel.subscribers = subscribers;
        channel
    }

    /// Hourly samples ending at `now()`.
    fn record_hourly(history: &mut MetricsHistory, key: &str, metric: Metric, values: &[f64]) {
        let start = now() - Duration::hours(values.len() as i64 - 1);
        for (i, v) in values.iter().enumerate() {
            history.record(key, key, start + Duration::hours(i as i64), metric, *v);
        }
    }

    fn inputs() -> DashboardInputs {
        let mut youtube_history = MetricsHistory::new();
        record_hourly(&mut youtube_history, "UC1", Metric::Subscribers, &[100.0, 110.0, 120.0]);
        record_hourly(&mut youtube_history, "UC2", Metric::Subscribers, &[200.0, 200.0, 200.0]);
        record_hourly(&mut youtube_history, "UC1", Metric::Views, &[1000.0, 1100.0, 1200.0]);

        DashboardInputs {
            youtube: Some(YoutubeSnapshot {
                generated_at: now(),
                channels: vec![
                    yt_channel("UC1", "Growing", 120, 1200, 4),
                    yt_channel("UC2", "Flat", 200, 0, 0),
                ],
                recent_videos: Vec::new(),
            }),
            telegram: Some(TelegramSnapshot {
                generated_at: now(),
                channels: vec![
                    tg_channel("@news", "News", Some(300)),
                    tg_channel("@hidden", "Hidden", None),
                    TelegramChannelStats::inaccessible(now(), "@gone", "Gone", "Bot cannot access channel"),
                ],
                bot_api_version: true,
                limitations: Vec::new(),
            }),
            youtube_history,
            telegram_history: MetricsHistory::new(),
        }
    }

    #[test]
    fn test_engagement_rate() {
        assert_eq!(engagement_rate(1000, 10, 50), 200.0);
        assert_eq!(engagement_rate(1000, 0, 50), 0.0);
        assert_eq!(engagement_rate(1000, 10, 0), 0.0);
    }

    #[test]
    fn test_build_sections_and_summary() {
        let dashboard = DashboardBuilder::new(&Config::default()).unwrap().build(&inputs(), now());

        assert_eq!(dashboard.youtube.total_subscribers, 320);
        assert_eq!(dashboard.youtube.total_views, 1200);
        assert_eq!(dashboard.telegram.channels.len(), 2);
        assert_eq!(dashboard.telegram.total_subscribers, 300);
        assert_eq!(dashboard.summary.total_reach, 620);

        let growing = &dashboard.youtube.channels[0];
        // 100 -> 120 over 2h
        assert!((growing.growth_rate_hourly - 10.0).abs() < 1e-9);
        assert!((growing.engagement_rate - 250.0).abs() < 1e-9);
        let prediction = growing.prediction.unwrap();
        assert!((prediction.daily_delta - 240.0).abs() < 1e-9);

        assert_eq!(dashboard.summary.best_channel, "Growing");
        // total 300 -> 320 over 2h
        assert!((dashboard.summary.growth_last_24h - 20.0 / 300.0 / 2.0 * 100.0).abs() < 1e-9);

        let total = dashboard.predictions.total_subscribers.unwrap();
        assert!((total.current - 320.0).abs() < 1e-9);
        assert_eq!(dashboard.summary.days_to_1000, total.days_to_target);
        assert!(dashboard.predictions.total_views.is_some());
    }

    #[test]
    fn test_roi_covers_accessible_channels_in_order() {
        let dashboard = DashboardBuilder::new(&Config::default()).unwrap().build(&inputs(), now());
        let names: Vec<_> = dashboard.roi.iter().map(|r| r.channel.as_str()).collect();
        assert_eq!(names, vec!["Growing", "Flat", "News", "Hidden"]);
        assert_eq!(dashboard.roi.iter().find(|r| r.channel == "News").unwrap().platform, Platform::Telegram);
    }

    #[test]
    fn test_empty_inputs() {
        let dashboard = DashboardBuilder::new(&Config::default()).unwrap().build(&DashboardInputs::default(), now());
        assert_eq!(dashboard.summary.best_channel, "N/A");
        assert_eq!(dashboard.summary.total_reach, 0);
        assert_eq!(dashboard.summary.growth_last_24h, 0.0);
        assert_eq!(dashboard.summary.days_to_1000, None);
        assert!(dashboard.recommendations.is_empty());
    }

    #[test]
    fn test_best_channel_tie_goes_to_first() {
        let mut inputs = inputs();
        inputs.youtube_history = MetricsHistory::new();
        let dashboard = DashboardBuilder::new(&Config::default()).unwrap().build(&inputs, now());
        // every channel at 0 growth
        assert_eq!(dashboard.summary.best_channel, "Growing");
    }

    #[test]
    fn test_telegram_can_be_best() {
        let mut inputs = inputs();
        record_hourly(&mut inputs.telegram_history, "@news", Metric::Subscribers, &[100.0, 200.0]);
        let dashboard = DashboardBuilder::new(&Config::default()).unwrap().build(&inputs, now());
        assert_eq!(dashboard.summary.best_channel, "News");
    }

    #[test]
    fn test_anomaly_becomes_alert_and_urgent_recommendation() {
        let mut inputs = inputs();
        let mut values = vec![100.0; 10];
        values.push(80.0);
        record_hourly(&mut inputs.telegram_history, "@news", Metric::Subscribers, &values);

        let dashboard = DashboardBuilder::new(&Config::default()).unwrap().build(&inputs, now());
        assert_eq!(dashboard.alerts.len(), 1);
        let alert = &dashboard.alerts[0];
        assert_eq!(alert.channel, "News");
        assert_eq!(alert.platform, Platform::Telegram);
        assert_eq!(alert.anomaly.kind, AnomalyKind::Drop);
        assert_eq!(dashboard.summary.alerts_count, 1);
        assert_eq!(dashboard.telegram.channels[0].alerts.len(), 1);

        let first = &dashboard.recommendations[0];
        assert_eq!(first.priority, Priority::Urgent);
        assert_eq!(first.channel, "Multiple");
    }

    #[test]
    fn test_json_round_trip() {
        let dashboard = DashboardBuilder::new(&Config::default()).unwrap().build(&inputs(), now());
        let json = serde_json::to_string(&dashboard).unwrap();
        let back: Dashboard = serde_json::from_str(&json).unwrap();
        assert_eq!(back.generated_at, dashboard.generated_at);
        assert_eq!(back.summary.best_channel, "Growing");
        assert_eq!(back.roi.len(), dashboard.roi.len());
        assert_eq!(back.youtube.channels[1].prediction, None);
        assert!(json.contains("\"status\":\"loss\""));
    }
}
