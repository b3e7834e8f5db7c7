use super::format::{cell, days_label, signed_thousands, thousands, truncate};
use crate::collectors::{TelegramSnapshot, YoutubeSnapshot};
use crate::dashboard::{Dashboard, Priority, RoiStatus};
use crate::history::store::{TELEGRAM_CSV, TELEGRAM_LATEST, YOUTUBE_CSV, YOUTUBE_LATEST};
use crate::history::{Metric, MetricsHistory};
use crate::trends::AnomalyKind;
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Urgent => "🔴",
        Priority::High => "🟠",
        Priority::Medium => "🟡",
        Priority::Low => "🟢",
    }
}

/// `dashboard.md`
pub fn dashboard_markdown(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let _ = write_dashboard(&mut out, dashboard);
    out
}

fn write_dashboard(out: &mut String, dashboard: &Dashboard) -> fmt::Result {
    let summary = &dashboard.summary;

    writeln!(out, "# Channel Pulse - Analytics Dashboard\n")?;
    writeln!(out, "*Generated: {}*\n", dashboard.generated_at.format("%Y-%m-%d %H:%M:%S"))?;

    writeln!(out, "## 🎯 5-Minute Decision Summary\n")?;
    writeln!(out, "- **Total Reach**: {} subscribers", thousands(summary.total_reach))?;
    writeln!(out, "- **24h Growth**: {:.2}% per hour", summary.growth_last_24h)?;
    writeln!(out, "- **Best Performer**: {}", summary.best_channel)?;
    writeln!(out, "- **Active Alerts**: {}", summary.alerts_count)?;
    writeln!(out, "- **Days to 1000 subs**: {}\n", days_label(summary.days_to_1000))?;

    writeln!(out, "## 🚨 Alerts & Anomalies\n")?;
    if dashboard.alerts.is_empty() {
        writeln!(out, "✅ No anomalies detected")?;
    }
    for alert in &dashboard.alerts {
        let marker = match alert.anomaly.kind {
            AnomalyKind::Drop => "📉",
            AnomalyKind::Spike => "📈",
        };
        writeln!(out, "- {} **{}**: {} {} (expected: {:.0}, actual: {:.0})",
            marker, alert.channel, alert.metric, alert.anomaly.change_label(),
            alert.anomaly.baseline, alert.anomaly.observed)?;
    }

    writeln!(out, "\n## 📊 Channel Performance\n")?;
    writeln!(out, "| Channel | Subscribers | Growth/hour | Engagement | 7-day Prediction |")?;
    writeln!(out, "|---------|------------|-------------|------------|------------------|")?;
    for channel in &dashboard.youtube.channels {
        let prediction = channel.prediction
            .map(|p| format!("{:.0}", p.predicted_at_horizon))
            .unwrap_or_else(|| "N/A".to_string());
        writeln!(out, "| {} | {} | {:.2}% | {:.1}% | {} |",
            cell(&channel.name), thousands(channel.subscribers),
            channel.growth_rate_hourly, channel.engagement_rate, prediction)?;
    }
    for channel in &dashboard.telegram.channels {
        let subscribers = channel.subscribers.map(thousands).unwrap_or_else(|| "N/A".to_string());
        writeln!(out, "| {} | {} | {:.2}% | N/A | N/A |",
            cell(&channel.name), subscribers, channel.growth_rate_hourly)?;
    }

    writeln!(out, "\n## 💰 ROI Analysis\n")?;
    writeln!(out, "| Channel | Cost | Potential Revenue | ROI | Status |")?;
    writeln!(out, "|---------|------|------------------|-----|--------|")?;
    for roi in &dashboard.roi {
        let marker = if roi.status == RoiStatus::Profitable { "✅" } else { "❌" };
        writeln!(out, "| {} | ${:.0} | ${:.0} | {:.1}% | {} {} |",
            cell(&roi.channel), roi.cost, roi.potential_revenue, roi.roi_percent, marker, roi.status)?;
    }

    writeln!(out, "\n## 📋 Recommendations\n")?;
    if dashboard.recommendations.is_empty() {
        writeln!(out, "Nothing to act on.")?;
    }
    for rec in &dashboard.recommendations {
        writeln!(out, "{} **{}** - {}: {}", priority_marker(rec.priority), rec.priority, rec.channel, rec.action)?;
        writeln!(out, "   - *Reason: {}*\n", rec.reason)?;
    }

    Ok(())
}

/// Inputs for the combined report: the latest snapshots plus the histories
/// the growth section is computed from.
pub struct ReportInputs<'a> {
    pub youtube: Option<&'a YoutubeSnapshot>,
    pub telegram: Option<&'a TelegramSnapshot>,
    pub youtube_history: &'a MetricsHistory,
    pub telegram_history: &'a MetricsHistory,
    /// Directory name the data file links point into.
    pub data_dir: &'a str,
    pub generated_at: DateTime<Utc>,
}

/// `report.md`
pub fn combined_report(inputs: &ReportInputs<'_>) -> String {
    let mut out = String::new();
    let _ = write_combined(&mut out, inputs);
    out
}

fn write_combined(out: &mut String, inputs: &ReportInputs<'_>) -> fmt::Result {
    writeln!(out, "# 📊 Channel Pulse - Analytics Report\n")?;
    writeln!(out, "*Last updated: {} UTC*\n", inputs.generated_at.format("%Y-%m-%d %H:%M"))?;

    writeln!(out, "## 🎯 Executive Summary\n")?;
    let mut total_reach = 0;
    let mut platforms = Vec::new();

    if let Some(youtube) = inputs.youtube {
        let subscribers: u64 = youtube.channels.iter().map(|c| c.subscribers).sum();
        let views: u64 = youtube.channels.iter().map(|c| c.views).sum();
        total_reach += subscribers;
        platforms.push(format!("YouTube: {} subscribers", thousands(subscribers)));
        writeln!(out, "- **YouTube**: {} channels, {} subscribers, {} total views",
            youtube.channels.len(), thousands(subscribers), thousands(views))?;
    }
    if let Some(telegram) = inputs.telegram {
        let active = telegram.accessible().count();
        let subscribers: u64 = telegram.accessible().filter_map(|c| c.subscribers).sum();
        total_reach += subscribers;
        platforms.push(format!("Telegram: {} channels", active));
        writeln!(out, "- **Telegram Network**: {} active channels", active)?;
    }
    if platforms.is_empty() {
        writeln!(out, "No data collected yet.")?;
    } else {
        writeln!(out, "\n**Total Reach**: {} subscribers across {}\n", thousands(total_reach), platforms.join(", "))?;
    }

    if let Some(youtube) = inputs.youtube {
        writeln!(out, "## 📺 YouTube Analytics\n")?;
        writeln!(out, "| Channel | Subscribers | Total Views | Videos | Avg Views |")?;
        writeln!(out, "|---------|------------|-------------|--------|----------|")?;
        for channel in &youtube.channels {
            writeln!(out, "| {} | {} | {} | {} | {} |",
                cell(&channel.title), thousands(channel.subscribers), thousands(channel.views),
                channel.videos, thousands(channel.average_views()))?;
        }

        if !youtube.recent_videos.is_empty() {
            writeln!(out, "\n### 🎬 Top Recent Videos\n")?;
            let mut videos: Vec<_> = youtube.recent_videos.iter().collect();
            videos.sort_by(|a, b| b.views.cmp(&a.views));
            for (i, video) in videos.iter().take(5).enumerate() {
                writeln!(out, "{}. **{}**", i + 1, truncate(&video.title, 60))?;
                writeln!(out, "   - Views: {} | Likes: {}", thousands(video.views), thousands(video.likes))?;
            }
        }
        writeln!(out)?;
    }

    if let Some(telegram) = inputs.telegram {
        writeln!(out, "## 💬 Telegram Analytics\n")?;
        writeln!(out, "*Note: Using Bot API - limited metrics available*\n")?;
        writeln!(out, "| Channel | Username | Bot Admin | Subscribers* |")?;
        writeln!(out, "|---------|----------|-----------|-------------|")?;
        for channel in telegram.accessible() {
            let subscribers = channel.subscribers.map(thousands).unwrap_or_else(|| "N/A".to_string());
            let admin = if channel.bot_is_admin { "✅" } else { "❌" };
            writeln!(out, "| {} | {} | {} | {} |", cell(&channel.name), channel.username, admin, subscribers)?;
        }
        writeln!(out, "\n*Subscriber counts only available where the bot can read the member list\n")?;
    }

    writeln!(out, "## 📈 Growth Trends\n")?;
    let deltas: Vec<(String, i64)> = subscriber_deltas(inputs.youtube_history)
        .into_iter()
        .chain(subscriber_deltas(inputs.telegram_history))
        .collect();
    if deltas.is_empty() {
        writeln!(out, "No subscriber changes since the previous snapshot.")?;
    }
    for (title, delta) in deltas {
        writeln!(out, "- **{}**: {} subscribers", title, signed_thousands(delta))?;
    }

    let dir = inputs.data_dir.trim_end_matches('/');
    writeln!(out, "\n## 🔗 Data Access\n")?;
    writeln!(out, "### YouTube Data")?;
    writeln!(out, "- Latest: [{0}/{1}]({0}/{1})", dir, YOUTUBE_LATEST)?;
    writeln!(out, "- History: [{0}/{1}]({0}/{1})\n", dir, YOUTUBE_CSV)?;
    writeln!(out, "### Telegram Data")?;
    writeln!(out, "- Latest: [{0}/{1}]({0}/{1})", dir, TELEGRAM_LATEST)?;
    writeln!(out, "- History: [{0}/{1}]({0}/{1})", dir, TELEGRAM_CSV)?;

    Ok(())
}

/// Latest minus previous subscriber count per entity, non-zero changes only.
fn subscriber_deltas(history: &MetricsHistory) -> Vec<(String, i64)> {
    history.entities().iter()
        .filter_map(|entity| {
            let series = entity.series(Metric::Subscribers)?;
            let delta = series.latest()?.value - series.previous()?.value;
            let delta = delta.round() as i64;
            (delta != 0).then(|| (entity.title.clone(), delta))
        })
        .collect()
}

/// `daily_summary.md`
pub fn daily_summary(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let _ = write_daily(&mut out, dashboard);
    out
}

fn write_daily(out: &mut String, dashboard: &Dashboard) -> fmt::Result {
    let summary = &dashboard.summary;

    writeln!(out, "# 📊 Daily Analytics Summary - {}\n", dashboard.generated_at.format("%Y-%m-%d"))?;
    writeln!(out, "## 🎯 Key Metrics")?;
    writeln!(out, "- **Total Reach**: {} subscribers", thousands(summary.total_reach))?;
    writeln!(out, "- **24h Growth**: {:.2}% per hour", summary.growth_last_24h)?;
    writeln!(out, "- **Best Performer**: {}", summary.best_channel)?;
    writeln!(out, "- **Days to 1K**: {}\n", days_label(summary.days_to_1000))?;

    writeln!(out, "## 📈 Channel Performance")?;
    for channel in &dashboard.youtube.channels {
        writeln!(out, "\n**{}**", channel.name)?;
        writeln!(out, "- Subscribers: {}", thousands(channel.subscribers))?;
        writeln!(out, "- Growth: {:.2}%/hour", channel.growth_rate_hourly)?;
        writeln!(out, "- Engagement: {:.1}%", channel.engagement_rate)?;
        if let Some(prediction) = channel.prediction {
            writeln!(out, "- 7-day forecast: {:.0}", prediction.predicted_at_horizon)?;
        }
    }

    writeln!(out, "\n## 💰 ROI Summary")?;
    writeln!(out, "- Profitable channels: {}/{}", dashboard.profitable_count(), dashboard.roi.len())?;
    let best = dashboard.roi.iter()
        .fold(None, |best: Option<&crate::dashboard::RoiEstimate>, r| match best {
            Some(b) if b.roi_percent >= r.roi_percent => Some(b),
            _ => Some(r),
        });
    if let Some(best) = best {
        writeln!(out, "- Best ROI: {}", best.channel)?;
    }

    writeln!(out, "\n## 📋 Top Recommendations")?;
    for rec in dashboard.recommendations.iter().take(3) {
        writeln!(out, "- **{}**: {} ({})", rec.priority, rec.action, rec.channel)?;
    }

    Ok(())
}
