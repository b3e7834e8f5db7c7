use super::format::{days_label, growth_arrow, status_marker, thousands, truncate};
use super::quick::QuickData;
use crate::alerts::Alert;
use crate::dashboard::Dashboard;
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};

const RULE: &str = "==================================================";

struct Row {
    name: String,
    subscribers: Option<u64>,
    growth: Option<f64>,
}

/// The five-minute summary printed by `pulse quick`.
pub fn quick_summary(data: &QuickData, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_quick_summary(&mut out, data, now);
    out
}

fn write_quick_summary(out: &mut String, data: &QuickData, now: DateTime<Utc>) -> fmt::Result {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "  Channel Pulse - 5-Minute Metrics")?;
    writeln!(out, "  {}", now.format("%Y-%m-%d %H:%M"))?;
    writeln!(out, "{}", RULE)?;

    let dashboard = match data {
        QuickData::Dashboard(d) => d,
        QuickData::Snapshots { .. } => {
            let reach: u64 = rows(data).iter().filter_map(|r| r.subscribers).sum();
            writeln!(out)?;
            writeln!(out, "Total Reach: {} subscribers", thousands(reach))?;
            writeln!(out, "(no dashboard yet: growth, alerts and ROI unavailable)")?;
            return Ok(());
        }
    };

    let summary = &dashboard.summary;
    writeln!(out)?;
    writeln!(out, "Total Reach: {} subscribers", thousands(summary.total_reach))?;
    writeln!(out, "24h Growth: {:.2}% {}", summary.growth_last_24h, growth_arrow(summary.growth_last_24h))?;
    writeln!(out, "Best Channel: {}", summary.best_channel)?;
    if let Some(days) = summary.days_to_1000 {
        writeln!(out, "Days to 1K: {:.1} days", days)?;
    }

    writeln!(out)?;
    if dashboard.alerts.is_empty() {
        writeln!(out, "✅ No alerts")?;
    } else {
        writeln!(out, "⚠️  Active Alerts: {}", dashboard.alerts.len())?;
        for alert in dashboard.alerts.iter().take(3) {
            writeln!(out, "  • {}: {} {}", alert.channel, alert.anomaly.change_label(), alert.metric)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "🎯 Quick Actions:")?;
    for (i, rec) in dashboard.recommendations.iter().take(3).enumerate() {
        writeln!(out, "{}. {}: {}", i + 1, rec.priority, rec.action)?;
    }

    writeln!(out)?;
    writeln!(out, "💰 ROI: {}/{} channels profitable", dashboard.profitable_count(), dashboard.roi.len())?;
    Ok(())
}

fn rows(data: &QuickData) -> Vec<Row> {
    match data {
        QuickData::Dashboard(d) => dashboard_rows(d),
        QuickData::Snapshots { youtube, telegram } => {
            let youtube_rows = youtube.iter()
                .flat_map(|s| s.channels.iter())
                .map(|c| Row { name: c.title.clone(), subscribers: Some(c.subscribers), growth: None });
            let telegram_rows = telegram.iter()
                .flat_map(|s| s.accessible())
                .map(|c| Row { name: c.name.clone(), subscribers: c.subscribers, growth: None });
            youtube_rows.chain(telegram_rows).collect()
        }
    }
}

fn dashboard_rows(dashboard: &Dashboard) -> Vec<Row> {
    let youtube = dashboard.youtube.channels.iter().map(|c| Row {
        name: c.name.clone(),
        subscribers: Some(c.subscribers),
        growth: Some(c.growth_rate_hourly),
    });
    let telegram = dashboard.telegram.channels.iter().map(|c| Row {
        name: c.name.clone(),
        subscribers: c.subscribers,
        growth: Some(c.growth_rate_hourly),
    });
    youtube.chain(telegram).collect()
}

/// Per-channel table with a traffic-light status on hourly growth.
pub fn channel_table(data: &QuickData) -> String {
    let mut out = String::new();
    let _ = write_channel_table(&mut out, &rows(data));
    out
}

fn write_channel_table(out: &mut String, rows: &[Row]) -> fmt::Result {
    writeln!(out, "Channel Performance")?;
    writeln!(out, "{:<28} {:>12} {:>10}  {}", "Channel", "Subscribers", "Growth/h", "Status")?;
    writeln!(out, "{}", "-".repeat(60))?;

    for row in rows {
        let subscribers = row.subscribers.map(thousands).unwrap_or_else(|| "N/A".to_string());
        let (growth, status) = match row.growth {
            Some(g) => (format!("{:.2}%", g), status_marker(g)),
            None => ("N/A".to_string(), "⚪"),
        };
        writeln!(out, "{:<28} {:>12} {:>10}  {}", truncate(&row.name, 25), subscribers, growth, status)?;
    }
    Ok(())
}

/// One line per dashboard alert, as printed by `pulse alerts`.
pub fn alert_lines(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "✅ No critical alerts\n".to_string();
    }

    let mut out = format!("🚨 Found {} alert(s):\n", alerts.len());
    for alert in alerts {
        out.push_str(&format!("- {}: {}\n    {}\n", alert.level, alert.message, alert.details));
    }
    out
}

/// Short recap printed after `pulse dashboard` and `pulse run`.
pub fn dashboard_recap(dashboard: &Dashboard) -> String {
    let summary = &dashboard.summary;
    format!(
        "Total Reach: {}\nGrowth Rate: {:.2}% per hour\nAlerts: {}\nBest Channel: {}\nDays to 1K: {}\n",
        thousands(summary.total_reach),
        summary.growth_last_24h,
        summary.alerts_count,
        summary.best_channel,
        days_label(summary.days_to_1000),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{Platform, YoutubeSnapshot};
    use crate::dashboard::*;
    use crate::history::Metric;
    use crate::trends::{AnomalyFlag, AnomalyKind};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap()
    }

    fn dashboard() -> Dashboard {
        Dashboard {
            generated_at: now(),
            summary: Summary {
                total_reach: 12_345,
                growth_last_24h: -0.3,
                best_channel: "Tech".to_string(),
                alerts_count: 1,
                days_to_1000: Some(4.25),
            },
            youtube: YoutubeSection {
                total_subscribers: 12_000,
                total_views: 50_000,
                channels: vec![YoutubeChannelRecord {
                    name: "Tech".to_string(),
                    channel_id: "UC1".to_string(),
                    subscribers: 12_000,
                    views: 50_000,
                    videos: 10,
                    growth_rate_hourly: 0.75,
                    engagement_rate: 41.0,
                    prediction: None,
                    alerts: Vec::new(),
                }],
            },
            telegram: TelegramSection {
                total_subscribers: 345,
                channels: vec![TelegramChannelRecord {
                    name: "News".to_string(),
                    username: "@news".to_string(),
                    subscribers: None,
                    bot_is_admin: false,
                    growth_rate_hourly: 0.0,
                    alerts: Vec::new(),
                }],
            },
            predictions: Predictions::default(),
            alerts: vec![ChannelAlert {
                channel: "Tech".to_string(),
                platform: Platform::Youtube,
                metric: Metric::Subscribers,
                anomaly: AnomalyFlag { kind: AnomalyKind::Drop, observed: 80.0, baseline: 100.0, percent_change: -20.0 },
            }],
            roi: vec![
                RoiEstimate {
                    channel: "Tech".to_string(),
                    platform: Platform::Youtube,
                    cost: 500.0,
                    potential_revenue: 600.0,
                    roi_percent: 20.0,
                    status: RoiStatus::Profitable,
                },
                RoiEstimate {
                    channel: "News".to_string(),
                    platform: Platform::Telegram,
                    cost: 100.0,
                    potential_revenue: 0.0,
                    roi_percent: -100.0,
                    status: RoiStatus::Loss,
                },
            ],
            recommendations: vec![Recommendation {
                priority: Priority::Urgent,
                channel: "Multiple".to_string(),
                action: "Investigate anomalies immediately".to_string(),
                reason: "1 alerts detected".to_string(),
            }],
        }
    }

    #[test]
    fn test_quick_summary_from_dashboard() {
        let text = quick_summary(&QuickData::Dashboard(Box::new(dashboard())), now());
        assert!(text.contains("2024-03-10 09:30"));
        assert!(text.contains("Total Reach: 12,345 subscribers"));
        assert!(text.contains("24h Growth: -0.30% ↓"));
        assert!(text.contains("Days to 1K: 4.2 days") || text.contains("Days to 1K: 4.3 days"));
        assert!(text.contains("Active Alerts: 1"));
        assert!(text.contains("• Tech: -20.0% subscribers"));
        assert!(text.contains("1. URGENT: Investigate anomalies immediately"));
        assert!(text.contains("ROI: 1/2 channels profitable"));
    }

    #[test]
    fn test_quick_summary_from_snapshots() {
        let data = QuickData::Snapshots {
            youtube: Some(YoutubeSnapshot { generated_at: now(), channels: Vec::new(), recent_videos: Vec::new() }),
            telegram: None,
        };
        let text = quick_summary(&data, now());
        assert!(text.contains("Total Reach: 0 subscribers"));
        assert!(text.contains("no dashboard yet"));
    }

    #[test]
    fn test_channel_table_status() {
        let table = channel_table(&QuickData::Dashboard(Box::new(dashboard())));
        let tech = table.lines().find(|l| l.starts_with("Tech")).unwrap();
        assert!(tech.contains("12,000"));
        assert!(tech.contains("0.75%"));
        assert!(tech.ends_with("🟢"));

        let news = table.lines().find(|l| l.starts_with("News")).unwrap();
        assert!(news.contains("N/A"));
        assert!(news.ends_with("🔴"));
    }

    #[test]
    fn test_alert_lines() {
        assert_eq!(alert_lines(&[]), "✅ No critical alerts\n");
    }

    #[test]
    fn test_recap() {
        let recap = dashboard_recap(&dashboard());
        assert!(recap.contains("Growth Rate: -0.30% per hour"));
        assert!(recap.contains("Best Channel: Tech"));
    }
}
