use super::types::{RoiEstimate, RoiStatus};
use crate::collectors::{Platform, TelegramChannelStats, YoutubeChannelStats};
use crate::config::RoiConfig;

/// Monthly ad revenue estimate: lifetime views spread over a year.
pub fn youtube_roi(channel: &YoutubeChannelStats, config: &RoiConfig) -> RoiEstimate {
    let monthly_views = channel.views as f64 / 12.0;
    let revenue = monthly_views * config.revenue_per_view;
    estimate(&channel.title, Platform::Youtube, revenue, config.youtube_monthly_cost)
}

/// Paid-conversion estimate. Channels whose member count is hidden from the
/// bot count as zero subscribers.
pub fn telegram_roi(channel: &TelegramChannelStats, config: &RoiConfig) -> RoiEstimate {
    let subscribers = channel.subscribers.unwrap_or(0) as f64;
    let revenue = if config.rub_per_usd > 0.0 {
        subscribers * config.telegram_conversion_rate * config.telegram_price_rub / config.rub_per_usd
    } else {
        0.0
    };
    estimate(&channel.name, Platform::Telegram, revenue, config.telegram_monthly_cost)
}

fn estimate(channel: &str, platform: Platform, revenue: f64, cost: f64) -> RoiEstimate {
    let roi_percent = if cost > 0.0 {
        (revenue - cost) / cost * 100.0
    } else {
        0.0
    };

    RoiEstimate {
        channel: channel.to_string(),
        platform,
        cost,
        potential_revenue: revenue,
        roi_percent,
        status: if roi_percent > 0.0 { RoiStatus::Profitable } else { RoiStatus::Loss },
    }
}
