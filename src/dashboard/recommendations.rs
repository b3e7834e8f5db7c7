use super::types::{Priority, Recommendation, RoiEstimate, YoutubeChannelRecord};

pub const LOW_GROWTH_PER_HOUR: f64 = 0.1;
pub const LOW_ENGAGEMENT_PERCENT: f64 = 50.0;
pub const HEAVY_LOSS_PERCENT: f64 = -50.0;

fn recommendation(priority: Priority, channel: &str, action: &str, reason: String) -> Recommendation {
    Recommendation {
        priority,
        channel: channel.to_string(),
        action: action.to_string(),
        reason,
    }
}

/// Rule-based actions, most pressing first. Equal priorities keep the order
/// the rules produced them in.
pub fn recommend(
    channels: &[YoutubeChannelRecord],
    roi: &[RoiEstimate],
    alerts_count: usize,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    for channel in channels {
        if channel.growth_rate_hourly < LOW_GROWTH_PER_HOUR {
            out.push(recommendation(
                Priority::High,
                &channel.name,
                "Increase posting frequency or improve content quality",
                format!("Growth rate only {:.2}% per hour", channel.growth_rate_hourly),
            ));
        }

        if channel.engagement_rate < LOW_ENGAGEMENT_PERCENT {
            out.push(recommendation(
                Priority::Medium,
                &channel.name,
                "Improve thumbnails and titles",
                format!("Low engagement rate: {:.1}%", channel.engagement_rate),
            ));
        }
    }

    for estimate in roi {
        if estimate.roi_percent < HEAVY_LOSS_PERCENT {
            out.push(recommendation(
                Priority::High,
                &estimate.channel,
                "Reduce costs or pivot strategy",
                format!("ROI is {:.1}% (losing money)", estimate.roi_percent),
            ));
        }
    }

    if alerts_count > 0 {
        out.push(recommendation(
            Priority::Urgent,
            "Multiple",
            "Investigate anomalies immediately",
            format!("{} alerts detected", alerts_count),
        ));
    }

    // sort_by_key is stable
    out.sort_by_key(|r| r.priority);
    out
}
