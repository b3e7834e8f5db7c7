use crate::config::AlertsConfig;
use crate::dashboard::Dashboard;
use crate::trends::AnomalyKind;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Critical,
    Warning,
    Info,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Critical => write!(f, "CRITICAL"),
            AlertLevel::Warning => write!(f, "WARNING"),
            AlertLevel::Info => write!(f, "INFO"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    pub details: String,
}

impl Alert {
    fn new(level: AlertLevel, message: String, details: impl Into<String>) -> Self {
        Self {
            level,
            message,
            details: details.into(),
        }
    }
}

pub struct AlertDetector {
    config: AlertsConfig,
}

impl AlertDetector {
    pub fn new(config: AlertsConfig) -> Self {
        Self { config }
    }

    pub fn check_alerts(&self, dashboard: &Dashboard) -> Vec<Alert> {
        if !self.config.enabled {
            return Vec::new();
        }

        let mut new_alerts = Vec::new();

        // Sharp drops
        for alert in &dashboard.alerts {
            let anomaly = &alert.anomaly;
            if anomaly.kind == AnomalyKind::Drop && anomaly.percent_change < self.config.critical_drop_percent {
                new_alerts.push(Alert::new(
                    AlertLevel::Critical,
                    format!("{} lost {} {}", alert.channel, anomaly.change_label(), alert.metric),
                    format!("Expected: {:.0}, Actual: {:.0}", anomaly.baseline, anomaly.observed),
                ));
            }
        }

        // Stagnation
        let growth = dashboard.summary.growth_last_24h;
        if growth < 0.0 {
            new_alerts.push(Alert::new(
                AlertLevel::Warning,
                format!("Negative growth: {:.2}% per hour", growth),
                "Immediate action required to reverse trend",
            ));
        }

        // ROI
        for roi in &dashboard.roi {
            if roi.roi_percent < self.config.roi_loss_percent {
                new_alerts.push(Alert::new(
                    AlertLevel::Critical,
                    format!("{} is losing money: {:.1}% ROI", roi.channel, roi.roi_percent),
                    format!("Cost: ${:.0}, Revenue: ${:.0}", roi.cost, roi.potential_revenue),
                ));
            }
        }

        // Milestone
        if let Some(days) = dashboard.summary.days_to_1000 {
            if days > 0.0 && days < self.config.milestone_days {
                new_alerts.push(Alert::new(
                    AlertLevel::Info,
                    format!("Reaching 1000 subscribers in {:.1} days", days),
                    "Prepare celebration content",
                ));
            }
        }

        for alert in &new_alerts {
            match alert.level {
                AlertLevel::Critical => log::error!("{}: {} ({})", alert.level, alert.message, alert.details),
                AlertLevel::Warning => log::warn!("{}: {} ({})", alert.level, alert.message, alert.details),
                AlertLevel::Info => log::info!("{}: {} ({})", alert.level, alert.message, alert.details),
            }
        }

        new_alerts
    }
}
