use super::series::Series;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Subscribers,
    Views,
    Videos,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Subscribers => write!(f, "subscribers"),
            Metric::Views => write!(f, "views"),
            Metric::Videos => write!(f, "videos"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityHistory {
    pub key: String,
    /// Display name from the most recent row.
    pub title: String,
    metrics: BTreeMap<Metric, Series>,
}

impl EntityHistory {
    fn new(key: &str, title: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn series(&self, metric: Metric) -> Option<&Series> {
        self.metrics.get(&metric)
    }
}

/// Per-channel metric history, one entry per tracked entity in the order the
/// entities first appear in the history file.
#[derive(Debug, Clone, Default)]
pub struct MetricsHistory {
    entities: Vec<EntityHistory>,
}

impl MetricsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        key: &str,
        title: &str,
        timestamp: DateTime<Utc>,
        metric: Metric,
        value: f64,
    ) {
        let idx = match self.entities.iter().position(|e| e.key == key) {
            Some(idx) => idx,
            None => {
                self.entities.push(EntityHistory::new(key, title));
                self.entities.len() - 1
            }
        };

        let entity = &mut self.entities[idx];
        if !title.is_empty() {
            entity.title = title.to_string();
        }
        entity.metrics.entry(metric).or_default().push(timestamp, value);
    }

    pub fn entity(&self, key: &str) -> Option<&EntityHistory> {
        self.entities.iter().find(|e| e.key == key)
    }

    pub fn entities(&self) -> &[EntityHistory] {
        &self.entities
    }

    pub fn series(&self, key: &str, metric: Metric) -> Option<&Series> {
        self.entity(key).and_then(|e| e.series(metric))
    }

    /// Network-wide series: the metric summed across entities per timestamp.
    pub fn total_series(&self, metric: Metric) -> Series {
        Series::sum_by_timestamp(self.entities.iter().filter_map(|e| e.series(metric)))
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}
