use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Samples for one (entity, metric) pair, ordered by timestamp.
///
/// Construction sorts stably, so samples sharing a timestamp keep their
/// recording order. Gaps between collection runs are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn new() -> Self {
        Self { samples: Vec::new() }
    }

    pub fn from_samples(mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        Self { samples }
    }

    /// Appends a sample, keeping the ordering invariant for out-of-order input.
    pub fn push(&mut self, timestamp: DateTime<Utc>, value: f64) {
        let sample = Sample::new(timestamp, value);
        match self.samples.last() {
            Some(last) if last.timestamp > timestamp => {
                let idx = self.samples.partition_point(|s| s.timestamp <= timestamp);
                self.samples.insert(idx, sample);
            }
            _ => self.samples.push(sample),
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[cfg(test)]
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// The sample before the latest one.
    pub fn previous(&self) -> Option<&Sample> {
        self.samples.len().checked_sub(2).and_then(|i| self.samples.get(i))
    }

    /// Samples strictly newer than `as_of - window` and not newer than `as_of`.
    pub fn trailing(&self, window: Duration, as_of: DateTime<Utc>) -> &[Sample] {
        let cutoff = as_of - window;
        let start = self.samples.partition_point(|s| s.timestamp <= cutoff);
        let end = self.samples.partition_point(|s| s.timestamp <= as_of);
        if start >= end {
            &[]
        } else {
            &self.samples[start..end]
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sums several series per distinct timestamp. Used for network-wide totals.
    pub fn sum_by_timestamp<'a, I>(series: I) -> Series
    where
        I: IntoIterator<Item = &'a Series>,
    {
        let mut totals: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
        for s in series {
            for sample in &s.samples {
                *totals.entry(sample.timestamp).or_insert(0.0) += sample.value;
            }
        }

        Series {
            samples: totals
                .into_iter()
                .map(|(timestamp, value)| Sample::new(timestamp, value))
                .collect(),
        }
    }
}

impl FromIterator<Sample> for Series {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Series::from_samples(iter.into_iter().collect())
    }
}
