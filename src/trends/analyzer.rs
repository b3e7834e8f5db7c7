use super::types::{AnomalyFlag, AnomalyKind, ForecastEstimate, GrowthEstimate, LinearFit};
use crate::history::{Sample, Series};
use chrono::{DateTime, Duration, Utc};

/// Knobs for the estimator. `Default` uses the crate-level constants.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorParams {
    pub growth_window: Duration,
    pub min_forecast_samples: usize,
    pub anomaly_window: usize,
    pub min_anomaly_samples: usize,
    pub drop_threshold_percent: f64,
    pub spike_threshold_percent: f64,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            growth_window: Duration::hours(super::DEFAULT_GROWTH_WINDOW_HOURS),
            min_forecast_samples: super::MIN_FORECAST_SAMPLES,
            anomaly_window: super::DEFAULT_ANOMALY_WINDOW,
            min_anomaly_samples: super::MIN_ANOMALY_SAMPLES,
            drop_threshold_percent: super::DROP_THRESHOLD_PERCENT,
            spike_threshold_percent: super::SPIKE_THRESHOLD_PERCENT,
        }
    }
}

/// Growth, forecast and anomaly signals over a [`Series`].
///
/// Every method is pure and total: thin or degenerate input gives a neutral
/// result (`0.0` growth, `None` forecast or anomaly), never an error.
#[derive(Debug, Clone, Default)]
pub struct TrendEstimator {
    params: EstimatorParams,
}

impl TrendEstimator {
    pub fn new(params: EstimatorParams) -> Self {
        Self { params }
    }

    /// Percent change per hour over the trailing window ending at the newest sample.
    pub fn growth_rate(&self, series: &Series) -> GrowthEstimate {
        match series.latest() {
            Some(latest) => self.growth_rate_at(series, latest.timestamp),
            None => GrowthEstimate { rate_per_hour: 0.0 },
        }
    }

    /// Same as [`growth_rate`](Self::growth_rate) with the window ending at `as_of`.
    pub fn growth_rate_at(&self, series: &Series, as_of: DateTime<Utc>) -> GrowthEstimate {
        let window = series.trailing(self.params.growth_window, as_of);
        GrowthEstimate {
            rate_per_hour: growth_over(window),
        }
    }

    pub fn forecast(&self, series: &Series, horizon_days: f64, target: f64) -> Option<ForecastEstimate> {
        let samples = series.samples();
        if samples.len() < self.params.min_forecast_samples.max(2) {
            return None;
        }

        let first = samples.first()?.timestamp;
        let points: Vec<(f64, f64)> = samples.iter()
            .map(|s| (hours_between(first, s.timestamp), s.value))
            .collect();

        let fit = linear_regression(&points)?;
        let (last_hour, current) = *points.last()?;

        let predicted_at_horizon = fit.slope * (last_hour + horizon_days * 24.0) + fit.intercept;
        let daily_delta = fit.slope * 24.0;

        // A flat or falling line never reaches the target.
        let days_to_target = if fit.slope > 0.0 {
            Some((target - current) / daily_delta)
        } else {
            None
        };

        Some(ForecastEstimate {
            current,
            predicted_at_horizon,
            daily_delta,
            days_to_target,
        })
    }

    /// Compares the newest sample with the mean of the `anomaly_window`
    /// samples just before it.
    pub fn anomaly(&self, series: &Series) -> Option<AnomalyFlag> {
        let samples = series.samples();
        let window = self.params.anomaly_window.max(1);
        if samples.len() < self.params.min_anomaly_samples.max(window + 1) {
            return None;
        }

        let (newest, previous) = samples.split_last()?;
        let baseline_samples = &previous[previous.len() - window..];
        let baseline = baseline_samples.iter().map(|s| s.value).sum::<f64>() / window as f64;

        if baseline <= 0.0 {
            return None;
        }

        let percent_change = (newest.value - baseline) / baseline * 100.0;

        let kind = if percent_change < self.params.drop_threshold_percent {
            AnomalyKind::Drop
        } else if percent_change > self.params.spike_threshold_percent {
            AnomalyKind::Spike
        } else {
            return None;
        };

        Some(AnomalyFlag {
            kind,
            observed: newest.value,
            baseline,
            percent_change,
        })
    }
}

fn growth_over(window: &[Sample]) -> f64 {
    let (Some(start), Some(end)) = (window.first(), window.last()) else {
        return 0.0;
    };
    if window.len() < 2 || start.value == 0.0 {
        return 0.0;
    }

    let hours = hours_between(start.timestamp, end.timestamp);
    if hours <= 0.0 {
        return 0.0;
    }

    ((end.value - start.value) / start.value) / hours * 100.0
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

/// Ordinary least squares over `(x, y)` points. `None` when every x is the
/// same and no line can be fitted.
pub fn linear_regression(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (x, y) in points {
        numerator += (x - mean_x) * (y - mean_y);
        denominator += (x - mean_x).powi(2);
    }

    if denominator == 0.0 {
        return None;
    }

    let slope = numerator / denominator;
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (x, y) in points {
        let y_pred = slope * x + intercept;
        ss_res += (y - y_pred).powi(2);
        ss_tot += (y - mean_y).powi(2);
    }

    let r_squared = if ss_tot != 0.0 {
        (1.0 - ss_res / ss_tot).max(0.0)
    } else {
        1.0
    };

    Some(LinearFit { slope, intercept, r_squared })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EPS: f64 = 1e-9;

    fn at(hour: f64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
            + Duration::milliseconds((hour * 3_600_000.0) as i64)
    }

    fn hourly(values: &[f64]) -> Series {
        values.iter()
            .enumerate()
            .map(|(h, v)| Sample::new(at(h as f64), *v))
            .collect()
    }

    /// Nine samples at 100 followed by `newest`, so the baseline is exactly 100.
    fn with_newest(newest: f64) -> Series {
        let mut values = vec![100.0; 9];
        values.push(newest);
        hourly(&values)
    }

    #[test]
    fn test_growth_equal_endpoints_is_zero() {
        let estimator = TrendEstimator::default();
        let series = hourly(&[500.0, 520.0, 480.0, 500.0]);
        assert_eq!(estimator.growth_rate(&series).rate_per_hour, 0.0);
    }

    #[test]
    fn test_growth_needs_two_samples_in_window() {
        let estimator = TrendEstimator::default();
        assert_eq!(estimator.growth_rate(&Series::new()).rate_per_hour, 0.0);
        assert_eq!(estimator.growth_rate(&hourly(&[10.0])).rate_per_hour, 0.0);

        // Only the newest sample is inside the trailing 24h.
        let series: Series = vec![Sample::new(at(0.0), 10.0), Sample::new(at(48.0), 20.0)]
            .into_iter()
            .collect();
        assert_eq!(estimator.growth_rate(&series).rate_per_hour, 0.0);
    }

    #[test]
    fn test_growth_zero_start_and_zero_elapsed() {
        let estimator = TrendEstimator::default();
        assert_eq!(estimator.growth_rate(&hourly(&[0.0, 10.0, 20.0])).rate_per_hour, 0.0);

        let same_instant: Series = vec![Sample::new(at(1.0), 10.0), Sample::new(at(1.0), 20.0)]
            .into_iter()
            .collect();
        assert_eq!(estimator.growth_rate(&same_instant).rate_per_hour, 0.0);
    }

    #[test]
    fn test_growth_formula() {
        let estimator = TrendEstimator::default();
        // 100 -> 110 over 10 hours: 10% / 10h = 1% per hour.
        let series: Series = vec![Sample::new(at(0.0), 100.0), Sample::new(at(10.0), 110.0)]
            .into_iter()
            .collect();
        assert!((estimator.growth_rate(&series).rate_per_hour - 1.0).abs() < EPS);
    }

    #[test]
    fn test_growth_uses_only_trailing_window() {
        let estimator = TrendEstimator::default();
        let mut values = vec![1.0; 10];
        values.extend((0..25).map(|i| 200.0 + i as f64 * 2.0));
        let series = hourly(&values);
        // Window covers hours 11..=34: values 202 -> 248 over 23h.
        let expected = ((248.0 - 202.0) / 202.0) / 23.0 * 100.0;
        assert!((estimator.growth_rate(&series).rate_per_hour - expected).abs() < EPS);
    }

    #[test]
    fn test_growth_as_of_now_with_stale_history() {
        let estimator = TrendEstimator::default();
        let series = hourly(&[100.0, 110.0, 120.0]);
        assert_eq!(estimator.growth_rate_at(&series, at(100.0)).rate_per_hour, 0.0);
        assert!(estimator.growth_rate_at(&series, at(2.0)).rate_per_hour > 0.0);
    }

    #[test]
    fn test_forecast_requires_three_samples() {
        let estimator = TrendEstimator::default();
        assert!(estimator.forecast(&Series::new(), 7.0, 1000.0).is_none());
        assert!(estimator.forecast(&hourly(&[1.0, 2.0]), 7.0, 1000.0).is_none());
        assert!(estimator.forecast(&hourly(&[1.0, 2.0, 3.0]), 7.0, 1000.0).is_some());
    }

    #[test]
    fn test_forecast_linear_series() {
        let estimator = TrendEstimator::default();
        let values: Vec<f64> = (0..10).map(|h| 10.0 + 2.0 * h as f64).collect();
        let forecast = estimator.forecast(&hourly(&values), 7.0, 1000.0).unwrap();

        let last_hour = 9.0;
        assert!((forecast.predicted_at_horizon - (2.0 * (last_hour + 168.0) + 10.0)).abs() < 1e-6);
        assert!((forecast.current - 28.0).abs() < EPS);
        assert!((forecast.daily_delta - 48.0).abs() < 1e-6);
        let days = forecast.days_to_target.unwrap();
        assert!((days - (1000.0 - 28.0) / 48.0).abs() < 1e-6);
    }

    #[test]
    fn test_forecast_irregular_spacing_uses_hours() {
        let estimator = TrendEstimator::default();
        let series: Series = [0.0, 1.5, 7.0, 30.0]
            .iter()
            .map(|h| Sample::new(at(*h), 5.0 + 0.5 * h))
            .collect();
        let forecast = estimator.forecast(&series, 1.0, 1000.0).unwrap();
        assert!((forecast.predicted_at_horizon - (5.0 + 0.5 * 54.0)).abs() < 1e-6);
    }

    #[test]
    fn test_forecast_no_eta_when_not_rising() {
        let estimator = TrendEstimator::default();
        let flat = estimator.forecast(&hourly(&[50.0, 50.0, 50.0, 50.0]), 7.0, 1000.0).unwrap();
        assert_eq!(flat.days_to_target, None);
        assert_eq!(flat.daily_delta, 0.0);

        let falling = estimator.forecast(&hourly(&[90.0, 80.0, 70.0]), 7.0, 1000.0).unwrap();
        assert_eq!(falling.days_to_target, None);
        assert!(falling.predicted_at_horizon < 70.0);
    }

    #[test]
    fn test_forecast_single_instant_is_none() {
        let estimator = TrendEstimator::default();
        let series: Series = (0..4).map(|i| Sample::new(at(3.0), i as f64)).collect();
        assert!(estimator.forecast(&series, 7.0, 1000.0).is_none());
    }

    #[test]
    fn test_anomaly_needs_ten_samples() {
        let estimator = TrendEstimator::default();
        let mut values = vec![100.0; 8];
        values.push(1.0);
        assert!(estimator.anomaly(&hourly(&values)).is_none());
        values.push(1000.0);
        assert!(estimator.anomaly(&hourly(&values)).is_some());
    }

    #[test]
    fn test_anomaly_drop() {
        let flag = TrendEstimator::default().anomaly(&with_newest(85.0)).unwrap();
        assert_eq!(flag.kind, AnomalyKind::Drop);
        assert!((flag.percent_change + 15.0).abs() < EPS);
        assert!((flag.baseline - 100.0).abs() < EPS);
        assert_eq!(flag.observed, 85.0);
        assert_eq!(flag.change_label(), "-15.0%");
    }

    #[test]
    fn test_anomaly_spike() {
        let flag = TrendEstimator::default().anomaly(&with_newest(160.0)).unwrap();
        assert_eq!(flag.kind, AnomalyKind::Spike);
        assert!((flag.percent_change - 60.0).abs() < EPS);
        assert_eq!(flag.change_label(), "+60.0%");
    }

    #[test]
    fn test_anomaly_within_thresholds() {
        let estimator = TrendEstimator::default();
        assert!(estimator.anomaly(&with_newest(92.0)).is_none());
        assert!(estimator.anomaly(&with_newest(140.0)).is_none());
    }

    #[test]
    fn test_anomaly_baseline_ignores_older_samples() {
        // Old values far from 100 must not move the 5-sample baseline.
        let values = vec![1.0, 1.0, 1.0, 1.0, 100.0, 100.0, 100.0, 100.0, 100.0, 85.0];
        let flag = TrendEstimator::default().anomaly(&hourly(&values)).unwrap();
        assert!((flag.baseline - 100.0).abs() < EPS);
    }

    #[test]
    fn test_anomaly_zero_baseline() {
        let mut values = vec![0.0; 9];
        values.push(50.0);
        assert!(TrendEstimator::default().anomaly(&hourly(&values)).is_none());
    }

    #[test]
    fn test_overridden_thresholds() {
        let estimator = TrendEstimator::new(EstimatorParams {
            drop_threshold_percent: -5.0,
            min_anomaly_samples: 6,
            ..EstimatorParams::default()
        });
        let flag = estimator.anomaly(&hourly(&[100.0, 100.0, 100.0, 100.0, 100.0, 92.0])).unwrap();
        assert_eq!(flag.kind, AnomalyKind::Drop);
    }

    #[test]
    fn test_calls_are_idempotent() {
        let estimator = TrendEstimator::default();
        let series = with_newest(160.0);
        assert_eq!(estimator.growth_rate(&series), estimator.growth_rate(&series));
        assert_eq!(estimator.forecast(&series, 7.0, 1000.0), estimator.forecast(&series, 7.0, 1000.0));
        assert_eq!(estimator.anomaly(&series), estimator.anomaly(&series));
    }

    #[test]
    fn test_linear_regression_r_squared() {
        let fit = linear_regression(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert!((fit.slope - 2.0).abs() < EPS);
        assert!((fit.intercept - 1.0).abs() < EPS);
        assert!((fit.r_squared - 1.0).abs() < EPS);
        assert!(linear_regression(&[(1.0, 1.0), (1.0, 2.0)]).is_none());
    }
}
