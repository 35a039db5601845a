use super::{denoise_scores, DetectorAlgorithm, DetectorParams};
use crate::timeseries::TimeSeries;
use crate::types::Result;
use crate::util::compute_ema;

const DEFAULT_EMA_SMOOTHING_FACTOR: f64 = 0.2;
// Window size as a fraction of the whole data length.
const DEFAULT_EMA_WINDOW_SIZE_PCT: f64 = 0.2;

/// Exponential moving average detector.
///
/// A data point's anomaly score is its deviation from the exponential
/// moving average, normalized by the standard deviation of the whole
/// series. By default the average decays over all preceding points; with
/// `use_lag_window` it is computed over a fixed-size lagging window
/// instead.
pub struct ExpAvgDetector {
    smoothing_factor: f64,
    use_lag_window: bool,
    lag_window_size: Option<usize>,
}

impl ExpAvgDetector {
    pub fn new(params: &DetectorParams) -> ExpAvgDetector {
        let smoothing_factor = match params.smoothing_factor {
            Some(factor) if factor > 0.0 => factor,
            _ => DEFAULT_EMA_SMOOTHING_FACTOR,
        };
        ExpAvgDetector {
            smoothing_factor,
            use_lag_window: params.use_lag_window.unwrap_or(false),
            lag_window_size: params.lag_window_size,
        }
    }

    fn scores_with_lag_window(&self, time_series: &TimeSeries) -> Vec<f64> {
        let values = time_series.values();
        let window = self
            .lag_window_size
            .unwrap_or((values.len() as f64 * DEFAULT_EMA_WINDOW_SIZE_PCT) as usize);
        let stdev = time_series.stdev().unwrap_or(0.0);
        let mut scores = Vec::with_capacity(values.len());
        for (i, &value) in values.iter().enumerate() {
            let lag_window = &values[i.saturating_sub(window)..=i];
            let ema = compute_ema(self.smoothing_factor, lag_window);
            let ema_last = ema.last().copied().unwrap_or(value);
            let mut score = (value - ema_last).abs();
            if stdev != 0.0 {
                score /= stdev;
            }
            scores.push(score);
        }
        scores
    }

    fn scores_decay_all(&self, time_series: &TimeSeries) -> Vec<f64> {
        let values = time_series.values();
        let ema = compute_ema(self.smoothing_factor, values);
        let stdev = time_series.stdev().unwrap_or(0.0);
        values
            .iter()
            .zip(&ema)
            .map(|(&value, &ema_value)| {
                if stdev != 0.0 {
                    ((value - ema_value) / stdev).abs()
                } else {
                    value - ema_value
                }
            })
            .collect()
    }
}

impl DetectorAlgorithm for ExpAvgDetector {
    fn run(&self, time_series: &TimeSeries, _baseline: Option<&TimeSeries>) -> Result<TimeSeries> {
        let mut scores = if self.use_lag_window {
            self.scores_with_lag_window(time_series)
        } else {
            self.scores_decay_all(time_series)
        };
        denoise_scores(&mut scores);
        Ok(time_series.timestamps().iter().copied().zip(scores).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(i64, f64)]) -> TimeSeries {
        TimeSeries::new(points.iter().copied())
    }

    #[test]
    fn flat_series_scores_zero() {
        let ts = series(&[(0, 1.0), (1, 1.0), (2, 1.0), (3, 1.0)]);
        let scores = ExpAvgDetector::new(&DetectorParams::default())
            .run(&ts, None)
            .unwrap();
        assert_eq!(scores.len(), ts.len());
        assert!(scores.values().iter().all(|&score| score == 0.0));
    }

    #[test]
    fn spike_scores_highest_at_the_spike() {
        let ts = series(&[(0, 1.0), (1, 1.0), (2, 1.0), (3, 10.0), (4, 1.0)]);
        let scores = ExpAvgDetector::new(&DetectorParams::default())
            .run(&ts, None)
            .unwrap();
        let max = scores.max().unwrap();
        assert_eq!(scores.value_at(3).unwrap(), max);
        assert!(max > 0.0);
    }

    #[test]
    fn lag_window_mode_replaces_decay_all() {
        let points: Vec<(i64, f64)> = (0..40)
            .map(|i| (i, if i == 20 { 10.0 } else { (i % 5) as f64 }))
            .collect();
        let ts = series(&points);
        let decay = ExpAvgDetector::new(&DetectorParams::default())
            .run(&ts, None)
            .unwrap();
        let windowed = ExpAvgDetector::new(&DetectorParams {
            use_lag_window: Some(true),
            lag_window_size: Some(4),
            ..Default::default()
        })
        .run(&ts, None)
        .unwrap();
        assert_eq!(windowed.len(), ts.len());
        assert_ne!(decay.values(), windowed.values());
        assert!(windowed.value_at(20).unwrap() > 0.0);
    }

    #[test]
    fn smoothing_factor_changes_scores() {
        let ts = series(&[(0, 0.0), (1, 2.0), (2, 1.0), (3, 6.0), (4, 0.0)]);
        let default = ExpAvgDetector::new(&DetectorParams::default())
            .run(&ts, None)
            .unwrap();
        let tuned = ExpAvgDetector::new(&DetectorParams {
            smoothing_factor: Some(0.3),
            ..Default::default()
        })
        .run(&ts, None)
        .unwrap();
        assert_ne!(default.values(), tuned.values());
    }
}
