use crate::common::correlationresult::CorrelationResult;
use crate::timeseries::TimeSeries;
use crate::types::{Result, Timestamp};
use crate::util::check_enough;

use super::CorrelatorParams;

// Anomalies take time to propagate between series, so similar
// irregularities may happen close in time but not at the same point. The
// shift room allows for that, at a small penalty per unit of shift.
const DEFAULT_ALLOWED_SHIFT_SECONDS: i64 = 60;
const DEFAULT_SHIFT_IMPACT: f64 = 0.05;

/// Cross-correlation over a range of allowed shifts.
///
/// Both series are normalized and aligned; the Pearson-style coefficient is
/// computed for every shift step within the allowed range and the best one
/// wins. The ideas come from Paul Bourke
/// (http://paulbourke.net/miscellaneous/correlate/).
pub struct CrossCorrelator {
    max_shift_seconds: i64,
    shift_impact: f64,
}

impl CrossCorrelator {
    pub fn new(params: &CorrelatorParams) -> CrossCorrelator {
        CrossCorrelator {
            max_shift_seconds: params
                .max_shift_seconds
                .unwrap_or(DEFAULT_ALLOWED_SHIFT_SECONDS),
            shift_impact: params.shift_impact.unwrap_or(DEFAULT_SHIFT_IMPACT),
        }
    }

    pub fn run(&self, series_a: &TimeSeries, series_b: &TimeSeries) -> Result<CorrelationResult> {
        let mut a = series_a.clone();
        let mut b = series_b.clone();
        a.normalize();
        b.normalize();
        let (a, b) = a.align(&b);
        let n = a.len();
        check_enough(n >= 2, "too few data points to correlate")?;

        let a_values = a.values();
        let b_values = b.values();
        let a_avg = a.average().unwrap_or(0.0);
        let b_avg = b.average().unwrap_or(0.0);
        let denom = a.stdev().unwrap_or(0.0) * b.stdev().unwrap_or(0.0) * n as f64;

        let allowed_shift_step = find_allowed_shift(a.timestamps(), self.max_shift_seconds);
        let (shift_lower_bound, shift_upper_bound) = if allowed_shift_step != 0 {
            (-(allowed_shift_step as i64), allowed_shift_step as i64)
        } else {
            (0, 1)
        };

        let mut best_shift = 0;
        let mut best_coefficient = f64::NEG_INFINITY;
        let mut max_shifted_coefficient = f64::NEG_INFINITY;
        for delay in shift_lower_bound..shift_upper_bound {
            let mut delay_in_seconds =
                a.timestamps()[delay.unsigned_abs() as usize] - a.timestamps()[0];
            if delay < 0 {
                delay_in_seconds = -delay_in_seconds;
            }
            let mut s = 0.0;
            for i in 0..n {
                let j = i as i64 + delay;
                if j < 0 || j >= n as i64 {
                    continue;
                }
                s += (a_values[i] - a_avg) * (b_values[j as usize] - b_avg);
            }
            let r = if denom != 0.0 { s / denom } else { s };
            let shifted = if self.max_shift_seconds != 0 {
                r * (1.0
                    + delay_in_seconds as f64 / self.max_shift_seconds as f64 * self.shift_impact)
            } else {
                r
            };
            if shifted > max_shifted_coefficient {
                max_shifted_coefficient = shifted;
            }
            // strict comparison keeps the first of equal coefficients
            if r > best_coefficient {
                best_coefficient = r;
                best_shift = delay_in_seconds;
            }
        }
        Ok(CorrelationResult {
            shift: best_shift,
            coefficient: best_coefficient,
            shifted_coefficient: max_shifted_coefficient,
        })
    }
}

// Probing binary search for the first timestamp whose offset from the start
// exceeds the target; returns the last probed position.
fn find_allowed_shift(timestamps: &[Timestamp], max_shift_seconds: i64) -> usize {
    let init = timestamps[0];
    let mut lower_bound = 0;
    let mut upper_bound = timestamps.len();
    let mut pos = 0;
    while lower_bound < upper_bound {
        pos = lower_bound + (upper_bound - lower_bound) / 2;
        if timestamps[pos] - init > max_shift_seconds {
            upper_bound = pos;
        } else {
            lower_bound = pos + 1;
        }
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_series_correlate_perfectly() {
        let ts = TimeSeries::new(vec![(0, 0.0), (1, 1.0), (2, 3.0), (3, 1.0), (4, 0.0)]);
        let correlator = CrossCorrelator::new(&CorrelatorParams::default());
        let result = correlator.run(&ts, &ts.clone()).unwrap();
        assert_eq!(result.shift, 0);
        assert!((result.coefficient - 1.0).abs() < 1e-9);
        assert!(result.shifted_coefficient >= result.coefficient);
    }

    #[test]
    fn allowed_shift_probe() {
        let timestamps: Vec<i64> = (0..10).collect();
        // every offset fits inside the room: the probe settles on the last index
        assert_eq!(find_allowed_shift(&timestamps, 60), 9);
        // a zero shift room collapses the range
        assert_eq!(find_allowed_shift(&timestamps, 0), 0);
        let spread: Vec<i64> = vec![0, 30, 70, 120];
        assert_eq!(find_allowed_shift(&spread, 60), 1);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let a = TimeSeries::new(vec![(0, 1.0)]);
        let b = TimeSeries::new(vec![(0, 1.0)]);
        let correlator = CrossCorrelator::new(&CorrelatorParams::default());
        assert!(correlator.run(&a, &b).is_err());
    }
}
