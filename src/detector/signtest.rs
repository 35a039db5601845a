use super::{DetectorAlgorithm, DetectorParams};
use crate::errors::ADCError;
use crate::timeseries::TimeSeries;
use crate::types::Result;
use crate::util::{check_required, pbinom, qbinom};

const DEFAULT_SIGN_TEST_CONFIDENCE: f64 = 0.01;
const DEFAULT_SIGN_TEST_OFFSET: f64 = 0.0;
const DEFAULT_SIGN_TEST_GAP: usize = 0;

/// Rolling sign test against a baseline.
///
/// Data points are compared to an offset-and-percent-adjusted baseline over
/// a sliding scan window; where the count of exceedances differs
/// significantly from random, the whole window becomes an anomaly
/// candidate. Overlapping or near-by candidates merge, and each merged
/// interval is scored with the binomial likelihood of its exceedance count.
///
/// Exactly one of the upper and lower percent thresholds must be given; the
/// lower threshold should be negative to detect a drop below the baseline.
/// The target and baseline are assumed to be index-aligned; a length
/// mismatch, or a series shorter than the scan window, scores all zeros.
pub struct SignTest {
    percent_threshold: f64,
    // mirrors the data when detecting a drop below the baseline
    scale: f64,
    scan_window: usize,
    confidence: f64,
    offset: f64,
    gap: usize,
}

impl SignTest {
    pub fn new(params: &DetectorParams) -> Result<SignTest> {
        check_required(
            params.percent_threshold_upper.is_some() || params.percent_threshold_lower.is_some(),
            "either percent_threshold_upper or percent_threshold_lower is needed",
        )?;
        check_required(
            !(params.percent_threshold_upper.is_some() && params.percent_threshold_lower.is_some()),
            "cannot specify both percent_threshold_upper and percent_threshold_lower",
        )?;
        let scan_window = params.scan_window.unwrap_or(0);
        check_required(scan_window > 0, "scan window size needs to be specified")?;
        let (percent_threshold, scale) = match params.percent_threshold_upper {
            Some(upper) => (upper, 1.0),
            None => (params.percent_threshold_lower.unwrap_or(0.0), -1.0),
        };
        Ok(SignTest {
            percent_threshold,
            scale,
            scan_window,
            confidence: params.confidence.unwrap_or(DEFAULT_SIGN_TEST_CONFIDENCE),
            offset: params.offset.unwrap_or(DEFAULT_SIGN_TEST_OFFSET),
            gap: params.gap.unwrap_or(DEFAULT_SIGN_TEST_GAP),
        })
    }

    // Merge ranges whose start comes closer than max_gap to the previous
    // end. Input is sorted by start.
    fn merge_ranges(ranges: Vec<(usize, usize)>, max_gap: i64) -> Vec<(usize, usize)> {
        let mut merged: Vec<(usize, usize)> = Vec::new();
        for (start, end) in ranges {
            match merged.last_mut() {
                Some((_, prev_end)) if (start as i64 - *prev_end as i64) < max_gap => {
                    *prev_end = (*prev_end).max(end);
                }
                _ => merged.push((start, end)),
            }
        }
        merged
    }
}

impl DetectorAlgorithm for SignTest {
    fn run(&self, time_series: &TimeSeries, baseline: Option<&TimeSeries>) -> Result<TimeSeries> {
        let baseline = baseline.ok_or(ADCError::RequiredParametersNotPassed {
            msg: "sign_test requires a baseline time series",
        })?;
        let values = time_series.values();
        let n = values.len();
        let k = self.scan_window;
        let mut scores = vec![0.0; n];

        if baseline.len() == n && n >= k {
            let offset = self.scale * self.offset;
            let alpha = self.percent_threshold / 100.0;
            // 1 where the (possibly mirrored) target exceeds the adjusted baseline
            let exceeds: Vec<i64> = values
                .iter()
                .zip(baseline.values())
                .map(|(&value, &base)| {
                    if self.scale * value - offset - (1.0 + alpha) * self.scale * base > 0.0 {
                        1
                    } else {
                        0
                    }
                })
                .collect();

            // rolling exceedance count over the scan window
            let mut window_count: i64 = exceeds[..k].iter().sum();
            let mut counts = Vec::with_capacity(n - k + 1);
            counts.push(window_count);
            for i in k..n {
                window_count += exceeds[i] - exceeds[i - k];
                counts.push(window_count);
            }

            // critical count; the off-by-one is intentional and calibrated
            let critical = qbinom(1.0 - self.confidence, k as i64) - 1;
            let ranges: Vec<(usize, usize)> = counts
                .iter()
                .enumerate()
                .filter(|(_, &count)| count > critical)
                .map(|(i, _)| (i, i + k))
                .collect();

            for (start, end) in Self::merge_ranges(ranges, self.gap as i64) {
                let count: i64 = exceeds[start..end].iter().sum();
                let prob = pbinom(count, (end - start) as i64);
                for score in &mut scores[start..end] {
                    *score = 100.0 * prob;
                }
            }
        }
        Ok(time_series.timestamps().iter().copied().zip(scores).collect())
    }
}
