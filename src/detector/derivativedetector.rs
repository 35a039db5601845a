use num::abs;

use super::{denoise_scores, DetectorAlgorithm, DetectorParams};
use crate::timeseries::TimeSeries;
use crate::types::Result;
use crate::util::compute_ema;

const DEFAULT_DERI_SMOOTHING_FACTOR: f64 = 0.2;

/// Derivative detector: the derivative version of the exponential moving
/// average detector. Instead of the data point value it scores the
/// deviation of the first difference from its own moving average.
pub struct DerivativeDetector {
    smoothing_factor: f64,
}

impl DerivativeDetector {
    pub fn new(params: &DetectorParams) -> DerivativeDetector {
        let smoothing_factor = match params.smoothing_factor {
            Some(factor) if factor > 0.0 => factor,
            _ => DEFAULT_DERI_SMOOTHING_FACTOR,
        };
        DerivativeDetector { smoothing_factor }
    }

    fn compute_derivatives(time_series: &TimeSeries) -> Vec<f64> {
        let timestamps = time_series.timestamps();
        let values = time_series.values();
        let mut derivatives = Vec::with_capacity(values.len());
        for i in 1..values.len() {
            let td = (timestamps[i] - timestamps[i - 1]) as f64;
            let delta = values[i] - values[i - 1];
            let derivative = if td != 0.0 { delta / td } else { delta };
            derivatives.push(abs(derivative));
        }
        // the first timestamp gets the same derivative as the second
        if let Some(&first) = derivatives.first() {
            derivatives.insert(0, first);
        }
        derivatives
    }
}

impl DetectorAlgorithm for DerivativeDetector {
    fn run(&self, time_series: &TimeSeries, _baseline: Option<&TimeSeries>) -> Result<TimeSeries> {
        if time_series.len() < 2 {
            // no first difference to score
            let zeros = vec![0.0; time_series.len()];
            return Ok(time_series.timestamps().iter().copied().zip(zeros).collect());
        }
        let derivatives = Self::compute_derivatives(time_series);
        let derivatives_ema = compute_ema(self.smoothing_factor, &derivatives);
        let mut scores: Vec<f64> = derivatives
            .iter()
            .zip(&derivatives_ema)
            .map(|(&derivative, &ema)| abs(derivative - ema))
            .collect();
        if !scores.is_empty() {
            let n = scores.len() as f64;
            let mean = scores.iter().sum::<f64>() / n;
            let variance = scores
                .iter()
                .map(|score| (score - mean) * (score - mean))
                .sum::<f64>()
                / n;
            let stdev = variance.sqrt();
            if stdev != 0.0 {
                for score in &mut scores {
                    *score /= stdev;
                }
            }
        }
        denoise_scores(&mut scores);
        Ok(time_series.timestamps().iter().copied().zip(scores).collect())
    }
}
