use super::{denoise_scores, DetectorAlgorithm, DetectorParams};
use super::{DerivativeDetector, ExpAvgDetector};
use crate::timeseries::TimeSeries;
use crate::types::Result;

// Weight of the exponential moving average score in the composition.
const DEFAULT_DETECTOR_EMA_WEIGHT: f64 = 0.65;
// Above this ema score the bigger of the weighted score and the derivative
// score wins outright.
const DEFAULT_DETECTOR_EMA_SIGNIFICANT: f64 = 0.94;

/// Weighted composition of the exponential moving average detector and the
/// derivative detector. Not configurable.
pub struct DefaultDetector;

impl DefaultDetector {
    pub fn new() -> DefaultDetector {
        DefaultDetector
    }
}

impl Default for DefaultDetector {
    fn default() -> DefaultDetector {
        DefaultDetector::new()
    }
}

impl DetectorAlgorithm for DefaultDetector {
    fn run(&self, time_series: &TimeSeries, baseline: Option<&TimeSeries>) -> Result<TimeSeries> {
        let defaults = DetectorParams::default();
        let ema_scores = ExpAvgDetector::new(&defaults).run(time_series, baseline)?;
        let derivative_scores = DerivativeDetector::new(&defaults).run(time_series, baseline)?;
        let mut scores = Vec::with_capacity(ema_scores.len());
        for (&ema, &derivative) in ema_scores.values().iter().zip(derivative_scores.values()) {
            let weighted =
                ema * DEFAULT_DETECTOR_EMA_WEIGHT + derivative * (1.0 - DEFAULT_DETECTOR_EMA_WEIGHT);
            let mut score = ema.max(weighted);
            if ema > DEFAULT_DETECTOR_EMA_SIGNIFICANT {
                score = score.max(derivative);
            }
            scores.push(score);
        }
        denoise_scores(&mut scores);
        Ok(ema_scores.timestamps().iter().copied().zip(scores).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_tracks_the_stronger_signal() {
        let ts = TimeSeries::new((0..12).map(|i| (i, if i == 6 { 9.0 } else { 1.0 })));
        let defaults = DetectorParams::default();
        let combined = DefaultDetector::new().run(&ts, None).unwrap();
        let ema = ExpAvgDetector::new(&defaults).run(&ts, None).unwrap();
        assert_eq!(combined.len(), ts.len());
        assert!(combined.max().unwrap() + 1e-12 >= ema.max().unwrap());
        assert!(combined.value_at(6).unwrap() > 0.0);
    }
}
