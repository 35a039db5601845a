pub mod absolutethreshold;
pub mod bitmapdetector;
pub mod defaultdetector;
pub mod derivativedetector;
pub mod diffpercentthreshold;
pub mod expavgdetector;
pub mod signtest;

pub use absolutethreshold::AbsoluteThreshold;
pub use bitmapdetector::BitmapDetector;
pub use defaultdetector::DefaultDetector;
pub use derivativedetector::DerivativeDetector;
pub use diffpercentthreshold::DiffPercentThreshold;
pub use expavgdetector::ExpAvgDetector;
pub use signtest::SignTest;

use crate::errors::ADCError;
use crate::timeseries::TimeSeries;
use crate::types::Result;

// Fraction of the maximal score below which scores count as noise.
pub(crate) const DEFAULT_NOISE_PCT_THRESHOLD: f64 = 0.001;

/// Zero out scores that are negligible relative to the maximal score. A
/// nearly flat score series would otherwise correlate as well as a real
/// anomaly signature.
pub(crate) fn denoise_scores(scores: &mut [f64]) {
    let maximal = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if maximal.is_finite() && maximal != 0.0 {
        for score in scores.iter_mut() {
            if *score < DEFAULT_NOISE_PCT_THRESHOLD * maximal {
                *score = 0.0;
            }
        }
    }
}

/// Tuning parameters for the anomaly detector algorithms, one record for
/// the whole registry. Unset fields fall back to each algorithm's
/// documented default; fields an algorithm does not know are ignored.
#[derive(Clone, Debug, Default)]
pub struct DetectorParams {
    pub smoothing_factor: Option<f64>,
    pub use_lag_window: Option<bool>,
    pub lag_window_size: Option<usize>,
    pub future_window_size: Option<usize>,
    pub precision: Option<usize>,
    pub chunk_size: Option<usize>,
    pub absolute_threshold_upper: Option<f64>,
    pub absolute_threshold_lower: Option<f64>,
    pub percent_threshold_upper: Option<f64>,
    pub percent_threshold_lower: Option<f64>,
    pub offset: Option<f64>,
    pub scan_window: Option<usize>,
    pub confidence: Option<f64>,
    pub gap: Option<usize>,
}

/// The uniform scoring contract: produce one anomaly score per target
/// timestamp, optionally judging the target against a baseline series.
pub trait DetectorAlgorithm {
    fn run(&self, time_series: &TimeSeries, baseline: Option<&TimeSeries>) -> Result<TimeSeries>;
}

/// The algorithm registry as a closed set of variants.
pub enum Detector {
    Bitmap(BitmapDetector),
    Default(DefaultDetector),
    Derivative(DerivativeDetector),
    ExpAvg(ExpAvgDetector),
    AbsoluteThreshold(AbsoluteThreshold),
    DiffPercentThreshold(DiffPercentThreshold),
    SignTest(SignTest),
}

impl Detector {
    /// Fallible name lookup. Required-parameter validation happens here,
    /// before any series is touched.
    pub fn from_name(name: &str, params: &DetectorParams) -> Result<Detector> {
        match name {
            "bitmap_detector" => Ok(Detector::Bitmap(BitmapDetector::new(params))),
            "default_detector" => Ok(Detector::Default(DefaultDetector::new())),
            "derivative_detector" => Ok(Detector::Derivative(DerivativeDetector::new(params))),
            "exp_avg_detector" => Ok(Detector::ExpAvg(ExpAvgDetector::new(params))),
            "absolute_threshold" => Ok(Detector::AbsoluteThreshold(AbsoluteThreshold::new(params)?)),
            "diff_percent_threshold" => Ok(Detector::DiffPercentThreshold(
                DiffPercentThreshold::new(params)?,
            )),
            "sign_test" => Ok(Detector::SignTest(SignTest::new(params)?)),
            _ => Err(ADCError::AlgorithmNotFound {
                msg: "unknown anomaly detector algorithm name",
            }),
        }
    }
}

impl DetectorAlgorithm for Detector {
    fn run(&self, time_series: &TimeSeries, baseline: Option<&TimeSeries>) -> Result<TimeSeries> {
        match self {
            Detector::Bitmap(detector) => detector.run(time_series, baseline),
            Detector::Default(detector) => detector.run(time_series, baseline),
            Detector::Derivative(detector) => detector.run(time_series, baseline),
            Detector::ExpAvg(detector) => detector.run(time_series, baseline),
            Detector::AbsoluteThreshold(detector) => detector.run(time_series, baseline),
            Detector::DiffPercentThreshold(detector) => detector.run(time_series, baseline),
            Detector::SignTest(detector) => detector.run(time_series, baseline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denoise_zeroes_negligible_scores() {
        let mut scores = vec![0.0008, 4.6, 4.6, 1.0, 0.004];
        denoise_scores(&mut scores);
        assert_eq!(scores, vec![0.0, 4.6, 4.6, 1.0, 0.0]);
        assert!(scores.iter().all(|&score| score >= 0.0));

        // an all-zero series is left alone
        let mut flat = vec![0.0; 4];
        denoise_scores(&mut flat);
        assert_eq!(flat, vec![0.0; 4]);
    }

    #[test]
    fn registry_rejects_unknown_names() {
        assert!(matches!(
            Detector::from_name("no_such_detector", &DetectorParams::default()),
            Err(ADCError::AlgorithmNotFound { .. })
        ));
    }
}
