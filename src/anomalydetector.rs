use tracing::debug;

use crate::common::anomaly::Anomaly;
use crate::errors::ADCError;
use crate::detector::{Detector, DetectorAlgorithm, DetectorParams};
use crate::timeseries::{SeriesSource, TimeSeries};
use crate::types::{Result, Timestamp};

const ANOMALY_DETECTOR_ALGORITHM: &str = "bitmap_detector";
const ANOMALY_DETECTOR_REFINE_ALGORITHM: &str = "exp_avg_detector";
const FALLBACK_ALGORITHM: &str = "default_detector";
// Percent of the maximal score used as the threshold when neither an
// explicit threshold nor a per-algorithm default applies.
const DEFAULT_SCORE_PERCENT_THRESHOLD: f64 = 0.2;

// Per-algorithm default thresholds on anomaly scores.
fn anomaly_threshold(algorithm_name: &str) -> Option<f64> {
    match algorithm_name {
        "exp_avg_detector" | "default_detector" => Some(3.0),
        _ => None,
    }
}

/// Detects anomalies in a single time series.
///
/// ```ignore
/// use adclib::AnomalyDetector;
///
/// let detector = AnomalyDetector::new(series)?;
/// for anomaly in detector.get_anomalies() {
///     println!("{}", anomaly);
/// }
/// let scores = detector.get_all_scores();
/// ```
pub struct AnomalyDetector {
    time_series: TimeSeries,
    anom_scores: TimeSeries,
    anomalies: Vec<Anomaly>,
}

pub struct AnomalyDetectorBuilder {
    baseline: Option<SeriesSource>,
    algorithm_name: String,
    algorithm_params: DetectorParams,
    refine_algorithm_name: String,
    refine_algorithm_params: DetectorParams,
    custom_algorithm: Option<Box<dyn DetectorAlgorithm>>,
    score_only: bool,
    score_threshold: Option<f64>,
    score_percent_threshold: Option<f64>,
}

impl Default for AnomalyDetectorBuilder {
    fn default() -> AnomalyDetectorBuilder {
        AnomalyDetectorBuilder {
            baseline: None,
            algorithm_name: ANOMALY_DETECTOR_ALGORITHM.to_string(),
            algorithm_params: DetectorParams::default(),
            refine_algorithm_name: ANOMALY_DETECTOR_REFINE_ALGORITHM.to_string(),
            refine_algorithm_params: DetectorParams::default(),
            custom_algorithm: None,
            score_only: false,
            score_threshold: None,
            score_percent_threshold: None,
        }
    }
}

impl AnomalyDetectorBuilder {
    pub fn baseline(mut self, baseline: impl Into<SeriesSource>) -> AnomalyDetectorBuilder {
        self.baseline = Some(baseline.into());
        self
    }

    pub fn algorithm_name(mut self, name: &str) -> AnomalyDetectorBuilder {
        self.algorithm_name = name.to_string();
        self
    }

    pub fn algorithm_params(mut self, params: DetectorParams) -> AnomalyDetectorBuilder {
        self.algorithm_params = params;
        self
    }

    pub fn refine_algorithm_name(mut self, name: &str) -> AnomalyDetectorBuilder {
        self.refine_algorithm_name = name.to_string();
        self
    }

    pub fn refine_algorithm_params(mut self, params: DetectorParams) -> AnomalyDetectorBuilder {
        self.refine_algorithm_params = params;
        self
    }

    /// Score with a caller-provided algorithm instead of the registry.
    pub fn algorithm(mut self, algorithm: Box<dyn DetectorAlgorithm>) -> AnomalyDetectorBuilder {
        self.custom_algorithm = Some(algorithm);
        self
    }

    /// Compute anomaly scores only, skipping interval extraction.
    pub fn score_only(mut self, score_only: bool) -> AnomalyDetectorBuilder {
        self.score_only = score_only;
        self
    }

    /// Explicit threshold on anomaly scores. A threshold of zero is honored.
    pub fn score_threshold(mut self, threshold: f64) -> AnomalyDetectorBuilder {
        self.score_threshold = Some(threshold);
        self
    }

    /// Percent of the maximal score above which a score counts as anomalous,
    /// used when no explicit or per-algorithm threshold applies.
    pub fn score_percent_threshold(mut self, percent: f64) -> AnomalyDetectorBuilder {
        self.score_percent_threshold = Some(percent);
        self
    }

    /// Load the target series and run the detection.
    pub fn detect(self, time_series: impl Into<SeriesSource>) -> Result<AnomalyDetector> {
        let time_series = time_series.into().load()?;
        let baseline = match self.baseline {
            Some(source) => Some(source.load()?),
            None => None,
        };

        let mut threshold = self
            .score_threshold
            .or_else(|| anomaly_threshold(&self.algorithm_name));

        let run_result = match &self.custom_algorithm {
            Some(algorithm) => algorithm.run(&time_series, baseline.as_ref()),
            None => Detector::from_name(&self.algorithm_name, &self.algorithm_params)?
                .run(&time_series, baseline.as_ref()),
        };
        let anom_scores = match run_result {
            Ok(scores) => scores,
            Err(ADCError::NotEnoughDataPoints { .. }) => {
                debug!(
                    algorithm = %self.algorithm_name,
                    "not enough data points, falling back to the default detector"
                );
                if threshold.is_none() {
                    threshold = anomaly_threshold(FALLBACK_ALGORITHM);
                }
                Detector::from_name(FALLBACK_ALGORITHM, &DetectorParams::default())?
                    .run(&time_series, baseline.as_ref())?
            }
            Err(error) => return Err(error),
        };

        let anomalies = if self.score_only {
            Vec::new()
        } else {
            detect_anomalies(
                &anom_scores,
                threshold,
                self.score_percent_threshold
                    .unwrap_or(DEFAULT_SCORE_PERCENT_THRESHOLD),
                &self.refine_algorithm_name,
                &self.refine_algorithm_params,
            )?
        };
        debug!(anomalies = anomalies.len(), "anomaly detection complete");

        Ok(AnomalyDetector {
            time_series,
            anom_scores,
            anomalies,
        })
    }
}

// Threshold the score series and extract the anomaly intervals, refining
// each interval's peak position with the refine algorithm.
fn detect_anomalies(
    anom_scores: &TimeSeries,
    threshold: Option<f64>,
    score_percent_threshold: f64,
    refine_algorithm_name: &str,
    refine_algorithm_params: &DetectorParams,
) -> Result<Vec<Anomaly>> {
    let max_anom_score = anom_scores.max().unwrap_or(0.0);
    let mut anomalies = Vec::new();
    if max_anom_score == 0.0 {
        return Ok(anomalies);
    }
    let threshold = threshold.unwrap_or(max_anom_score * score_percent_threshold);

    let mut intervals: Vec<(Timestamp, Timestamp)> = Vec::new();
    let mut start: Option<Timestamp> = None;
    let mut end: Option<Timestamp> = None;
    for (timestamp, value) in anom_scores.iter() {
        if value > threshold {
            end = Some(timestamp);
            if start.is_none() {
                start = Some(timestamp);
            }
        } else if let (Some(interval_start), Some(interval_end)) = (start, end) {
            intervals.push((interval_start, interval_end));
            start = None;
            end = None;
        }
    }
    if let (Some(interval_start), Some(interval_end)) = (start, end) {
        intervals.push((interval_start, interval_end));
    }

    // locate the exact anomaly point within each interval
    for (interval_start, interval_end) in intervals {
        let interval_series = anom_scores.crop(interval_start, interval_end)?;
        let refine_algorithm =
            Detector::from_name(refine_algorithm_name, refine_algorithm_params)?;
        let refine_scores = refine_algorithm.run(&interval_series, None)?;
        let mut exact_timestamp = interval_start;
        let mut max_refine_score = f64::NEG_INFINITY;
        for (timestamp, score) in refine_scores.iter() {
            if score > max_refine_score {
                max_refine_score = score;
                exact_timestamp = timestamp;
            }
        }
        anomalies.push(Anomaly {
            start_timestamp: interval_start,
            end_timestamp: interval_end,
            anomaly_score: interval_series.max().unwrap_or(0.0),
            exact_timestamp,
        });
    }
    Ok(anomalies)
}

impl AnomalyDetector {
    pub fn builder() -> AnomalyDetectorBuilder {
        AnomalyDetectorBuilder::default()
    }

    /// Detect anomalies with all defaults.
    pub fn new(time_series: impl Into<SeriesSource>) -> Result<AnomalyDetector> {
        AnomalyDetector::builder().detect(time_series)
    }

    /// The anomalies found, ordered by start timestamp.
    pub fn get_anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// The full anomaly score series.
    pub fn get_all_scores(&self) -> &TimeSeries {
        &self.anom_scores
    }

    pub fn into_all_scores(self) -> TimeSeries {
        self.anom_scores
    }

    /// The target series the detection ran on.
    pub fn time_series(&self) -> &TimeSeries {
        &self.time_series
    }
}
