pub mod crosscorrelator;

pub use crosscorrelator::CrossCorrelator;

use tracing::debug;

use crate::anomalydetector::AnomalyDetector;
use crate::common::correlationresult::CorrelationResult;
use crate::errors::ADCError;
use crate::timeseries::{SeriesSource, TimeSeries};
use crate::types::{Result, Timestamp};
use crate::util::check_enough;

const CORRELATOR_ALGORITHM: &str = "cross_correlator";

/// Tuning parameters for the correlator algorithms.
#[derive(Clone, Debug, Default)]
pub struct CorrelatorParams {
    pub max_shift_seconds: Option<i64>,
    pub shift_impact: Option<f64>,
}

/// The correlator algorithm registry.
pub enum CorrelationAlgorithm {
    Cross(CrossCorrelator),
}

impl CorrelationAlgorithm {
    pub fn from_name(name: &str, params: &CorrelatorParams) -> Result<CorrelationAlgorithm> {
        match name {
            "cross_correlator" => Ok(CorrelationAlgorithm::Cross(CrossCorrelator::new(params))),
            _ => Err(ADCError::AlgorithmNotFound {
                msg: "unknown correlator algorithm name",
            }),
        }
    }

    pub fn run(&self, series_a: &TimeSeries, series_b: &TimeSeries) -> Result<CorrelationResult> {
        match self {
            CorrelationAlgorithm::Cross(correlator) => correlator.run(series_a, series_b),
        }
    }
}

/// Finds correlation between two time series.
///
/// ```ignore
/// use adclib::Correlator;
///
/// let correlator = Correlator::builder()
///     .time_period(1200, 1800)
///     .correlate(series_a, series_b)?;
/// if let Some(result) = correlator.is_correlated(0.7) {
///     println!("correlated with shift {}", result.shift);
/// }
/// ```
pub struct Correlator {
    correlation_result: CorrelationResult,
}

pub struct CorrelatorBuilder {
    time_period: Option<(Timestamp, Timestamp)>,
    use_anomaly_score: bool,
    algorithm_name: String,
    algorithm_params: CorrelatorParams,
}

impl Default for CorrelatorBuilder {
    fn default() -> CorrelatorBuilder {
        CorrelatorBuilder {
            time_period: None,
            use_anomaly_score: false,
            algorithm_name: CORRELATOR_ALGORITHM.to_string(),
            algorithm_params: CorrelatorParams::default(),
        }
    }
}

impl CorrelatorBuilder {
    /// Consider only data inside the inclusive period.
    pub fn time_period(mut self, start: Timestamp, end: Timestamp) -> CorrelatorBuilder {
        self.time_period = Some((start, end));
        self
    }

    /// Correlate the anomaly-score projections of the series instead of the
    /// raw values.
    pub fn use_anomaly_score(mut self, use_anomaly_score: bool) -> CorrelatorBuilder {
        self.use_anomaly_score = use_anomaly_score;
        self
    }

    pub fn algorithm_name(mut self, name: &str) -> CorrelatorBuilder {
        self.algorithm_name = name.to_string();
        self
    }

    pub fn algorithm_params(mut self, params: CorrelatorParams) -> CorrelatorBuilder {
        self.algorithm_params = params;
        self
    }

    /// Load both inputs and run the correlation.
    pub fn correlate(
        self,
        series_a: impl Into<SeriesSource>,
        series_b: impl Into<SeriesSource>,
    ) -> Result<Correlator> {
        let mut a = series_a.into().load()?;
        let mut b = series_b.into().load()?;
        if self.use_anomaly_score {
            a = anomaly_scores_of(a)?;
            b = anomaly_scores_of(b)?;
        }
        if let Some((start, end)) = self.time_period {
            a = a.crop(start, end).map_err(|_| ADCError::NotEnoughDataPoints {
                msg: "no data points fall into the correlation period",
            })?;
            b = b.crop(start, end).map_err(|_| ADCError::NotEnoughDataPoints {
                msg: "no data points fall into the correlation period",
            })?;
        }
        check_enough(a.len() >= 2 && b.len() >= 2, "too few data points")?;
        let algorithm = CorrelationAlgorithm::from_name(&self.algorithm_name, &self.algorithm_params)?;
        let correlation_result = algorithm.run(&a, &b)?;
        debug!(
            shift = correlation_result.shift,
            coefficient = correlation_result.coefficient,
            "correlation complete"
        );
        Ok(Correlator { correlation_result })
    }
}

fn anomaly_scores_of(series: TimeSeries) -> Result<TimeSeries> {
    let detector = AnomalyDetector::builder().score_only(true).detect(series)?;
    Ok(detector.into_all_scores())
}

impl Correlator {
    pub fn builder() -> CorrelatorBuilder {
        CorrelatorBuilder::default()
    }

    /// Correlate two series with all defaults.
    pub fn new(
        series_a: impl Into<SeriesSource>,
        series_b: impl Into<SeriesSource>,
    ) -> Result<Correlator> {
        Correlator::builder().correlate(series_a, series_b)
    }

    pub fn get_correlation_result(&self) -> &CorrelationResult {
        &self.correlation_result
    }

    /// The correlation result when the coefficient reaches the threshold,
    /// `None` otherwise.
    pub fn is_correlated(&self, threshold: f64) -> Option<&CorrelationResult> {
        if self.correlation_result.coefficient >= threshold {
            Some(&self.correlation_result)
        } else {
            None
        }
    }
}
