use super::{denoise_scores, DetectorAlgorithm, DetectorParams};
use crate::errors::ADCError;
use crate::timeseries::TimeSeries;
use crate::types::Result;
use crate::util::{check_enough, check_required};

/// Scores a data point by its percent deviation from a baseline series.
///
/// The baseline is assumed to be index-aligned with the target: every
/// position of the target has its counterpart at the same position in the
/// baseline. The lower threshold should be negative to detect a drop below
/// the baseline.
pub struct DiffPercentThreshold {
    upper: Option<f64>,
    lower: Option<f64>,
}

impl DiffPercentThreshold {
    pub fn new(params: &DetectorParams) -> Result<DiffPercentThreshold> {
        check_required(
            params.percent_threshold_upper.is_some() || params.percent_threshold_lower.is_some(),
            "either percent_threshold_upper or percent_threshold_lower is needed",
        )?;
        Ok(DiffPercentThreshold {
            upper: params.percent_threshold_upper,
            lower: params.percent_threshold_lower,
        })
    }
}

impl DetectorAlgorithm for DiffPercentThreshold {
    fn run(&self, time_series: &TimeSeries, baseline: Option<&TimeSeries>) -> Result<TimeSeries> {
        let baseline = baseline.ok_or(ADCError::RequiredParametersNotPassed {
            msg: "diff_percent_threshold requires a baseline time series",
        })?;
        check_enough(
            baseline.len() >= time_series.len(),
            "baseline has fewer points than the target series",
        )?;
        let mut scores = Vec::with_capacity(time_series.len());
        for (i, &value) in time_series.values().iter().enumerate() {
            let baseline_value = baseline.values()[i];
            let diff_percent = if baseline_value > 0.0 {
                100.0 * (value - baseline_value) / baseline_value
            } else if value > 0.0 {
                100.0
            } else {
                0.0
            };
            let mut score = 0.0;
            if let Some(upper) = self.upper {
                if diff_percent > 0.0 && diff_percent > upper {
                    score = diff_percent;
                }
            }
            if let Some(lower) = self.lower {
                if diff_percent < 0.0 && diff_percent < lower {
                    score = -diff_percent;
                }
            }
            scores.push(score);
        }
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
    fn requires_thresholds_and_baseline() {
        assert!(matches!(
            DiffPercentThreshold::new(&DetectorParams::default()),
            Err(ADCError::RequiredParametersNotPassed { .. })
        ));
        let detector = DiffPercentThreshold::new(&DetectorParams {
            percent_threshold_upper: Some(20.0),
            ..Default::default()
        })
        .unwrap();
        let ts = series(&[(0, 1.0)]);
        assert!(matches!(
            detector.run(&ts, None),
            Err(ADCError::RequiredParametersNotPassed { .. })
        ));
    }

    #[test]
    fn scores_percent_deviation_from_the_baseline() {
        let ts = series(&[(0, 1.5), (1, 1.0), (2, 0.5), (3, 2.0)]);
        let baseline = series(&[(0, 1.0), (1, 1.0), (2, 1.0), (3, 0.0)]);
        let detector = DiffPercentThreshold::new(&DetectorParams {
            percent_threshold_upper: Some(20.0),
            percent_threshold_lower: Some(-20.0),
            ..Default::default()
        })
        .unwrap();
        let scores = detector.run(&ts, Some(&baseline)).unwrap();
        // +50%, inside the band, -50%, positive over a zero baseline
        assert_eq!(scores.values(), &[50.0, 0.0, 50.0, 100.0]);
    }
}
