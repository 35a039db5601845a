use super::{denoise_scores, DetectorAlgorithm, DetectorParams};
use crate::timeseries::TimeSeries;
use crate::types::Result;
use crate::util::check_required;

/// Scores a data point by its excess over a pre-specified constant upper
/// bound, or its shortfall below a constant lower bound. Takes no baseline.
pub struct AbsoluteThreshold {
    upper: Option<f64>,
    lower: Option<f64>,
}

impl AbsoluteThreshold {
    pub fn new(params: &DetectorParams) -> Result<AbsoluteThreshold> {
        check_required(
            params.absolute_threshold_upper.is_some() || params.absolute_threshold_lower.is_some(),
            "either absolute_threshold_upper or absolute_threshold_lower is needed",
        )?;
        Ok(AbsoluteThreshold {
            upper: params.absolute_threshold_upper,
            lower: params.absolute_threshold_lower,
        })
    }
}

impl DetectorAlgorithm for AbsoluteThreshold {
    fn run(&self, time_series: &TimeSeries, _baseline: Option<&TimeSeries>) -> Result<TimeSeries> {
        let mut scores = Vec::with_capacity(time_series.len());
        for &value in time_series.values() {
            let mut score = 0.0;
            if let Some(upper) = self.upper {
                if value > upper {
                    score = value - upper;
                }
            }
            if let Some(lower) = self.lower {
                if value < lower {
                    score = lower - value;
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
    use crate::errors::ADCError;

    #[test]
    fn requires_at_least_one_threshold() {
        assert!(matches!(
            AbsoluteThreshold::new(&DetectorParams::default()),
            Err(ADCError::RequiredParametersNotPassed { .. })
        ));
    }

    #[test]
    fn scores_distance_beyond_the_bounds() {
        let ts = TimeSeries::new(vec![(0, -1.0), (1, 0.5), (2, 3.0)]);
        let detector = AbsoluteThreshold::new(&DetectorParams {
            absolute_threshold_upper: Some(1.0),
            absolute_threshold_lower: Some(0.0),
            ..Default::default()
        })
        .unwrap();
        let scores = detector.run(&ts, None).unwrap();
        assert_eq!(scores.values(), &[1.0, 0.0, 2.0]);
    }
}
