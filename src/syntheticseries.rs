use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_core::RngCore;
use std::f64::consts::PI;

use crate::timeseries::TimeSeries;
use crate::types::Timestamp;

/// A seeded synthetic metric series with the indices and magnitudes of the
/// level shifts injected into it. Used by the integration tests and the
/// demo to exercise the detectors on data with known anomalies.
pub struct SyntheticSeries {
    pub series: TimeSeries,
    pub anomaly_indices: Vec<usize>,
    pub shifts: Vec<f64>,
}

impl SyntheticSeries {
    pub fn new(
        num: usize,
        period: usize,
        amplitude: f64,
        noise: f64,
        seed: u64,
        start_timestamp: Timestamp,
        interval: i64,
    ) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut noiserng = ChaCha20Rng::seed_from_u64(seed + 1);
        let phase = rng.next_u64() as usize % period;
        let amp = 0.2 * rng.gen::<f64>() * amplitude + amplitude;

        let mut points = Vec::with_capacity(num);
        let mut anomaly_indices = Vec::new();
        let mut shifts = Vec::new();
        for i in 0..num {
            let mut value = amp * (2.0 * PI * (i + phase) as f64 / period as f64).cos()
                + noise * noiserng.gen::<f64>();
            if noiserng.gen::<f64>() < 0.01 {
                let factor = 5.0 * (1.0 + noiserng.gen::<f64>());
                let mut change = factor * noise;
                if noiserng.gen::<f64>() < 0.5 {
                    change = -change;
                }
                value += change;
                anomaly_indices.push(i);
                shifts.push(change);
            }
            points.push((start_timestamp + i as i64 * interval, value));
        }
        SyntheticSeries {
            series: TimeSeries::new(points),
            anomaly_indices,
            shifts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_series() {
        let a = SyntheticSeries::new(500, 60, 10.0, 1.0, 42, 0, 60);
        let b = SyntheticSeries::new(500, 60, 10.0, 1.0, 42, 0, 60);
        assert_eq!(a.series, b.series);
        assert_eq!(a.anomaly_indices, b.anomaly_indices);
        assert_eq!(a.series.len(), 500);
        assert_eq!(a.anomaly_indices.len(), a.shifts.len());
    }

    #[test]
    fn timestamps_follow_the_sampling_interval() {
        let data = SyntheticSeries::new(10, 5, 1.0, 0.1, 7, 1000, 30);
        assert_eq!(data.series.start(), Some(1000));
        assert_eq!(data.series.end(), Some(1000 + 9 * 30));
    }
}
