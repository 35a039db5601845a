use std::collections::HashMap;

use super::{denoise_scores, DetectorAlgorithm, DetectorParams};
use crate::timeseries::TimeSeries;
use crate::types::Result;
use crate::util::check_enough;

const DEFAULT_BITMAP_PRECISION: usize = 4;
const DEFAULT_BITMAP_CHUNK_SIZE: usize = 2;
// Window sizes as fractions of the whole data length.
const DEFAULT_BITMAP_LAGGING_WINDOW_SIZE_PCT: f64 = 0.2 / 16.0;
const DEFAULT_BITMAP_LEADING_WINDOW_SIZE_PCT: f64 = 0.2 / 16.0;
const DEFAULT_BITMAP_MINIMAL_POINTS_IN_WINDOWS: usize = 50;
const DEFAULT_BITMAP_MAXIMAL_POINTS_IN_WINDOWS: usize = 200;

/// Bitmap detector.
///
/// The value range is partitioned into equal-width sections and every data
/// point is replaced by its section index, giving a SAX string (symbolic
/// aggregate approximation). At each index the chunk frequencies of a
/// lagging window and a future window are compared; a large distance means
/// the local pattern changes there. The frequency dictionaries are
/// maintained incrementally while both windows slide.
///
/// The ideas are from "Assumption-Free Anomaly Detection in Time Series"
/// (SSDBM'05, http://alumni.cs.ucr.edu/~ratana/SSDBM05.pdf).
pub struct BitmapDetector {
    precision: usize,
    chunk_size: usize,
    lag_window_size: Option<usize>,
    future_window_size: Option<usize>,
}

impl BitmapDetector {
    pub fn new(params: &DetectorParams) -> BitmapDetector {
        BitmapDetector {
            precision: params
                .precision
                .filter(|&precision| precision > 0)
                .unwrap_or(DEFAULT_BITMAP_PRECISION),
            chunk_size: params
                .chunk_size
                .filter(|&chunk_size| chunk_size > 0)
                .unwrap_or(DEFAULT_BITMAP_CHUNK_SIZE),
            lag_window_size: params.lag_window_size.filter(|&size| size > 0),
            future_window_size: params.future_window_size.filter(|&size| size > 0),
        }
    }

    // Resolve and sanity-check the window sizes against the series length.
    fn windows(&self, length: usize) -> Result<(usize, usize)> {
        let mut lag = self
            .lag_window_size
            .unwrap_or((length as f64 * DEFAULT_BITMAP_LAGGING_WINDOW_SIZE_PCT) as usize);
        let mut fut = self
            .future_window_size
            .unwrap_or((length as f64 * DEFAULT_BITMAP_LEADING_WINDOW_SIZE_PCT) as usize);
        let windows = lag + fut;
        check_enough(
            lag > 0
                && fut > 0
                && length >= windows
                && windows >= DEFAULT_BITMAP_MINIMAL_POINTS_IN_WINDOWS,
            "series is too short for the bitmap windows",
        )?;
        // oversized windows would leave most points scored zero
        lag = lag.min(DEFAULT_BITMAP_MAXIMAL_POINTS_IN_WINDOWS);
        fut = fut.min(DEFAULT_BITMAP_MAXIMAL_POINTS_IN_WINDOWS);
        check_enough(
            self.chunk_size <= lag && self.chunk_size <= fut,
            "chunk size exceeds a window",
        )?;
        Ok((lag, fut))
    }

    /// SAX representation: each value maps to the index of the highest
    /// section whose lower bound it meets.
    fn generate_sax(&self, time_series: &TimeSeries) -> Vec<u8> {
        let minimum = time_series.min().unwrap_or(0.0);
        let maximum = time_series.max().unwrap_or(0.0);
        let section_height = (maximum - minimum) / self.precision as f64;
        time_series
            .values()
            .iter()
            .map(|&value| {
                let mut sax = 0u8;
                for section in 0..self.precision {
                    if value >= minimum + section as f64 * section_height {
                        sax = section as u8;
                    } else {
                        break;
                    }
                }
                sax
            })
            .collect()
    }

    fn chunk_frequencies(sax: &[u8], chunk_size: usize) -> HashMap<&[u8], i64> {
        let mut frequency = HashMap::new();
        if sax.len() >= chunk_size {
            for chunk in sax.windows(chunk_size) {
                *frequency.entry(chunk).or_insert(0) += 1;
            }
        }
        frequency
    }

    // Distance between the two windows' chunk frequencies, summed over the
    // union of their chunk sets.
    fn window_distance(lag: &HashMap<&[u8], i64>, fut: &HashMap<&[u8], i64>) -> f64 {
        let mut score = 0.0;
        for (chunk, &lag_count) in lag {
            let fut_count = fut.get(chunk).copied().unwrap_or(0);
            score += ((fut_count - lag_count) * (fut_count - lag_count)) as f64;
        }
        for (chunk, &fut_count) in fut {
            if !lag.contains_key(chunk) {
                score += (fut_count * fut_count) as f64;
            }
        }
        score
    }
}

impl DetectorAlgorithm for BitmapDetector {
    fn run(&self, time_series: &TimeSeries, _baseline: Option<&TimeSeries>) -> Result<TimeSeries> {
        let length = time_series.len();
        let (lag_size, fut_size) = self.windows(length)?;
        let chunk = self.chunk_size;
        let sax = self.generate_sax(time_series);
        let mut scores = vec![0.0; length];

        // Indices with both a full lagging and a full future window. The
        // range is contiguous, so the incremental update never re-enters
        // after a gap.
        let first = lag_size;
        let last = length - fut_size;
        let mut lag_freq: HashMap<&[u8], i64> = HashMap::new();
        let mut fut_freq: HashMap<&[u8], i64> = HashMap::new();
        for i in first..=last {
            if i == first {
                lag_freq = Self::chunk_frequencies(&sax[i - lag_size..i], chunk);
                fut_freq = Self::chunk_frequencies(&sax[i..i + fut_size], chunk);
            } else {
                // slide both windows one step: drop the chunk leaving, count
                // the chunk entering
                *lag_freq
                    .entry(&sax[i - 1 - lag_size..i - 1 - lag_size + chunk])
                    .or_insert(0) -= 1;
                *lag_freq.entry(&sax[i - chunk..i]).or_insert(0) += 1;
                *fut_freq.entry(&sax[i - 1..i - 1 + chunk]).or_insert(0) -= 1;
                *fut_freq
                    .entry(&sax[i + fut_size - chunk..i + fut_size])
                    .or_insert(0) += 1;
            }
            scores[i] = Self::window_distance(&lag_freq, &fut_freq);
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
    fn sax_sections_cover_the_value_range() {
        let detector = BitmapDetector::new(&DetectorParams::default());
        let ts = TimeSeries::new(vec![(0, 0.0), (1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)]);
        assert_eq!(detector.generate_sax(&ts), vec![0, 1, 2, 3, 3]);
        // a flat series lands entirely in the top section
        let flat = TimeSeries::new(vec![(0, 2.0), (1, 2.0)]);
        assert_eq!(detector.generate_sax(&flat), vec![3, 3]);
    }

    #[test]
    fn incremental_dictionaries_match_direct_counting() {
        let detector = BitmapDetector::new(&DetectorParams {
            lag_window_size: Some(25),
            future_window_size: Some(25),
            ..Default::default()
        });
        let ts = TimeSeries::new((0..90).map(|i| {
            let value = if (40..50).contains(&i) { 40.0 } else { (i % 7) as f64 };
            (i, value)
        }));
        let scores = detector.run(&ts, None).unwrap();
        let sax = detector.generate_sax(&ts);

        // recompute a few scores from freshly counted dictionaries
        for &i in &[25usize, 40, 65] {
            let lag = BitmapDetector::chunk_frequencies(&sax[i - 25..i], 2);
            let fut = BitmapDetector::chunk_frequencies(&sax[i..i + 25], 2);
            let direct = BitmapDetector::window_distance(&lag, &fut);
            let incremental = scores.values()[i];
            // denoising may zero a negligible direct score
            assert!(incremental == direct || (incremental == 0.0 && direct >= 0.0));
        }
    }

    #[test]
    fn short_series_is_rejected() {
        let detector = BitmapDetector::new(&DetectorParams::default());
        let ts = TimeSeries::new((0..9).map(|i| (i, i as f64)));
        assert!(matches!(
            detector.run(&ts, None),
            Err(ADCError::NotEnoughDataPoints { .. })
        ));
    }

    #[test]
    fn scores_are_zero_outside_the_valid_range() {
        let detector = BitmapDetector::new(&DetectorParams {
            lag_window_size: Some(30),
            future_window_size: Some(30),
            ..Default::default()
        });
        let ts = TimeSeries::new((0..100).map(|i| (i, ((i * i) % 13) as f64)));
        let scores = detector.run(&ts, None).unwrap();
        assert_eq!(scores.len(), 100);
        for i in 0..30 {
            assert_eq!(scores.values()[i], 0.0);
        }
        for i in 71..100 {
            assert_eq!(scores.values()[i], 0.0);
        }
    }
}
