use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::path::PathBuf;

use crate::errors::ADCError;
use crate::types::{Result, Timestamp};
use crate::util;

/// An ordered (timestamp, value) container.
///
/// Timestamps are strictly ascending with no duplicates; values are always
/// finite. Non-finite values play the role of nulls: they are dropped at
/// construction and deleting by inserting one is supported. The two vectors
/// are parallel and equal-length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<Timestamp>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from any collection of points. Entries are sorted by
    /// timestamp, later duplicates win (mapping semantics) and non-finite
    /// values are dropped.
    pub fn new<I>(points: I) -> TimeSeries
    where
        I: IntoIterator<Item = (Timestamp, f64)>,
    {
        let map: BTreeMap<Timestamp, f64> = points
            .into_iter()
            .filter(|(_, value)| value.is_finite())
            .collect();
        let mut timestamps = Vec::with_capacity(map.len());
        let mut values = Vec::with_capacity(map.len());
        for (timestamp, value) in map {
            timestamps.push(timestamp);
            values.push(value);
        }
        TimeSeries { timestamps, values }
    }

    fn from_sorted(timestamps: Vec<Timestamp>, values: Vec<f64>) -> TimeSeries {
        TimeSeries { timestamps, values }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Earliest timestamp in the series.
    pub fn start(&self) -> Option<Timestamp> {
        self.timestamps.first().copied()
    }

    /// Latest timestamp in the series.
    pub fn end(&self) -> Option<Timestamp> {
        self.timestamps.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.timestamps.binary_search(&timestamp).is_ok()
    }

    /// Value at an exactly matching timestamp.
    pub fn value_at(&self, timestamp: Timestamp) -> Result<f64> {
        match self.timestamps.binary_search(&timestamp) {
            Ok(pos) => Ok(self.values[pos]),
            Err(_) => Err(ADCError::MissingTimestamp {
                msg: "timestamp does not exist in the series",
            }),
        }
    }

    /// Set the value at a timestamp, inserting in order when the timestamp is
    /// new. A non-finite value deletes the entry.
    pub fn insert(&mut self, timestamp: Timestamp, value: f64) {
        match self.timestamps.binary_search(&timestamp) {
            Ok(pos) => {
                if value.is_finite() {
                    self.values[pos] = value;
                } else {
                    self.timestamps.remove(pos);
                    self.values.remove(pos);
                }
            }
            Err(pos) => {
                if value.is_finite() {
                    self.timestamps.insert(pos, timestamp);
                    self.values.insert(pos, value);
                }
            }
        }
    }

    pub fn remove(&mut self, timestamp: Timestamp) {
        if let Ok(pos) = self.timestamps.binary_search(&timestamp) {
            self.timestamps.remove(pos);
            self.values.remove(pos);
        }
    }

    /// Align two series onto the union of their timestamps.
    ///
    /// At a timestamp present on one side only, the other side contributes
    /// its previously emitted value (its first value when nothing has been
    /// emitted yet, never a future value). Once a side is exhausted, the
    /// remaining timestamps of the other side are filled with the exhausted
    /// side's last value. Cross-correlation depends on exactly this
    /// carry-forward rule.
    pub fn align(&self, other: &TimeSeries) -> (TimeSeries, TimeSeries) {
        if self.is_empty() || other.is_empty() {
            return (self.clone(), other.clone());
        }
        let (n, m) = (self.len(), other.len());
        let mut timestamps = Vec::with_capacity(n.max(m));
        let mut left = Vec::with_capacity(n.max(m));
        let mut right = Vec::with_capacity(n.max(m));
        let mut last_left = self.values[0];
        let mut last_right = other.values[0];
        let (mut i, mut j) = (0, 0);
        while i < n && j < m {
            let (ta, tb) = (self.timestamps[i], other.timestamps[j]);
            if ta == tb {
                last_left = self.values[i];
                last_right = other.values[j];
                timestamps.push(ta);
                left.push(last_left);
                right.push(last_right);
                i += 1;
                j += 1;
            } else if ta < tb {
                last_left = self.values[i];
                timestamps.push(ta);
                left.push(last_left);
                right.push(last_right);
                i += 1;
            } else {
                last_right = other.values[j];
                timestamps.push(tb);
                left.push(last_left);
                right.push(last_right);
                j += 1;
            }
        }
        while i < n {
            timestamps.push(self.timestamps[i]);
            left.push(self.values[i]);
            right.push(last_right);
            i += 1;
        }
        while j < m {
            timestamps.push(other.timestamps[j]);
            left.push(last_left);
            right.push(other.values[j]);
            j += 1;
        }
        (
            TimeSeries::from_sorted(timestamps.clone(), left),
            TimeSeries::from_sorted(timestamps, right),
        )
    }

    /// All points with timestamps inside the inclusive range.
    pub fn crop(&self, start_timestamp: Timestamp, end_timestamp: Timestamp) -> Result<TimeSeries> {
        let lo = self.timestamps.partition_point(|&t| t < start_timestamp);
        let hi = self.timestamps.partition_point(|&t| t <= end_timestamp);
        if lo >= hi {
            return Err(ADCError::EmptyResult {
                msg: "no data points fall inside the crop range",
            });
        }
        Ok(TimeSeries::from_sorted(
            self.timestamps[lo..hi].to_vec(),
            self.values[lo..hi].to_vec(),
        ))
    }

    /// Linearly map values onto [0, 1] in place. No-op when the maximum is
    /// zero or the value range is zero.
    pub fn normalize(&mut self) {
        if let (Some(minimum), Some(maximum)) = (self.min(), self.max()) {
            if maximum != 0.0 && maximum != minimum {
                for value in &mut self.values {
                    *value = (*value - minimum) / (maximum - minimum);
                }
            }
        }
    }

    /// Exponentially smoothed copy: smooth forward once, backward once, and
    /// average the two. Here `smoothing_factor` is the weight of the running
    /// state and `1 - smoothing_factor` the weight of the new point.
    pub fn smooth(&self, smoothing_factor: f64) -> TimeSeries {
        let n = self.len();
        if n == 0 {
            return TimeSeries::default();
        }
        let mut forward = Vec::with_capacity(n);
        let mut pre = self.values[0];
        for &value in &self.values {
            let smoothed = smoothing_factor * pre + (1.0 - smoothing_factor) * value;
            forward.push(smoothed);
            pre = smoothed;
        }
        let mut backward = vec![0.0; n];
        let mut next = self.values[n - 1];
        for i in (0..n).rev() {
            let smoothed = smoothing_factor * next + (1.0 - smoothing_factor) * self.values[i];
            backward[i] = smoothed;
            next = smoothed;
        }
        let values = forward
            .iter()
            .zip(&backward)
            .map(|(f, b)| (f + b) / 2.0)
            .collect();
        TimeSeries::from_sorted(self.timestamps.clone(), values)
    }

    /// Shift every timestamp by the given offset, in place.
    pub fn add_offset(&mut self, offset: i64) {
        for timestamp in &mut self.timestamps {
            *timestamp += offset;
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn sum(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.values.iter().sum())
        }
    }

    pub fn average(&self) -> Option<f64> {
        self.sum().map(|sum| sum / self.len() as f64)
    }

    pub fn median(&self) -> Option<f64> {
        self.percentile(50.0)
    }

    /// Population standard deviation.
    pub fn stdev(&self) -> Option<f64> {
        let mean = self.average()?;
        let variance = self
            .values
            .iter()
            .map(|value| (value - mean) * (value - mean))
            .sum::<f64>()
            / self.len() as f64;
        Some(variance.sqrt())
    }

    /// Nth percentile with linear interpolation between closest ranks.
    pub fn percentile(&self, n: f64) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        let rank = ((n / 100.0) * (sorted.len() - 1) as f64).clamp(0.0, (sorted.len() - 1) as f64);
        let lo = rank.floor() as usize;
        let frac = rank - lo as f64;
        if lo + 1 < sorted.len() {
            Some(sorted[lo] + frac * (sorted[lo + 1] - sorted[lo]))
        } else {
            Some(sorted[lo])
        }
    }

    fn series_op<F>(&self, other: &TimeSeries, op: F, skip_zero_divisor: bool) -> Result<TimeSeries>
    where
        F: Fn(f64, f64) -> f64,
    {
        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.len() && j < other.len() {
            match self.timestamps[i].cmp(&other.timestamps[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    if !(skip_zero_divisor && other.values[j] == 0.0) {
                        let result = op(self.values[i], other.values[j]);
                        if result.is_finite() {
                            timestamps.push(self.timestamps[i]);
                            values.push(result);
                        }
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        Self::non_empty(timestamps, values)
    }

    fn scalar_op<F>(&self, scalar: f64, op: F, skip_zero_divisor: bool) -> Result<TimeSeries>
    where
        F: Fn(f64, f64) -> f64,
    {
        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        if !(skip_zero_divisor && scalar == 0.0) {
            for (timestamp, value) in self.iter() {
                let result = op(value, scalar);
                if result.is_finite() {
                    timestamps.push(timestamp);
                    values.push(result);
                }
            }
        }
        Self::non_empty(timestamps, values)
    }

    fn non_empty(timestamps: Vec<Timestamp>, values: Vec<f64>) -> Result<TimeSeries> {
        if timestamps.is_empty() {
            Err(ADCError::EmptyResult {
                msg: "arithmetic produced a series with no points",
            })
        } else {
            Ok(TimeSeries::from_sorted(timestamps, values))
        }
    }
}

impl fmt::Display for TimeSeries {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "TimeSeries<start={:?}, end={:?}, len={}>",
            self.start(),
            self.end(),
            self.len()
        )
    }
}

impl From<BTreeMap<Timestamp, f64>> for TimeSeries {
    fn from(map: BTreeMap<Timestamp, f64>) -> TimeSeries {
        TimeSeries::new(map)
    }
}

impl FromIterator<(Timestamp, f64)> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = (Timestamp, f64)>>(iter: I) -> TimeSeries {
        TimeSeries::new(iter)
    }
}

impl Add<&TimeSeries> for &TimeSeries {
    type Output = Result<TimeSeries>;
    fn add(self, other: &TimeSeries) -> Result<TimeSeries> {
        self.series_op(other, |a, b| a + b, false)
    }
}

impl Sub<&TimeSeries> for &TimeSeries {
    type Output = Result<TimeSeries>;
    fn sub(self, other: &TimeSeries) -> Result<TimeSeries> {
        self.series_op(other, |a, b| a - b, false)
    }
}

impl Mul<&TimeSeries> for &TimeSeries {
    type Output = Result<TimeSeries>;
    fn mul(self, other: &TimeSeries) -> Result<TimeSeries> {
        self.series_op(other, |a, b| a * b, false)
    }
}

impl Div<&TimeSeries> for &TimeSeries {
    type Output = Result<TimeSeries>;
    fn div(self, other: &TimeSeries) -> Result<TimeSeries> {
        self.series_op(other, |a, b| a / b, true)
    }
}

impl Add<f64> for &TimeSeries {
    type Output = Result<TimeSeries>;
    fn add(self, scalar: f64) -> Result<TimeSeries> {
        self.scalar_op(scalar, |a, b| a + b, false)
    }
}

impl Sub<f64> for &TimeSeries {
    type Output = Result<TimeSeries>;
    fn sub(self, scalar: f64) -> Result<TimeSeries> {
        self.scalar_op(scalar, |a, b| a - b, false)
    }
}

impl Mul<f64> for &TimeSeries {
    type Output = Result<TimeSeries>;
    fn mul(self, scalar: f64) -> Result<TimeSeries> {
        self.scalar_op(scalar, |a, b| a * b, false)
    }
}

impl Div<f64> for &TimeSeries {
    type Output = Result<TimeSeries>;
    fn div(self, scalar: f64) -> Result<TimeSeries> {
        self.scalar_op(scalar, |a, b| a / b, true)
    }
}

/// Input accepted by the pipelines: an existing series, a plain mapping, or
/// a path to a two-column CSV file.
pub enum SeriesSource {
    Series(TimeSeries),
    Points(BTreeMap<Timestamp, f64>),
    CsvPath(PathBuf),
}

impl SeriesSource {
    pub fn load(self) -> Result<TimeSeries> {
        match self {
            SeriesSource::Series(series) => Ok(series),
            SeriesSource::Points(map) => Ok(TimeSeries::new(map)),
            SeriesSource::CsvPath(path) => util::read_csv(&path),
        }
    }
}

impl From<TimeSeries> for SeriesSource {
    fn from(series: TimeSeries) -> SeriesSource {
        SeriesSource::Series(series)
    }
}

impl From<BTreeMap<Timestamp, f64>> for SeriesSource {
    fn from(map: BTreeMap<Timestamp, f64>) -> SeriesSource {
        SeriesSource::Points(map)
    }
}

impl From<&str> for SeriesSource {
    fn from(path: &str) -> SeriesSource {
        SeriesSource::CsvPath(PathBuf::from(path))
    }
}

impl From<PathBuf> for SeriesSource {
    fn from(path: PathBuf) -> SeriesSource {
        SeriesSource::CsvPath(path)
    }
}
