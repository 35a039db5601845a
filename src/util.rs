use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::ADCError;
use crate::timeseries::TimeSeries;
use crate::types::{Result, Timestamp};

pub(crate) fn check_required(test: bool, msg: &'static str) -> Result<()> {
    if test {
        Ok(())
    } else {
        Err(ADCError::RequiredParametersNotPassed { msg })
    }
}

pub(crate) fn check_enough(test: bool, msg: &'static str) -> Result<()> {
    if test {
        Ok(())
    } else {
        Err(ADCError::NotEnoughDataPoints { msg })
    }
}

/// Exponential moving average of a list of points. The initial point is its
/// own average; afterwards the running state carries weight `1 - smoothing_factor`
/// and the new point carries `smoothing_factor`.
pub fn compute_ema(smoothing_factor: f64, points: &[f64]) -> Vec<f64> {
    let mut ema = Vec::with_capacity(points.len());
    if let Some(&first) = points.first() {
        ema.push(first);
    }
    for i in 1..points.len() {
        let prev = ema[i - 1];
        ema.push(smoothing_factor * points[i] + (1.0 - smoothing_factor) * prev);
    }
    ema
}

/// Quantile function for the binomial distribution with success probability
/// 0.5: the smallest k such that Prob(X <= k) >= p. Compare to R's qbinom.
pub fn qbinom(p: f64, n: i64) -> i64 {
    if p > 0.5 {
        return n - qbinom(1.0 - p, n);
    } else if p == 0.5 {
        return n / 2;
    }

    let two_nth = 0.5f64.powi(n as i32);
    let mut q = two_nth;
    let mut k = n;
    let mut fact = 1.0;
    while q < 1.0 - p && k > 0 {
        fact *= k as f64 / (n - k + 1) as f64;
        q += fact * two_nth;
        k -= 1;
    }
    k
}

/// CDF for the binomial distribution with success probability 0.5. Uses the
/// continuity-corrected normal approximation for n > 10 (error < 0.0025).
/// Compare to R's pbinom.
pub fn pbinom(k: i64, n: i64) -> f64 {
    if k == n {
        return 1.0;
    } else if k < n / 2 {
        return 1.0 - pbinom(n - k, n);
    } else if n > 10 {
        let con_adj = if n % 2 != 0 { 0.0 } else { 0.5 };
        return 0.5 * (1.0 + erf((k as f64 + con_adj - n as f64 * 0.5) / (n as f64 * 0.5).sqrt()));
    }

    // compute exactly
    let two_nth = 0.5f64.powi(n as i32);
    let mut prob = 1.0 - two_nth;
    let mut fact = n as f64;
    let mut j = n - 1;
    while j > k {
        prob -= fact * two_nth;
        fact *= j as f64 / (n - j + 1) as f64;
        j -= 1;
    }
    prob
}

// Abramowitz-Stegun 7.1.26, max absolute error 1.5e-7, far inside the
// tolerance pbinom needs from the normal approximation.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = ((((1.061405429 * t - 1.453152027) * t + 1.421413741) * t - 0.284496736) * t
        + 0.254829592)
        * t;
    sign * (1.0 - poly * (-x * x).exp())
}

// Accepted date-time formats, all parsed in UTC to epoch milliseconds.
const TIMESTAMP_STR_FORMATS: [&str; 15] = [
    "%Y%m%d_%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y%m%d %H:%M:%S",
    "%Y-%m-%d_%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y%m%dT%H:%M:%S",
    "%Y-%m-%d_%H:%M:%S%.f",
    "%Y%m%d_%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y%m%dT%H:%M:%S%.f",
    "%H:%M:%S",
    "%Y%m%d %H:%M:%S%.f",
];

// strptime's default date for time-only formats.
const TIME_ONLY_BASE: (i32, u32, u32) = (1900, 1, 1);

/// Convert a timestamp string to an epoch number. Float-castable strings are
/// taken verbatim; everything else is tried against the fixed format list
/// and converted to epoch milliseconds in UTC.
pub fn to_epoch(t_str: &str) -> Result<f64> {
    if let Ok(t) = t_str.parse::<f64>() {
        return Ok(t);
    }
    for format in TIMESTAMP_STR_FORMATS {
        if format.contains("%z") {
            if let Ok(t) = DateTime::parse_from_str(t_str, format) {
                return Ok(epoch_millis(t.timestamp(), t.timestamp_subsec_micros()));
            }
        } else if format.starts_with("%H") {
            if let Ok(t) = NaiveTime::parse_from_str(t_str, format) {
                let (y, m, d) = TIME_ONLY_BASE;
                if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                    let dt = date.and_time(t).and_utc();
                    return Ok(epoch_millis(dt.timestamp(), dt.timestamp_subsec_micros()));
                }
            }
        } else if let Ok(t) = NaiveDateTime::parse_from_str(t_str, format) {
            let dt = t.and_utc();
            return Ok(epoch_millis(dt.timestamp(), dt.timestamp_subsec_micros()));
        }
    }
    Err(ADCError::InvalidDataFormat {
        msg: "timestamp string matches no accepted format",
    })
}

fn epoch_millis(secs: i64, subsec_micros: u32) -> f64 {
    secs as f64 * 1000.0 + subsec_micros as f64 / 1000.0
}

/// Read a two-column (timestamp, value) CSV file into a time series.
/// Delimiter `,`, quote `|`. Rows that fail parsing are silently skipped;
/// an unreadable path is an error.
pub fn read_csv(csv_path: &Path) -> Result<TimeSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .quote(b'|')
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)
        .map_err(|_| ADCError::InvalidDataFormat {
            msg: "csv path is not readable",
        })?;

    let mut points = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(_) => continue,
        };
        let key = match record.get(0).map(|field| to_epoch(field.trim())) {
            Some(Ok(key)) => key,
            _ => continue,
        };
        let value = match record.get(1).map(|field| field.trim().parse::<f64>()) {
            Some(Ok(value)) => value,
            _ => continue,
        };
        points.push((key as Timestamp, value));
    }
    Ok(TimeSeries::new(points))
}
