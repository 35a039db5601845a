//! A Rust library for univariate time-series anomaly detection and
//! cross-series correlation, intended for root-cause analysis over metric
//! streams.
//!
//! Given one target series and zero or more baseline series, the library
//! produces a per-timestamp anomaly score series, a list of discrete
//! anomaly intervals with an inferred peak timestamp, and correlation
//! results between series over arbitrary time windows, optionally on their
//! anomaly-score projections.
//!
//! ```ignore
//! use adclib::{AnomalyDetector, Correlator};
//!
//! // detect anomalies in a metric; input can be a TimeSeries, a plain
//! // mapping or a path to a two-column CSV file
//! let detector = AnomalyDetector::new(metric)?;
//! for anomaly in detector.get_anomalies() {
//!     println!("{}", anomaly);
//! }
//!
//! // correlate the metric with a candidate cause around the anomaly
//! let correlator = Correlator::builder()
//!     .time_period(anomaly.start_timestamp, anomaly.end_timestamp)
//!     .correlate(metric, candidate)?;
//! if let Some(result) = correlator.is_correlated(0.7) {
//!     println!("correlated with shift {}", result.shift);
//! }
//! ```
//!
//! ### References
//!
//! Li Wei, Nitin Kumar, Venkata Lolla, Eamonn Keogh, Stefano Lonardi, and
//! Chotirat Ann Ratanamahatana. *"Assumption-Free Anomaly Detection in Time
//! Series."* SSDBM, 2005. (The bitmap detector.)

pub mod anomalydetector;
pub mod common;
pub mod correlator;
pub mod detector;
pub mod errors;
pub mod syntheticseries;
pub mod timeseries;
pub mod types;
pub mod util;

pub use anomalydetector::{AnomalyDetector, AnomalyDetectorBuilder};
pub use common::anomaly::Anomaly;
pub use common::correlationresult::CorrelationResult;
pub use correlator::{Correlator, CorrelatorBuilder};
pub use errors::ADCError;
pub use timeseries::{SeriesSource, TimeSeries};
pub use types::{Result, Timestamp};
