use core::fmt;

/// Errors that can be returned by detector and correlator operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ADCError {
    /// Unknown algorithm name in a registry lookup.
    AlgorithmNotFound { msg: &'static str },
    /// An algorithm requires parameters that were omitted or over-specified.
    RequiredParametersNotPassed { msg: &'static str },
    /// Input data that cannot be interpreted (unreadable path, unparseable
    /// timestamp string).
    InvalidDataFormat { msg: &'static str },
    /// A series too short for the algorithm's windows, or a crop that left
    /// no points where some were required.
    NotEnoughDataPoints { msg: &'static str },
    /// A TimeSeries operation produced a series with no points.
    EmptyResult { msg: &'static str },
    /// Exact-match lookup on a timestamp that is not in the series.
    MissingTimestamp { msg: &'static str },
}

impl fmt::Display for ADCError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ADCError::AlgorithmNotFound { msg } => write!(f, "algorithm not found: {}", msg),
            ADCError::RequiredParametersNotPassed { msg } => {
                write!(f, "required parameters not passed: {}", msg)
            }
            ADCError::InvalidDataFormat { msg } => write!(f, "invalid data format: {}", msg),
            ADCError::NotEnoughDataPoints { msg } => write!(f, "not enough data points: {}", msg),
            ADCError::EmptyResult { msg } => write!(f, "empty result: {}", msg),
            ADCError::MissingTimestamp { msg } => write!(f, "missing timestamp: {}", msg),
        }
    }
}

impl std::error::Error for ADCError {}
