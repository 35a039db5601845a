use core::fmt;

use crate::types::Timestamp;

/// A discrete anomaly interval produced by the detection pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Anomaly {
    /// Start of the anomaly period.
    pub start_timestamp: Timestamp,
    /// End of the anomaly period (inclusive).
    pub end_timestamp: Timestamp,
    /// Maximal anomaly score inside the period.
    pub anomaly_score: f64,
    /// Timestamp within the period where the anomaly most likely happened.
    pub exact_timestamp: Timestamp,
}

impl Anomaly {
    pub fn time_window(&self) -> (Timestamp, Timestamp) {
        (self.start_timestamp, self.end_timestamp)
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Anomaly from {} to {} with score {}",
            self.start_timestamp, self.end_timestamp, self.anomaly_score
        )
    }
}
