/// Result of correlating two series.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationResult {
    /// Shift, in timestamp units, at which the best coefficient was obtained.
    pub shift: i64,
    /// The correlation coefficient.
    pub coefficient: f64,
    /// The best coefficient with the shift penalty taken into account.
    pub shifted_coefficient: f64,
}
