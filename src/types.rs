use crate::errors::ADCError;

/// Timestamps are opaque epoch integers (seconds or milliseconds; the caller
/// owns the unit convention). Ordering and subtraction are the only
/// operations the core performs on them.
pub type Timestamp = i64;

pub type Result<T> = core::result::Result<T, ADCError>;
