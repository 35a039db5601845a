pub mod anomaly;
pub mod correlationresult;
