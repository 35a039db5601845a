//! Demo binary: detect anomalies in a synthetic metric and correlate it
//! against a time-shifted companion series.

use adclib::detector::DetectorParams;
use adclib::syntheticseries::SyntheticSeries;
use adclib::{AnomalyDetector, Correlator};

fn main() -> adclib::Result<()> {
    tracing_subscriber::fmt().init();

    let num = 600;
    let period = 60;
    let amplitude = 10.0;
    let noise = 1.0;
    let seed = 17;
    let interval = 60;

    let data = SyntheticSeries::new(num, period, amplitude, noise, seed, 0, interval);
    println!(
        "generated {} points with {} injected shifts",
        data.series.len(),
        data.anomaly_indices.len()
    );

    let detector = AnomalyDetector::builder()
        .algorithm_name("bitmap_detector")
        .algorithm_params(DetectorParams {
            lag_window_size: Some(50),
            future_window_size: Some(50),
            ..Default::default()
        })
        .detect(data.series.clone())?;

    for anomaly in detector.get_anomalies() {
        println!("{}", anomaly);
    }

    // a companion metric lagging one sampling step behind
    let mut companion = data.series.clone();
    companion.add_offset(interval);
    let correlator = Correlator::new(data.series, companion)?;
    let result = correlator.get_correlation_result();
    println!(
        "companion correlation: shift={} coefficient={:.4} shifted={:.4}",
        result.shift, result.coefficient, result.shifted_coefficient
    );
    match correlator.is_correlated(0.7) {
        Some(_) => println!("the companion metric is correlated"),
        None => println!("the companion metric is not correlated"),
    }
    Ok(())
}
