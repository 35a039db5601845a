extern crate adclib;

use std::collections::BTreeMap;

use adclib::detector::DetectorParams;
use adclib::{ADCError, AnomalyDetector, TimeSeries, Timestamp};

fn constant_baseline(range: std::ops::Range<i64>, value: f64) -> BTreeMap<Timestamp, f64> {
    range.map(|t| (t, value)).collect()
}

fn with_region(
    baseline: &BTreeMap<Timestamp, f64>,
    region: std::ops::Range<i64>,
    value: f64,
) -> BTreeMap<Timestamp, f64> {
    let mut series = baseline.clone();
    for t in region {
        series.insert(t, value);
    }
    series
}

fn sign_test_params(upper: Option<f64>, lower: Option<f64>) -> DetectorParams {
    DetectorParams {
        percent_threshold_upper: upper,
        percent_threshold_lower: lower,
        scan_window: Some(24),
        ..Default::default()
    }
}

fn detect(
    target: BTreeMap<Timestamp, f64>,
    baseline: BTreeMap<Timestamp, f64>,
    params: DetectorParams,
) -> AnomalyDetector {
    AnomalyDetector::builder()
        .baseline(TimeSeries::new(baseline))
        .algorithm_name("sign_test")
        .algorithm_params(params)
        .detect(TimeSeries::new(target))
        .unwrap()
}

#[test]
fn missing_and_overspecified_parameters_are_rejected() {
    let bs = constant_baseline(1..100, 1.0);
    let no_params = AnomalyDetector::builder()
        .baseline(TimeSeries::new(bs.clone()))
        .algorithm_name("sign_test")
        .detect(TimeSeries::new(bs.clone()));
    assert!(matches!(
        no_params,
        Err(ADCError::RequiredParametersNotPassed { .. })
    ));

    let both = AnomalyDetector::builder()
        .baseline(TimeSeries::new(bs.clone()))
        .algorithm_name("sign_test")
        .algorithm_params(sign_test_params(Some(20.0), Some(-20.0)))
        .detect(TimeSeries::new(bs));
    assert!(matches!(
        both,
        Err(ADCError::RequiredParametersNotPassed { .. })
    ));
}

#[test]
fn identical_series_have_no_anomalies() {
    let bs = constant_baseline(1..100, 1.0);
    let detector = detect(bs.clone(), bs, sign_test_params(Some(20.0), None));
    assert!(detector.get_anomalies().is_empty());
}

#[test]
fn elevated_region_expands_to_the_scan_window() {
    let bs = constant_baseline(1..100, 1.0);
    let ts = with_region(&bs, 10..34, 1.200001);
    let detector = detect(ts, bs, sign_test_params(Some(20.0), None));
    let anomalies = detector.get_anomalies();
    assert_eq!(anomalies.len(), 1);
    let anomaly = &anomalies[0];
    // the anomaly is larger than the elevated region itself
    assert_eq!(anomaly.time_window(), (4, 39));
    assert!(anomaly.anomaly_score > 98.0);
    assert!(anomaly.anomaly_score < 99.0);
    assert!(anomaly.start_timestamp <= anomaly.exact_timestamp);
    assert!(anomaly.exact_timestamp <= anomaly.end_timestamp);
}

#[test]
fn depressed_region_with_lower_threshold() {
    let bs = constant_baseline(1..100, 1.0);
    let ts = with_region(&bs, 10..34, 0.799999);
    let detector = detect(ts, bs, sign_test_params(None, Some(-20.0)));
    let anomalies = detector.get_anomalies();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].time_window(), (4, 39));
    assert!(anomalies[0].anomaly_score > 98.0);
    assert!(anomalies[0].anomaly_score < 99.0);
}

#[test]
fn two_regions_with_a_big_gap_stay_separate() {
    let bs = constant_baseline(1..100, 1.0);
    let ts = with_region(&with_region(&bs, 1..25, 0.799999), 60..84, 0.799999);
    let detector = detect(ts, bs, sign_test_params(None, Some(-20.0)));
    let anomalies = detector.get_anomalies();
    assert_eq!(anomalies.len(), 2);
    assert_eq!(anomalies[0].time_window(), (1, 30));
    assert!(anomalies[0].anomaly_score > 99.0);
    assert_eq!(anomalies[1].time_window(), (54, 89));
    assert!(anomalies[1].anomaly_score > 98.0);
    assert!(anomalies[1].anomaly_score < 99.0);
}

#[test]
fn two_regions_with_a_small_gap_merge() {
    let bs = constant_baseline(1..100, 1.0);
    let ts = with_region(&with_region(&bs, 1..25, 1.21), 30..40, 1.21);
    let detector = detect(ts, bs, sign_test_params(Some(20.0), None));
    let anomalies = detector.get_anomalies();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].time_window(), (1, 40));
    assert!(anomalies[0].anomaly_score > 99.0);
}

#[test]
fn confidence_controls_sensitivity_to_noise() {
    let bs = constant_baseline(1..100, 1.0);
    let mut ts = with_region(&bs, 1..25, 1.21);
    // dent the region every sixth point, just below the threshold
    for t in (1..25).step_by(6) {
        ts.insert(t, 1.19);
    }
    let detector = detect(ts.clone(), bs.clone(), sign_test_params(Some(20.0), None));
    assert_eq!(detector.get_anomalies().len(), 1);

    let strict = DetectorParams {
        confidence: Some(0.0001),
        ..sign_test_params(Some(20.0), None)
    };
    let detector = detect(ts, bs, strict);
    assert!(detector.get_anomalies().is_empty());
}

#[test]
fn offset_shifts_the_baseline_before_comparing() {
    let bs = constant_baseline(1..30, 1.0);
    // above the percent threshold alone, but below the offset baseline
    let quiet = with_region(&bs, 1..21, 1.5);
    let params = DetectorParams {
        offset: Some(2.0),
        ..sign_test_params(Some(0.0), None)
    };
    let detector = detect(quiet, bs.clone(), params.clone());
    assert!(detector.get_anomalies().is_empty());

    // clears the offset baseline as well
    let loud = with_region(&bs, 1..21, 3.1);
    let detector = detect(loud, bs.clone(), params);
    assert_eq!(detector.get_anomalies().len(), 1);

    // the lower bound mirrors: below baseline plus offset counts
    let low = with_region(&bs, 1..25, 2.9);
    let params = DetectorParams {
        offset: Some(2.0),
        ..sign_test_params(None, Some(0.0))
    };
    let detector = detect(low, bs, params);
    assert_eq!(detector.get_anomalies().len(), 1);
}

#[test]
fn gap_parameter_bridges_nearby_regions() {
    let bs = constant_baseline(1..100, 1.0);
    // two regions whose candidate windows stay apart without a gap
    let ts = with_region(&with_region(&bs, 1..25, 0.799999), 60..84, 0.799999);
    let bridged = DetectorParams {
        gap: Some(40),
        ..sign_test_params(None, Some(-20.0))
    };
    let detector = detect(ts, bs, bridged);
    let anomalies = detector.get_anomalies();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].time_window(), (1, 89));
}
