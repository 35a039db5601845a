extern crate adclib;

use adclib::correlator::CorrelatorParams;
use adclib::{ADCError, Correlator, TimeSeries};

fn series(points: &[(i64, f64)]) -> TimeSeries {
    TimeSeries::new(points.iter().copied())
}

fn s1() -> TimeSeries {
    series(&[
        (0, 0.0),
        (1, 0.0),
        (2, 0.0),
        (3, 0.0),
        (4, 0.5),
        (5, 1.0),
        (6, 1.0),
        (7, 1.0),
        (8, 0.0),
    ])
}

fn s2() -> TimeSeries {
    series(&[
        (0, 0.0),
        (1, 0.5),
        (2, 1.0),
        (3, 1.0),
        (4, 1.0),
        (5, 0.0),
        (6, 0.0),
        (7, 0.0),
        (8, 0.0),
    ])
}

// s2 truncated at timestamp 5 inclusive
fn s3() -> TimeSeries {
    series(&[
        (0, 0.0),
        (1, 0.5),
        (2, 1.0),
        (3, 1.0),
        (4, 1.0),
        (5, 0.0),
    ])
}

#[test]
fn truncated_series_aligns_to_the_same_result() {
    let full = Correlator::new(s1(), s2()).unwrap();
    let truncated = Correlator::new(s1(), s3()).unwrap();
    assert_eq!(
        full.get_correlation_result().coefficient,
        truncated.get_correlation_result().coefficient
    );
    assert_eq!(
        full.get_correlation_result().shift,
        truncated.get_correlation_result().shift
    );
}

#[test]
fn identical_series_correlate_perfectly() {
    let correlator = Correlator::new(s1(), s1()).unwrap();
    let result = correlator.get_correlation_result();
    assert!((result.coefficient - 1.0).abs() < 1e-9);
    assert_eq!(result.shift, 0);
}

#[test]
fn anomaly_score_projection_changes_the_result() {
    let raw = Correlator::new(s1(), s2()).unwrap();
    let projected = Correlator::builder()
        .use_anomaly_score(true)
        .correlate(s1(), s2())
        .unwrap();
    assert_ne!(
        raw.get_correlation_result().coefficient,
        projected.get_correlation_result().coefficient
    );
}

#[test]
fn is_correlated_returns_the_result_past_the_threshold() {
    let correlator = Correlator::new(s1(), s3()).unwrap();
    let result = correlator.is_correlated(0.0);
    assert!(result.is_some());
    assert_eq!(result.unwrap(), correlator.get_correlation_result());
    // an impossible threshold yields the falsy sentinel
    assert!(correlator.is_correlated(1.5).is_none());
}

#[test]
fn algorithm_registry() {
    assert!(matches!(
        Correlator::builder()
            .algorithm_name("NotValidAlgorithm")
            .correlate(s1(), s2()),
        Err(ADCError::AlgorithmNotFound { .. })
    ));
    let explicit = Correlator::builder()
        .algorithm_name("cross_correlator")
        .correlate(s1(), s2())
        .unwrap();
    let implicit = Correlator::new(s1(), s2()).unwrap();
    assert_eq!(
        explicit.get_correlation_result(),
        implicit.get_correlation_result()
    );
}

#[test]
fn wider_shift_room_changes_nothing_when_offsets_fit() {
    let wide = Correlator::builder()
        .algorithm_params(CorrelatorParams {
            max_shift_seconds: Some(180),
            ..Default::default()
        })
        .correlate(s1(), s2())
        .unwrap();
    let default = Correlator::new(s1(), s2()).unwrap();
    assert_eq!(
        wide.get_correlation_result().coefficient,
        default.get_correlation_result().coefficient
    );
}

#[test]
fn zero_shift_room_collapses_the_search() {
    let pinned = Correlator::builder()
        .algorithm_params(CorrelatorParams {
            max_shift_seconds: Some(0),
            ..Default::default()
        })
        .correlate(s1(), s2())
        .unwrap();
    let default = Correlator::new(s1(), s2()).unwrap();
    assert_eq!(pinned.get_correlation_result().shift, 0);
    assert_ne!(
        pinned.get_correlation_result().coefficient,
        default.get_correlation_result().coefficient
    );
}

#[test]
fn too_few_points_is_an_error() {
    let tiny = series(&[(0, 0.0)]);
    assert!(matches!(
        Correlator::new(tiny, s1()),
        Err(ADCError::NotEnoughDataPoints { .. })
    ));
}

#[test]
fn time_period_crops_both_series() {
    let windowed = Correlator::builder()
        .time_period(2, 7)
        .correlate(s1(), s2())
        .unwrap();
    let full = Correlator::new(s1(), s2()).unwrap();
    assert_ne!(
        windowed.get_correlation_result().coefficient,
        full.get_correlation_result().coefficient
    );

    // a period with no points in it is not correlatable
    assert!(matches!(
        Correlator::builder()
            .time_period(100, 200)
            .correlate(s1(), s2()),
        Err(ADCError::NotEnoughDataPoints { .. })
    ));
}
