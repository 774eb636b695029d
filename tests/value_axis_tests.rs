use approx::assert_relative_eq;
use tracks_rs::core::{CounterBuffer, Resolution, ValueAxis};

#[test]
fn axis_top_rounds_up_to_quarter_power_of_ten() {
    let axis = ValueAxis::from_extremes(0.0, 2_400_000.0).expect("axis");
    assert_relative_eq!(axis.y_max(), 2_500_000.0);
    assert_relative_eq!(axis.y_range(), 2_500_000.0);
    assert!(!axis.is_bipolar());
    assert_eq!(axis.label("Hz", 1), "2.5 GHz");
}

#[test]
fn negative_minimum_doubles_the_range() {
    let axis = ValueAxis::from_extremes(-500.0, 7_200.0).expect("axis");
    assert_relative_eq!(axis.y_max(), 7_500.0);
    assert_relative_eq!(axis.y_range(), 15_000.0);
    assert!(axis.is_bipolar());
    assert_relative_eq!(axis.scaled_height(3_750.0, 100.0), 25.0);
    assert_eq!(axis.label("", 0), "7.5 K");
}

#[test]
fn non_finite_extremes_are_rejected() {
    assert!(ValueAxis::from_extremes(f64::NAN, 1.0).is_err());
}

#[test]
fn hover_lookup_finds_last_sample_at_or_before() {
    let counter = CounterBuffer {
        start: 0.0,
        end: 3.0,
        resolution: Resolution::from_exponent(-3),
        maximum_value: 2_000_000.0,
        minimum_value: 0.0,
        ts_starts: vec![0.0, 1.0, 2.0],
        ts_ends: vec![1.0, 2.0, 3.0],
        freq_khz: vec![1_000_000, 1_500_000, 2_000_000],
        idle_values: vec![4_294_967_295.0, 1.0, 4_294_967_295.0],
        idles: vec![false, true, false],
    };

    let sample = counter.sample_at(1.5).expect("sample");
    assert_eq!(sample.freq_khz, 1_500_000);
    assert_eq!(sample.idle_state(), Some(1.0));

    let exact = counter.sample_at(2.0).expect("sample");
    assert_eq!(exact.freq_khz, 2_000_000);
    assert_eq!(exact.idle_state(), None);

    assert!(counter.sample_at(-0.5).is_none());
    assert_relative_eq!(counter.value_axis().expect("axis").y_max(), 2_500_000.0);
}
