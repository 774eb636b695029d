use approx::assert_relative_eq;
use tracks_rs::PipelineError;
use tracks_rs::core::{LinearScale, TimeScale, TimeSpan};

fn span(start: f64, end: f64) -> TimeSpan {
    TimeSpan::new(start, end).expect("valid span")
}

#[test]
fn time_scale_maps_span_onto_width() {
    let scale = TimeScale::from_width(span(10.0, 20.0), 1000.0).expect("scale");

    assert_relative_eq!(scale.time_to_px(10.0).expect("px"), 0.0);
    assert_relative_eq!(scale.time_to_px(15.0).expect("px"), 500.0);
    assert_relative_eq!(scale.time_to_px(20.0).expect("px"), 1000.0);
    assert_relative_eq!(scale.px_to_time(250.0).expect("time"), 12.5);
    assert_relative_eq!(scale.width_px(), 1000.0);
}

#[test]
fn time_scale_deltas_use_span_density() {
    let scale = TimeScale::from_width(span(10.0, 20.0), 1000.0).expect("scale");

    assert_relative_eq!(scale.delta_time_to_px(2.0).expect("delta px"), 200.0);
    assert_relative_eq!(scale.delta_px_to_duration(50.0).expect("delta time"), 0.5);
}

#[test]
fn time_scale_honours_offset_pixel_range() {
    let scale = TimeScale::new(span(0.0, 4.0), (100.0, 500.0)).expect("scale");
    assert_relative_eq!(scale.time_to_px(1.0).expect("px"), 200.0);
    assert_eq!(scale.px_range(), (100.0, 500.0));
}

#[test]
fn zero_duration_or_width_is_degenerate() {
    let err = TimeScale::from_width(span(5.0, 5.0), 800.0).expect_err("zero duration");
    assert!(matches!(err, PipelineError::DegenerateInput(_)));

    let err = TimeScale::from_width(span(0.0, 1.0), 0.0).expect_err("zero width");
    assert!(matches!(err, PipelineError::DegenerateInput(_)));

    let err = LinearScale::new((0.0, 1.0), (3.0, 3.0)).expect_err("zero range");
    assert!(matches!(err, PipelineError::DegenerateInput(_)));
}

#[test]
fn non_finite_mapping_input_is_invalid_data() {
    let scale = TimeScale::from_width(span(0.0, 1.0), 100.0).expect("scale");
    assert!(matches!(
        scale.time_to_px(f64::NAN),
        Err(PipelineError::InvalidData(_))
    ));
    assert!(matches!(
        scale.delta_px_to_duration(f64::INFINITY),
        Err(PipelineError::InvalidData(_))
    ));
}

#[test]
fn time_span_rejects_reversed_bounds() {
    assert!(matches!(
        TimeSpan::new(2.0, 1.0),
        Err(PipelineError::InvalidData(_))
    ));
    assert!(serde_json::from_str::<TimeSpan>(r#"{"start": 3.0, "end": 1.0}"#).is_err());

    let padded = span(10.0, 14.0).padded_by_duration();
    assert_eq!(padded, span(6.0, 18.0));
}
