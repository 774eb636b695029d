use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use tracks_rs::PipelineError;
use tracks_rs::config::PipelineConfig;
use tracks_rs::core::{Resolution, SliceBuffer, TimeSpan, TrackDataBuffer, TrackId};
use tracks_rs::pipeline::{BoundsRequest, ProducerEvent, ProducerRequest};
use tracks_rs::surface::{Timeline, TrackStatus};

const DELAY: Duration = Duration::from_millis(50);

fn span(start: f64, end: f64) -> TimeSpan {
    TimeSpan::new(start, end).expect("span")
}

fn timeline_with_track(track: &str) -> Timeline {
    let mut timeline =
        Timeline::new(span(0.0, 10.0), 1250.0, PipelineConfig::default()).expect("timeline");
    timeline
        .add_track(TrackId::new(track), "cpu_slices", json!({"cpu": 0}))
        .expect("add track");
    timeline
}

fn published(request: &BoundsRequest, end: f64, truncated: bool) -> ProducerEvent {
    let mut buffer = SliceBuffer::with_capacity(request.start, end, request.resolution, 0, 0);
    buffer.truncated = truncated;
    ProducerEvent::Published {
        track_id: request.track_id.clone(),
        request: request.clone(),
        buffer: Arc::new(TrackDataBuffer::Slice(buffer)),
    }
}

/// Sends a request for [0, 10], then pans to [100, 110] and sends that one
/// too, as if the producer had dropped it while the first round ran.
fn pan_while_first_round_runs(timeline: &mut Timeline, start: Instant) -> BoundsRequest {
    timeline.check_coverage(start).expect("check");
    let first = timeline
        .take_due_requests(start + DELAY)
        .expect("take")
        .remove(0);

    timeline.set_visible_window(span(100.0, 110.0));
    assert_eq!(timeline.check_coverage(start + DELAY).expect("check"), 1);
    let dropped = timeline.take_due_requests(start + DELAY * 2).expect("take");
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].start, 90.0);
    first
}

#[test]
fn failure_of_an_older_round_does_not_hold_back_the_current_window() {
    let start = Instant::now();
    let mut timeline = timeline_with_track("cpu0");
    let first = pan_while_first_round_runs(&mut timeline, start);

    timeline.apply_event(ProducerEvent::RoundFailed {
        track_id: TrackId::new("cpu0"),
        request: first,
        error: PipelineError::QueryShape("boom".to_owned()),
    });

    let now = start + DELAY * 2;
    assert_eq!(timeline.check_coverage(now).expect("check"), 1);
    let requests = timeline.take_due_requests(now + DELAY).expect("take");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].start, 90.0);
    assert_eq!(requests[0].end, 120.0);
}

#[test]
fn truncated_older_round_does_not_hold_back_the_current_window() {
    let start = Instant::now();
    let mut timeline = timeline_with_track("cpu0");
    let first = pan_while_first_round_runs(&mut timeline, start);

    timeline.apply_event(published(&first, 5.0, true));

    let now = start + DELAY * 2;
    assert_eq!(timeline.check_coverage(now).expect("check"), 1);
    let requests = timeline.take_due_requests(now + DELAY).expect("take");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].resolution, Resolution::from_exponent(-2));
    assert_eq!(requests[0].start, 90.0);
}

#[test]
fn removing_track_cannot_be_re_added_until_teardown_completes() {
    let start = Instant::now();
    let mut timeline = timeline_with_track("cpu0");
    let track_id = TrackId::new("cpu0");

    timeline.apply_event(ProducerEvent::TrackAdded {
        track_id: track_id.clone(),
        kind: "cpu_slices".to_owned(),
    });
    timeline.check_coverage(start).expect("check");
    let request = timeline
        .take_due_requests(start + DELAY)
        .expect("take")
        .remove(0);
    timeline.remove_track(&track_id).expect("remove");

    let err = timeline
        .add_track(track_id.clone(), "cpu_slices", json!({"cpu": 3}))
        .expect_err("teardown still pending");
    assert!(matches!(err, PipelineError::InvalidTrackConfig { .. }));

    // The old controller's last round lands before its teardown.
    assert!(!timeline.apply_event(published(&request, request.end, false)));
    assert_eq!(
        timeline.track(&track_id).expect("track").status(),
        TrackStatus::Removing
    );
    assert!(timeline.apply_event(ProducerEvent::TrackRemoved {
        track_id: track_id.clone(),
    }));
    assert!(timeline.track(&track_id).is_none());

    let add = timeline
        .add_track(track_id.clone(), "cpu_slices", json!({"cpu": 3}))
        .expect("re-add");
    assert!(matches!(add, ProducerRequest::AddTrack { .. }));
    let track = timeline.track(&track_id).expect("track");
    assert!(track.cache().buffer().is_none());
    assert_eq!(timeline.check_coverage(start + DELAY).expect("check"), 1);
}

#[test]
fn rejected_track_can_be_added_again() {
    let mut timeline = timeline_with_track("gpu");
    let track_id = TrackId::new("gpu");
    timeline.apply_event(ProducerEvent::TrackRejected {
        track_id: track_id.clone(),
        error: PipelineError::UnknownTrackKind("gpu_freq".to_owned()),
    });

    timeline
        .add_track(track_id.clone(), "cpu_freq", json!({"cpu": 0}))
        .expect("re-add after rejection");
    let track = timeline.track(&track_id).expect("track");
    assert_eq!(track.status(), TrackStatus::Adding);
    assert_eq!(track.kind(), "cpu_freq");
}
