mod support;

use serde_json::json;
use tracks_rs::config::PipelineConfig;
use tracks_rs::controller::TrackControllerRegistry;
use tracks_rs::core::{BufferKind, Resolution, TimeSpan, TrackId};
use tracks_rs::pipeline::{ProducerEvent, spawn_producer};
use tracks_rs::surface::{SurfaceDriver, Timeline, TrackStatus};

use support::ScriptedEngine;

async fn step_until_published(driver: &mut SurfaceDriver) -> ProducerEvent {
    for _ in 0..16 {
        if let Some(event @ ProducerEvent::Published { .. }) = driver.step().await.expect("step") {
            return event;
        }
    }
    panic!("no buffer published");
}

#[tokio::test(start_paused = true)]
async fn visible_window_is_fetched_once_and_cached() {
    let engine = ScriptedEngine::new();
    let config = PipelineConfig::default();
    let (handle, events, task) = spawn_producer(
        engine.clone(),
        TrackControllerRegistry::with_builtin_track_kinds(),
        config,
    );
    let visible = TimeSpan::new(0.0, 10.0).expect("span");
    let timeline = Timeline::new(visible, 1250.0, config).expect("timeline");
    let mut driver = SurfaceDriver::new(timeline, handle, events);

    driver
        .add_track("cpu0", "cpu_slices", json!({"cpu": 0}))
        .expect("add track");
    assert_eq!(driver.frame().expect("frame"), 0);

    let event = step_until_published(&mut driver).await;
    let ProducerEvent::Published { buffer, .. } = event else {
        unreachable!();
    };
    assert_eq!(buffer.kind(), BufferKind::Summary);
    assert_eq!(buffer.start(), -10.0);
    assert_eq!(buffer.end(), 20.0);

    let track_id = TrackId::new("cpu0");
    let track = driver.timeline().track(&track_id).expect("track");
    assert_eq!(track.status(), TrackStatus::Active);
    assert!(
        track
            .cache()
            .is_satisfied(visible, Resolution::from_exponent(-2))
    );
    assert!(!track.is_request_pending());
    assert_eq!(engine.count("update window_"), 1);

    // A pan inside the padded range needs nothing new.
    driver
        .timeline_mut()
        .set_visible_window(TimeSpan::new(4.0, 14.0).expect("span"));
    assert_eq!(driver.frame().expect("frame"), 0);
    assert!(driver.timeline().next_deadline().is_none());

    driver.producer().shutdown().expect("shutdown");
    task.await.expect("producer task");
}

#[tokio::test(start_paused = true)]
async fn rejected_track_reports_its_error() {
    let engine = ScriptedEngine::new();
    let config = PipelineConfig::default();
    let (handle, events, task) = spawn_producer(
        engine.clone(),
        TrackControllerRegistry::with_builtin_track_kinds(),
        config,
    );
    let visible = TimeSpan::new(0.0, 10.0).expect("span");
    let mut driver = SurfaceDriver::new(
        Timeline::new(visible, 1250.0, config).expect("timeline"),
        handle,
        events,
    );

    driver
        .add_track("mystery", "gpu_freq", json!({}))
        .expect("add track");
    driver.frame().expect("frame");

    let event = driver.step().await.expect("step");
    assert!(matches!(event, Some(ProducerEvent::TrackRejected { .. })));

    let track = driver
        .timeline()
        .track(&TrackId::new("mystery"))
        .expect("track");
    assert_eq!(track.status(), TrackStatus::Rejected);
    assert!(track.last_error().is_some());
    assert!(driver.timeline().next_deadline().is_none());
    assert_eq!(engine.queries().len(), 0);

    driver.producer().shutdown().expect("shutdown");
    task.await.expect("producer task");
}

#[tokio::test(start_paused = true)]
async fn removed_track_leaves_the_timeline() {
    let engine = ScriptedEngine::new();
    let config = PipelineConfig::default();
    let (handle, events, task) = spawn_producer(
        engine.clone(),
        TrackControllerRegistry::with_builtin_track_kinds(),
        config,
    );
    let visible = TimeSpan::new(0.0, 10.0).expect("span");
    let mut driver = SurfaceDriver::new(
        Timeline::new(visible, 1250.0, config).expect("timeline"),
        handle,
        events,
    );
    driver
        .add_track("cpu0", "cpu_slices", json!({"cpu": 0}))
        .expect("add track");
    driver.frame().expect("frame");
    step_until_published(&mut driver).await;

    let track_id = TrackId::new("cpu0");
    driver.remove_track(&track_id).expect("remove");
    assert_eq!(
        driver.timeline().track(&track_id).expect("track").status(),
        TrackStatus::Removing
    );

    let event = driver.step().await.expect("step");
    assert!(matches!(event, Some(ProducerEvent::TrackRemoved { .. })));
    assert!(driver.timeline().track(&track_id).is_none());
    assert_eq!(engine.count("drop "), 7);

    driver.producer().shutdown().expect("shutdown");
    task.await.expect("producer task");
}
