mod support;

use std::io;
use std::sync::{Arc, Mutex};

use tracks_rs::PipelineError;
use tracks_rs::controller::{
    CPU_FREQ_TRACK_KIND, CPU_SLICE_TRACK_KIND, CpuSliceTrackController, TrackController,
    TrackControllerRegistry, register_builtin_track_kinds,
};

use support::{ScriptedEngine, controller_args};

#[test]
fn builtin_kinds_are_registered_in_order() {
    let registry = TrackControllerRegistry::with_builtin_track_kinds();
    let kinds: Vec<&str> = registry.kinds().collect();
    assert_eq!(kinds, vec![CPU_SLICE_TRACK_KIND, CPU_FREQ_TRACK_KIND]);
}

#[test]
fn registry_creates_controller_of_requested_kind() {
    let registry = TrackControllerRegistry::with_builtin_track_kinds();
    let engine = ScriptedEngine::new();

    let controller = registry
        .create("cpu_freq", controller_args(engine, "freq0", 1))
        .expect("create");
    assert_eq!(controller.kind(), CPU_FREQ_TRACK_KIND);
    assert_eq!(controller.track_id().as_str(), "freq0");
    assert!(!controller.setup_state().is_ready());
}

#[test]
fn unknown_kind_is_reported() {
    let registry = TrackControllerRegistry::with_builtin_track_kinds();
    let Err(err) = registry.create("gpu_freq", controller_args(ScriptedEngine::new(), "g", 0))
    else {
        panic!("unknown kind must fail");
    };
    assert_eq!(err, PipelineError::UnknownTrackKind("gpu_freq".to_owned()));
}

#[test]
fn duplicate_registration_is_an_error() {
    let mut registry = TrackControllerRegistry::new();
    registry
        .register("slices", CpuSliceTrackController::create)
        .expect("first registration");
    let err = registry
        .register("slices", CpuSliceTrackController::create)
        .expect_err("duplicate");
    assert_eq!(err, PipelineError::DuplicateTrackKind("slices".to_owned()));
}

#[test]
fn builtin_registration_keeps_existing_kinds() {
    let mut registry = TrackControllerRegistry::new();
    registry
        .register(CPU_FREQ_TRACK_KIND, CpuSliceTrackController::create)
        .expect("custom registration");
    register_builtin_track_kinds(&mut registry);

    let engine = ScriptedEngine::new();
    let controller = registry
        .create(CPU_FREQ_TRACK_KIND, controller_args(engine, "f", 0))
        .expect("create");
    assert_eq!(controller.kind(), CPU_SLICE_TRACK_KIND);
    assert!(registry.contains(CPU_SLICE_TRACK_KIND));
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn builtin_registration_logs_each_kind() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut registry = TrackControllerRegistry::with_builtin_track_kinds();
        register_builtin_track_kinds(&mut registry);
    });

    let output = String::from_utf8(logs.0.lock().expect("log buffer").clone()).expect("utf8");
    assert_eq!(output.matches("registered track kind").count(), 2);
    assert_eq!(output.matches("track kind already registered").count(), 2);
    assert!(output.contains(CPU_SLICE_TRACK_KIND));
    assert!(output.contains(CPU_FREQ_TRACK_KIND));
}
