//! Track controllers: the producer-side half of a track.
//!
//! A controller owns the derived views it creates in the query engine and
//! turns each bounds change into one query round that yields a
//! [`TrackDataBuffer`]. Controllers never run two rounds at once: the
//! producer holds each one behind an async mutex and drops bounds changes
//! that arrive while a round is in flight.

mod activity;
mod config;
mod cpu_freq;
mod cpu_slices;
mod extremes;
mod query;
mod registry;
mod setup;
mod window;

pub use config::CpuTrackConfig;
pub use cpu_freq::{CPU_FREQ_TRACK_KIND, CpuFreqTrackController};
pub use cpu_slices::{CPU_SLICE_TRACK_KIND, CpuSliceTrackController};
pub use extremes::ExtremesCache;
pub use query::TrackQueries;
pub use registry::{ControllerConstructor, TrackControllerRegistry, register_builtin_track_kinds};
pub use setup::{DerivedView, DerivedViewKind, SetupState};
pub use window::{FetchMode, WindowPlan};

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::config::PipelineConfig;
use crate::core::{Resolution, TrackDataBuffer, TrackId};
use crate::engine::QueryEngine;
use crate::error::PipelineResult;

/// Everything a controller constructor receives.
#[derive(Clone)]
pub struct TrackControllerArgs {
    pub track_id: TrackId,
    /// Distinguishes successive controllers created for the same track id.
    pub instance: u64,
    pub engine: Arc<dyn QueryEngine>,
    /// Opaque per-kind configuration record.
    pub config: serde_json::Value,
    pub pipeline: PipelineConfig,
}

/// Contract implemented by every track kind.
pub trait TrackController: Send {
    fn kind(&self) -> &'static str;

    fn track_id(&self) -> &TrackId;

    fn setup_state(&self) -> &SetupState;

    /// Runs one query round for `[start, end]` at `resolution`, setting up
    /// derived views first when needed.
    fn on_bounds_change(
        &mut self,
        start: f64,
        end: f64,
        resolution: Resolution,
    ) -> BoxFuture<'_, PipelineResult<TrackDataBuffer>>;

    /// Drops the derived views created during setup.
    fn on_destroy(&mut self) -> BoxFuture<'_, PipelineResult<()>>;
}
