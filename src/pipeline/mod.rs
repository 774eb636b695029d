//! Producer side of the pipeline and the messages crossing into it.
//!
//! The surface talks to the producer only through plain-data messages over
//! `tokio::sync::mpsc` channels. Published buffers travel as
//! `Arc<TrackDataBuffer>` snapshots.

mod messages;
mod producer;

pub use messages::{BoundsRequest, ProducerEvent, ProducerRequest};
pub use producer::{Dispatch, Producer};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::PipelineConfig;
use crate::controller::TrackControllerRegistry;
use crate::core::TrackId;
use crate::engine::QueryEngine;
use crate::error::{PipelineError, PipelineResult};

/// Cloneable sender half used by the surface.
#[derive(Debug, Clone)]
pub struct ProducerHandle {
    requests: mpsc::UnboundedSender<ProducerRequest>,
}

impl ProducerHandle {
    #[must_use]
    pub fn new(requests: mpsc::UnboundedSender<ProducerRequest>) -> Self {
        Self { requests }
    }

    pub fn send(&self, request: ProducerRequest) -> PipelineResult<()> {
        self.requests
            .send(request)
            .map_err(|_| PipelineError::ChannelClosed)
    }

    pub fn add_track(
        &self,
        track_id: impl Into<TrackId>,
        kind: impl Into<String>,
        config: serde_json::Value,
    ) -> PipelineResult<()> {
        self.send(ProducerRequest::AddTrack {
            track_id: track_id.into(),
            kind: kind.into(),
            config,
        })
    }

    pub fn remove_track(&self, track_id: impl Into<TrackId>) -> PipelineResult<()> {
        self.send(ProducerRequest::RemoveTrack {
            track_id: track_id.into(),
        })
    }

    pub fn request_bounds(&self, request: BoundsRequest) -> PipelineResult<()> {
        self.send(ProducerRequest::BoundsChange(request))
    }

    pub fn shutdown(&self) -> PipelineResult<()> {
        self.send(ProducerRequest::Shutdown)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }
}

/// Spawns a [`Producer`] task on the current tokio runtime.
///
/// Returns the request handle, the event receiver and the task handle, which
/// completes once the producer has shut down and drained its rounds.
pub fn spawn_producer(
    engine: Arc<dyn QueryEngine>,
    registry: TrackControllerRegistry,
    pipeline: PipelineConfig,
) -> (
    ProducerHandle,
    mpsc::UnboundedReceiver<ProducerEvent>,
    JoinHandle<()>,
) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let producer = Producer::new(engine, registry, pipeline, event_tx);
    let task = tokio::spawn(producer.run(request_rx));
    (ProducerHandle::new(request_tx), event_rx, task)
}
