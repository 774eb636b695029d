use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::trace;

use crate::core::TrackId;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{ProducerEvent, ProducerHandle};

use super::Timeline;

/// Connects a [`Timeline`] to a running producer.
///
/// `frame` is the synchronous per-render hook; `step` waits for whichever
/// comes first, a producer event or a debounce deadline.
pub struct SurfaceDriver {
    timeline: Timeline,
    producer: ProducerHandle,
    events: mpsc::UnboundedReceiver<ProducerEvent>,
}

impl SurfaceDriver {
    #[must_use]
    pub fn new(
        timeline: Timeline,
        producer: ProducerHandle,
        events: mpsc::UnboundedReceiver<ProducerEvent>,
    ) -> Self {
        Self {
            timeline,
            producer,
            events,
        }
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    #[must_use]
    pub fn producer(&self) -> &ProducerHandle {
        &self.producer
    }

    pub fn add_track(
        &mut self,
        track_id: impl Into<TrackId>,
        kind: impl Into<String>,
        config: serde_json::Value,
    ) -> PipelineResult<()> {
        let request = self.timeline.add_track(track_id.into(), kind, config)?;
        self.producer.send(request)
    }

    pub fn remove_track(&mut self, track_id: &TrackId) -> PipelineResult<()> {
        let request = self.timeline.remove_track(track_id)?;
        self.producer.send(request)
    }

    /// Checks coverage and sends every request now due. Returns how many
    /// requests were sent.
    pub fn frame(&mut self) -> PipelineResult<usize> {
        let now = Instant::now();
        self.timeline.check_coverage(now)?;
        let due = self.timeline.take_due_requests(now)?;
        let sent = due.len();
        for request in due {
            trace!(
                track_id = %request.track_id,
                start = request.start,
                end = request.end,
                "sending bounds request"
            );
            self.producer.request_bounds(request)?;
        }
        Ok(sent)
    }

    /// Waits for the next producer event or debounce deadline, applies it
    /// and runs a frame. Returns the applied event, or `None` when a
    /// deadline woke the driver.
    pub async fn step(&mut self) -> PipelineResult<Option<ProducerEvent>> {
        let deadline = self.timeline.next_deadline();
        let event = tokio::select! {
            event = self.events.recv() => Some(event.ok_or(PipelineError::ChannelClosed)?),
            () = wait_until(deadline) => None,
        };

        if let Some(event) = &event {
            self.timeline.apply_event(event.clone());
        }
        self.frame()?;
        Ok(event)
    }

    /// Takes every event already queued without waiting.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.timeline.apply_event(event);
            applied += 1;
        }
        applied
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
