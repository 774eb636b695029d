use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, trace, warn};

use crate::config::PipelineConfig;
use crate::controller::{TrackController, TrackControllerArgs, TrackControllerRegistry};
use crate::core::TrackId;
use crate::engine::QueryEngine;
use crate::error::PipelineError;

use super::{BoundsRequest, ProducerEvent, ProducerRequest};

type SharedController = Arc<Mutex<Box<dyn TrackController>>>;

/// What the producer did with one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Track bookkeeping changed (added, or removal scheduled).
    Accepted,
    /// A query round was spawned.
    Started,
    /// The track already had a round in flight; the request was discarded.
    DroppedBusy,
    /// The request named an unknown track or could not be honoured.
    Rejected,
    /// Shutdown was requested.
    Stopped,
}

/// Owns the track controllers and runs their query rounds.
///
/// Each controller sits behind its own async mutex. A bounds change takes the
/// lock without waiting: if a round is already running for that track the
/// change is dropped, so every track has at most one round in flight while
/// rounds of different tracks proceed concurrently.
pub struct Producer {
    engine: Arc<dyn QueryEngine>,
    registry: TrackControllerRegistry,
    pipeline: PipelineConfig,
    tracks: IndexMap<TrackId, SharedController>,
    rounds: JoinSet<()>,
    events: mpsc::UnboundedSender<ProducerEvent>,
    next_instance: u64,
}

impl Producer {
    #[must_use]
    pub fn new(
        engine: Arc<dyn QueryEngine>,
        registry: TrackControllerRegistry,
        pipeline: PipelineConfig,
        events: mpsc::UnboundedSender<ProducerEvent>,
    ) -> Self {
        Self {
            engine,
            registry,
            pipeline,
            tracks: IndexMap::new(),
            rounds: JoinSet::new(),
            events,
            next_instance: 0,
        }
    }

    pub fn track_ids(&self) -> impl Iterator<Item = &TrackId> {
        self.tracks.keys()
    }

    #[must_use]
    pub fn contains_track(&self, track_id: &TrackId) -> bool {
        self.tracks.contains_key(track_id)
    }

    /// Rounds and teardowns spawned but not yet reaped.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.rounds.len()
    }

    pub fn handle(&mut self, request: ProducerRequest) -> Dispatch {
        match request {
            ProducerRequest::AddTrack {
                track_id,
                kind,
                config,
            } => self.add_track(track_id, kind, config),
            ProducerRequest::RemoveTrack { track_id } => self.remove_track(track_id),
            ProducerRequest::BoundsChange(request) => self.bounds_change(request),
            ProducerRequest::Shutdown => Dispatch::Stopped,
        }
    }

    /// Serves requests until `Shutdown` or until every sender is gone, then
    /// waits for the rounds still in flight.
    pub async fn run(mut self, mut requests: mpsc::UnboundedReceiver<ProducerRequest>) {
        loop {
            tokio::select! {
                request = requests.recv() => {
                    let Some(request) = request else {
                        break;
                    };
                    if self.handle(request) == Dispatch::Stopped {
                        break;
                    }
                }
                Some(joined) = self.rounds.join_next(), if !self.rounds.is_empty() => {
                    reap(joined);
                }
            }
        }
        debug!(in_flight = self.rounds.len(), "producer stopping");
        self.drain().await;
    }

    /// Waits for every spawned round and teardown to finish.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.rounds.join_next().await {
            reap(joined);
        }
    }

    fn add_track(&mut self, track_id: TrackId, kind: String, config: serde_json::Value) -> Dispatch {
        if self.tracks.contains_key(&track_id) {
            let error = PipelineError::InvalidTrackConfig {
                track_id: track_id.to_string(),
                reason: "a track with this id already exists".to_owned(),
            };
            warn!(%track_id, %error, "rejecting track");
            self.emit(ProducerEvent::TrackRejected { track_id, error });
            return Dispatch::Rejected;
        }

        let instance = self.next_instance;
        self.next_instance += 1;
        let args = TrackControllerArgs {
            track_id: track_id.clone(),
            instance,
            engine: Arc::clone(&self.engine),
            config,
            pipeline: self.pipeline,
        };

        match self.registry.create(&kind, args) {
            Ok(controller) => {
                debug!(%track_id, %kind, instance, "track added");
                self.tracks
                    .insert(track_id.clone(), Arc::new(Mutex::new(controller)));
                self.emit(ProducerEvent::TrackAdded { track_id, kind });
                Dispatch::Accepted
            }
            Err(error) => {
                warn!(%track_id, %kind, %error, "rejecting track");
                self.emit(ProducerEvent::TrackRejected { track_id, error });
                Dispatch::Rejected
            }
        }
    }

    fn remove_track(&mut self, track_id: TrackId) -> Dispatch {
        let Some(controller) = self.tracks.shift_remove(&track_id) else {
            warn!(%track_id, "remove requested for unknown track");
            return Dispatch::Rejected;
        };
        let events = self.events.clone();
        self.rounds.spawn(async move {
            // Waits for the round in flight, if any.
            let mut controller = controller.lock_owned().await;
            if let Err(error) = controller.on_destroy().await {
                error!(%track_id, %error, "failed to drop derived views");
            }
            drop(controller);
            debug!(%track_id, "track removed");
            send(&events, ProducerEvent::TrackRemoved { track_id });
        });
        Dispatch::Accepted
    }

    fn bounds_change(&mut self, request: BoundsRequest) -> Dispatch {
        let Some(controller) = self.tracks.get(&request.track_id) else {
            warn!(track_id = %request.track_id, "bounds change for unknown track");
            return Dispatch::Rejected;
        };
        let Ok(guard) = Arc::clone(controller).try_lock_owned() else {
            trace!(track_id = %request.track_id, "round in flight, dropping bounds change");
            return Dispatch::DroppedBusy;
        };
        trace!(
            track_id = %request.track_id,
            start = request.start,
            end = request.end,
            resolution = %request.resolution,
            "starting round"
        );
        self.rounds
            .spawn(run_round(guard, request, self.events.clone()));
        Dispatch::Started
    }

    fn emit(&self, event: ProducerEvent) {
        send(&self.events, event);
    }
}

async fn run_round(
    mut controller: OwnedMutexGuard<Box<dyn TrackController>>,
    request: BoundsRequest,
    events: mpsc::UnboundedSender<ProducerEvent>,
) {
    let outcome = controller
        .on_bounds_change(request.start, request.end, request.resolution)
        .await
        .and_then(|buffer| buffer.validate().map(|()| buffer));

    let track_id = request.track_id.clone();
    let event = match outcome {
        Ok(buffer) => {
            debug!(
                %track_id,
                kind = ?buffer.kind(),
                start = buffer.start(),
                end = buffer.end(),
                truncated = buffer.is_truncated(),
                "publishing buffer"
            );
            ProducerEvent::Published {
                track_id,
                request,
                buffer: Arc::new(buffer),
            }
        }
        Err(error) => {
            error!(%track_id, %error, "query round failed");
            ProducerEvent::RoundFailed {
                track_id,
                request,
                error,
            }
        }
    };
    // Sent under the lock so a pending teardown reports `TrackRemoved` after
    // this round's event.
    send(&events, event);
    drop(controller);
}

fn send(events: &mpsc::UnboundedSender<ProducerEvent>, event: ProducerEvent) {
    if events.send(event).is_err() {
        trace!("event receiver closed, dropping producer event");
    }
}

fn reap(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        error!(error = %err, "producer task did not complete");
    }
}
