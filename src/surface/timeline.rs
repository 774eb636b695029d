use indexmap::IndexMap;
use smallvec::SmallVec;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::config::PipelineConfig;
use crate::core::{
    CounterSample, Gridlines, Resolution, TimeScale, TimeSpan, TrackDataBuffer, TrackId,
};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{BoundsRequest, ProducerEvent, ProducerRequest};

use super::{BoundsDebouncer, TrackDataCache};

/// Producer-side lifecycle of a track as seen by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    /// Add request sent, not yet acknowledged.
    Adding,
    Active,
    /// The producer refused to create a controller.
    Rejected,
    /// Remove request sent, teardown not yet acknowledged.
    Removing,
}

impl TrackStatus {
    fn accepts_requests(self) -> bool {
        matches!(self, Self::Adding | Self::Active)
    }
}

/// Surface state of one track.
#[derive(Debug, Clone)]
pub struct TrackView {
    kind: String,
    status: TrackStatus,
    cache: TrackDataCache,
    debouncer: BoundsDebouncer,
    // Request whose buffer came back truncated; the same request is not sent
    // again until the visible window or resolution changes.
    truncated_request: Option<BoundsRequest>,
    last_error: Option<PipelineError>,
}

impl TrackView {
    fn new(kind: String, config: &PipelineConfig) -> Self {
        Self {
            kind,
            status: TrackStatus::Adding,
            cache: TrackDataCache::new(),
            debouncer: BoundsDebouncer::new(config.debounce_delay()),
            truncated_request: None,
            last_error: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn status(&self) -> TrackStatus {
        self.status
    }

    #[must_use]
    pub fn cache(&self) -> &TrackDataCache {
        &self.cache
    }

    #[must_use]
    pub fn is_request_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Error of the most recent failed round or rejection, cleared by the
    /// next publish.
    #[must_use]
    pub fn last_error(&self) -> Option<&PipelineError> {
        self.last_error.as_ref()
    }
}

/// The consumer side of the pipeline: visible window, panel width and one
/// cache plus debouncer per track.
///
/// `Timeline` does no I/O. It turns coverage misses into [`BoundsRequest`]s
/// and folds [`ProducerEvent`]s back into its caches; a driver moves the
/// messages.
#[derive(Debug, Clone)]
pub struct Timeline {
    config: PipelineConfig,
    visible: TimeSpan,
    width_px: f64,
    tracks: IndexMap<TrackId, TrackView>,
}

impl Timeline {
    /// `width_px` is the whole panel, track shell included.
    pub fn new(visible: TimeSpan, width_px: f64, config: PipelineConfig) -> PipelineResult<Self> {
        let config = config.validate()?;
        let timeline = Self {
            config,
            visible,
            width_px,
            tracks: IndexMap::new(),
        };
        timeline.time_scale()?;
        Ok(timeline)
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn visible(&self) -> TimeSpan {
        self.visible
    }

    #[must_use]
    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    pub fn set_visible_window(&mut self, visible: TimeSpan) {
        self.visible = visible;
    }

    pub fn set_width(&mut self, width_px: f64) -> PipelineResult<()> {
        TimeScale::from_width(self.visible, width_px - self.config.track_shell_width_px)?;
        self.width_px = width_px;
        Ok(())
    }

    /// Scale mapping the visible window onto the data area right of the
    /// track shell.
    pub fn time_scale(&self) -> PipelineResult<TimeScale> {
        TimeScale::from_width(self.visible, self.width_px - self.config.track_shell_width_px)
    }

    /// Duration of one data-area pixel, rounded down to a power of ten.
    pub fn current_resolution(&self) -> PipelineResult<Resolution> {
        Resolution::from_seconds_per_px(self.time_scale()?.delta_px_to_duration(1.0)?)
    }

    pub fn gridlines(&self) -> PipelineResult<Gridlines> {
        Gridlines::new(
            self.width_px,
            self.visible,
            self.time_scale()?,
            self.config.gridlines(),
        )
    }

    pub fn track_ids(&self) -> impl Iterator<Item = &TrackId> {
        self.tracks.keys()
    }

    #[must_use]
    pub fn track(&self, track_id: &TrackId) -> Option<&TrackView> {
        self.tracks.get(track_id)
    }

    /// Registers the track locally and returns the request announcing it.
    ///
    /// An id still in [`TrackStatus::Removing`] is refused until its
    /// `TrackRemoved` arrives; the old controller may still publish.
    pub fn add_track(
        &mut self,
        track_id: TrackId,
        kind: impl Into<String>,
        config: serde_json::Value,
    ) -> PipelineResult<ProducerRequest> {
        if let Some(track) = self.tracks.get(&track_id) {
            let reason = match track.status {
                TrackStatus::Rejected => None,
                TrackStatus::Removing => {
                    Some("the previous track with this id is still being removed")
                }
                TrackStatus::Adding | TrackStatus::Active => {
                    Some("a track with this id already exists")
                }
            };
            if let Some(reason) = reason {
                return Err(PipelineError::InvalidTrackConfig {
                    track_id: track_id.to_string(),
                    reason: reason.to_owned(),
                });
            }
        }
        let kind = kind.into();
        self.tracks
            .insert(track_id.clone(), TrackView::new(kind.clone(), &self.config));
        Ok(ProducerRequest::AddTrack {
            track_id,
            kind,
            config,
        })
    }

    pub fn remove_track(&mut self, track_id: &TrackId) -> PipelineResult<ProducerRequest> {
        let track = self
            .tracks
            .get_mut(track_id)
            .ok_or_else(|| PipelineError::UnknownTrack(track_id.to_string()))?;
        track.status = TrackStatus::Removing;
        track.debouncer.cancel();
        Ok(ProducerRequest::RemoveTrack {
            track_id: track_id.clone(),
        })
    }

    /// Notes a miss on every track whose cache does not cover the visible
    /// window at the current resolution. Returns how many tracks newly
    /// scheduled a request.
    pub fn check_coverage(&mut self, now: Instant) -> PipelineResult<usize> {
        let resolution = self.current_resolution()?;
        let visible = self.visible;

        let mut scheduled = 0;
        for (track_id, track) in &mut self.tracks {
            if !track.status.accepts_requests() || track.cache.is_satisfied(visible, resolution) {
                continue;
            }
            if track.truncated_request.as_ref().is_some_and(|request| {
                *request == BoundsRequest::padded(track_id.clone(), visible, resolution)
            }) {
                trace!(%track_id, "window already served truncated");
                continue;
            }
            if track.debouncer.note_miss(now) {
                trace!(%track_id, %resolution, "coverage miss, request scheduled");
                scheduled += 1;
            } else {
                trace!(%track_id, "coverage miss coalesced");
            }
        }
        Ok(scheduled)
    }

    /// Takes every fire due at `now` and builds its request from the window
    /// visible right now.
    pub fn take_due_requests(&mut self, now: Instant) -> PipelineResult<Vec<BoundsRequest>> {
        if !self
            .tracks
            .values()
            .any(|track| track.debouncer.deadline().is_some_and(|deadline| deadline <= now))
        {
            return Ok(Vec::new());
        }

        let resolution = self.current_resolution()?;
        let visible = self.visible;
        let mut requests = Vec::new();
        for (track_id, track) in &mut self.tracks {
            if !track.debouncer.take_if_due(now) || !track.status.accepts_requests() {
                continue;
            }
            if track.cache.is_satisfied(visible, resolution) {
                trace!(%track_id, "covered before the request fired");
                continue;
            }
            requests.push(BoundsRequest::padded(track_id.clone(), visible, resolution));
        }
        Ok(requests)
    }

    /// Earliest pending debounce deadline across tracks.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tracks
            .values()
            .filter_map(|track| track.debouncer.deadline())
            .min()
    }

    /// Folds one producer event into the track state. Returns `true` when
    /// the track's drawing may have changed.
    pub fn apply_event(&mut self, event: ProducerEvent) -> bool {
        let track_id = event.track_id().clone();
        let Some(track) = self.tracks.get_mut(&track_id) else {
            trace!(%track_id, "event for unknown track ignored");
            return false;
        };

        match event {
            ProducerEvent::TrackAdded { .. } => {
                if track.status == TrackStatus::Adding {
                    track.status = TrackStatus::Active;
                }
                false
            }
            ProducerEvent::TrackRejected { error, .. } => {
                if track.status != TrackStatus::Adding {
                    return false;
                }
                warn!(%track_id, %error, "track rejected by producer");
                track.status = TrackStatus::Rejected;
                track.debouncer.cancel();
                track.last_error = Some(error);
                true
            }
            ProducerEvent::Published {
                request, buffer, ..
            } => {
                if track.status == TrackStatus::Removing {
                    return false;
                }
                track.truncated_request = buffer.is_truncated().then_some(request);
                track.last_error = None;
                track.cache.replace(buffer);
                true
            }
            ProducerEvent::RoundFailed { error, .. } => {
                if track.status == TrackStatus::Removing {
                    return false;
                }
                debug!(%track_id, %error, "round failed, holding previous buffer");
                track.last_error = Some(error);
                true
            }
            ProducerEvent::TrackRemoved { .. } => {
                if track.status == TrackStatus::Removing {
                    self.tracks.shift_remove(&track_id);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Uncovered parts of the visible window for `track_id`.
    pub fn loading_regions(&self, track_id: &TrackId) -> PipelineResult<SmallVec<[TimeSpan; 2]>> {
        let track = self
            .tracks
            .get(track_id)
            .ok_or_else(|| PipelineError::UnknownTrack(track_id.to_string()))?;
        Ok(track.cache.loading_regions(self.visible))
    }

    /// Counter sample under panel x coordinate `x_px`, for tracks holding a
    /// counter buffer.
    pub fn hover_sample(&self, track_id: &TrackId, x_px: f64) -> PipelineResult<Option<CounterSample>> {
        let track = self
            .tracks
            .get(track_id)
            .ok_or_else(|| PipelineError::UnknownTrack(track_id.to_string()))?;
        let Some(TrackDataBuffer::Counter(counter)) = track.cache.buffer().map(|buffer| &**buffer)
        else {
            return Ok(None);
        };
        let time = self
            .time_scale()?
            .px_to_time(x_px - self.config.track_shell_width_px)?;
        Ok(counter.sample_at(time))
    }
}
