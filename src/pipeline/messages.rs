use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{Resolution, TimeSpan, TrackDataBuffer, TrackId};
use crate::error::PipelineError;

/// A track's request for data covering `[start, end]` at `resolution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsRequest {
    pub track_id: TrackId,
    pub start: f64,
    pub end: f64,
    pub resolution: Resolution,
}

impl BoundsRequest {
    /// Request for the visible window padded by its own duration on each
    /// side, so small pans stay inside the fetched range.
    #[must_use]
    pub fn padded(track_id: TrackId, visible: TimeSpan, resolution: Resolution) -> Self {
        let padded = visible.padded_by_duration();
        Self {
            track_id,
            start: padded.start(),
            end: padded.end(),
            resolution,
        }
    }
}

/// Surface-to-producer message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProducerRequest {
    AddTrack {
        track_id: TrackId,
        kind: String,
        config: serde_json::Value,
    },
    RemoveTrack {
        track_id: TrackId,
    },
    BoundsChange(BoundsRequest),
    Shutdown,
}

/// Producer-to-surface message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProducerEvent {
    TrackAdded {
        track_id: TrackId,
        kind: String,
    },
    TrackRejected {
        track_id: TrackId,
        error: PipelineError,
    },
    /// `request` is the bounds change the round served; the buffer may end
    /// before `request.end` when truncated.
    Published {
        track_id: TrackId,
        request: BoundsRequest,
        buffer: Arc<TrackDataBuffer>,
    },
    RoundFailed {
        track_id: TrackId,
        request: BoundsRequest,
        error: PipelineError,
    },
    TrackRemoved {
        track_id: TrackId,
    },
}

impl ProducerEvent {
    #[must_use]
    pub fn track_id(&self) -> &TrackId {
        match self {
            Self::TrackAdded { track_id, .. }
            | Self::TrackRejected { track_id, .. }
            | Self::Published { track_id, .. }
            | Self::RoundFailed { track_id, .. }
            | Self::TrackRemoved { track_id } => track_id,
        }
    }
}
