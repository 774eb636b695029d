use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum PipelineError {
    #[error("invalid configuration for track `{track_id}`: {reason}")]
    InvalidTrackConfig { track_id: String, reason: String },

    #[error("unknown track kind `{0}`")]
    UnknownTrackKind(String),

    #[error("track kind `{0}` is already registered")]
    DuplicateTrackKind(String),

    #[error("unknown track `{0}`")]
    UnknownTrack(String),

    #[error("query error \"{query}\": {message}")]
    Query { query: String, message: String },

    #[error("unexpected query result shape: {0}")]
    QueryShape(String),

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid pipeline config: {0}")]
    InvalidConfig(String),

    #[error("producer channel closed")]
    ChannelClosed,
}
