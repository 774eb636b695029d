use serde::{Deserialize, Serialize};

use crate::core::TrackId;
use crate::error::{PipelineError, PipelineResult};

/// Configuration shared by the per-CPU track kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuTrackConfig {
    pub cpu: u32,
    #[serde(default, alias = "minimumValue")]
    pub minimum_value: Option<f64>,
    #[serde(default, alias = "maximumValue")]
    pub maximum_value: Option<f64>,
}

impl CpuTrackConfig {
    /// Parses the opaque per-track configuration record.
    pub fn from_value(track_id: &TrackId, value: &serde_json::Value) -> PipelineResult<Self> {
        let config: Self =
            serde_json::from_value(value.clone()).map_err(|e| PipelineError::InvalidTrackConfig {
                track_id: track_id.to_string(),
                reason: e.to_string(),
            })?;

        let non_finite = |bound: Option<f64>| bound.is_some_and(|value| !value.is_finite());
        if non_finite(config.minimum_value) || non_finite(config.maximum_value) {
            return Err(PipelineError::InvalidTrackConfig {
                track_id: track_id.to_string(),
                reason: "configured extremes must be finite".to_owned(),
            });
        }
        Ok(config)
    }
}
