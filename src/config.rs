use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::GridlineConfig;
use crate::core::gridlines::{DEFAULT_DESIRED_PX_PER_STEP, DEFAULT_TRACK_SHELL_WIDTH_PX};
use crate::error::{PipelineError, PipelineResult};

/// Pipeline-wide tuning shared by the surface and the producer.
///
/// This type is serializable so host applications can persist/load pipeline
/// setup without inventing their own ad-hoc format. Every field falls back to
/// its default when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Delay between the first coverage miss and the bounds request it causes.
    pub debounce_delay_ms: u64,
    pub desired_px_per_step: f64,
    pub track_shell_width_px: f64,
    /// Row cap of the raw slice query.
    pub raw_row_limit: usize,
    /// Resolutions of at least `10^quantize_threshold_exponent` s/px use
    /// per-bucket summaries instead of raw slices.
    pub quantize_threshold_exponent: i32,
    pub pixels_per_bucket: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce_delay_ms: 50,
            desired_px_per_step: DEFAULT_DESIRED_PX_PER_STEP,
            track_shell_width_px: DEFAULT_TRACK_SHELL_WIDTH_PX,
            raw_row_limit: 10_000,
            quantize_threshold_exponent: -3,
            pixels_per_bucket: 10,
        }
    }
}

impl PipelineConfig {
    pub fn validate(self) -> PipelineResult<Self> {
        if self.debounce_delay_ms == 0 {
            return Err(PipelineError::InvalidConfig(
                "debounce delay must be > 0 ms".to_owned(),
            ));
        }
        if self.raw_row_limit == 0 {
            return Err(PipelineError::InvalidConfig(
                "raw row limit must be > 0".to_owned(),
            ));
        }
        if self.pixels_per_bucket == 0 {
            return Err(PipelineError::InvalidConfig(
                "pixels per bucket must be > 0".to_owned(),
            ));
        }
        self.gridlines().validate()?;
        Ok(self)
    }

    pub fn from_json_str(input: &str) -> PipelineResult<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| {
            PipelineError::InvalidConfig(format!("failed to parse pipeline config json: {e}"))
        })?;
        config.validate()
    }

    #[must_use]
    pub fn debounce_delay(self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    #[must_use]
    pub fn gridlines(self) -> GridlineConfig {
        GridlineConfig {
            desired_px_per_step: self.desired_px_per_step,
            track_shell_width_px: self.track_shell_width_px,
        }
    }
}
