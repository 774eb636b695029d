use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use crate::core::{TimeScale, TimeSpan, choose_step_size};
use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_DESIRED_PX_PER_STEP: f64 = 80.0;
pub const DEFAULT_TRACK_SHELL_WIDTH_PX: f64 = 250.0;

/// Tuning controls for axis gridline placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridlineConfig {
    pub desired_px_per_step: f64,
    /// Width of the track header column left of the time axis.
    pub track_shell_width_px: f64,
}

impl Default for GridlineConfig {
    fn default() -> Self {
        Self {
            desired_px_per_step: DEFAULT_DESIRED_PX_PER_STEP,
            track_shell_width_px: DEFAULT_TRACK_SHELL_WIDTH_PX,
        }
    }
}

impl GridlineConfig {
    pub(crate) fn validate(self) -> PipelineResult<Self> {
        if !self.desired_px_per_step.is_finite() || self.desired_px_per_step <= 0.0 {
            return Err(PipelineError::InvalidConfig(
                "desired px per step must be finite and > 0".to_owned(),
            ));
        }
        if !self.track_shell_width_px.is_finite() || self.track_shell_width_px < 0.0 {
            return Err(PipelineError::InvalidConfig(
                "track shell width must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Lazy sequence of `(x_px, time)` gridline positions.
///
/// Positions are offset by the track shell width and clipped to
/// `[shell_width, panel_width]`. The iterator is finite and `Clone`, so a
/// caller can restart it from a saved copy.
#[derive(Debug, Clone)]
pub struct Gridlines {
    scale: TimeScale,
    panel_width_px: f64,
    shell_width_px: f64,
    step: f64,
    first: f64,
    end: f64,
    index: u64,
    done: bool,
}

impl Gridlines {
    pub fn new(
        panel_width_px: f64,
        span: TimeSpan,
        scale: TimeScale,
        config: GridlineConfig,
    ) -> PipelineResult<Self> {
        let config = config.validate()?;
        if !panel_width_px.is_finite() || panel_width_px <= 0.0 {
            return Err(PipelineError::DegenerateInput(format!(
                "gridline panel width must be finite and > 0, got {panel_width_px}"
            )));
        }

        let desired_steps = panel_width_px / config.desired_px_per_step;
        let step = choose_step_size(span.duration(), desired_steps)?;
        let first = (span.start() / step).round() * step;

        Ok(Self {
            scale,
            panel_width_px,
            shell_width_px: config.track_shell_width_px,
            step,
            first,
            end: span.end(),
            index: 0,
            done: false,
        })
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }
}

impl Iterator for Gridlines {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let time = self.first + self.index as f64 * self.step;
            if time >= self.end {
                self.done = true;
                break;
            }
            self.index += 1;

            let Ok(px) = self.scale.time_to_px(time) else {
                self.done = true;
                break;
            };
            let x = self.shell_width_px + px.floor();
            if x < self.shell_width_px {
                continue;
            }
            if x > self.panel_width_px {
                self.done = true;
                break;
            }
            return Some((x, time));
        }
        None
    }
}

impl FusedIterator for Gridlines {}
