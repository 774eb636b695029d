use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

const STEP_SIZE_MULTIPLIERS: [f64; 3] = [2.0, 5.0, 10.0];

/// Returns the gridline step size for `range` split into about
/// `desired_steps` steps.
///
/// The result is 1, 2 or 5 times a power of ten, chosen so that
/// `range / step` is as close as possible to `desired_steps`. On ties the
/// smaller candidate wins.
pub fn choose_step_size(range: f64, desired_steps: f64) -> PipelineResult<f64> {
    if !range.is_finite() || range <= 0.0 {
        return Err(PipelineError::DegenerateInput(format!(
            "step size range must be finite and > 0, got {range}"
        )));
    }
    if !desired_steps.is_finite() || desired_steps <= 0.0 {
        return Err(PipelineError::DegenerateInput(format!(
            "desired step count must be finite and > 0, got {desired_steps}"
        )));
    }

    let desired_step_size = range / desired_steps;
    let initial_step_size = 10f64.powi(floor_log10(desired_step_size)?);
    let distance_to_desired = |step_size: f64| (range / step_size - desired_steps).abs();

    let mut minimal_distance = distance_to_desired(initial_step_size);
    let mut minimizing_step_size = initial_step_size;
    for multiplier in STEP_SIZE_MULTIPLIERS {
        let step_size = multiplier * initial_step_size;
        let distance = distance_to_desired(step_size);
        if distance < minimal_distance {
            minimal_distance = distance;
            minimizing_step_size = step_size;
        }
    }
    Ok(minimizing_step_size)
}

/// Largest `k` with `10^k <= value`.
fn floor_log10(value: f64) -> PipelineResult<i32> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PipelineError::DegenerateInput(format!(
            "cannot take log10 of {value}"
        )));
    }
    let mut exponent = value.log10().floor() as i32;
    // log10 can land one ulp off on exact powers of ten.
    if 10f64.powi(exponent) > value {
        exponent -= 1;
    } else if 10f64.powi(exponent + 1) <= value {
        exponent += 1;
    }
    Ok(exponent)
}

/// Sampling resolution in seconds per pixel, always an exact power of ten.
///
/// Only the decimal exponent is stored, so two resolutions derived from
/// slightly different pixel densities compare equal whenever they round down
/// to the same power of ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct Resolution {
    exponent: i32,
}

impl Resolution {
    #[must_use]
    pub const fn from_exponent(exponent: i32) -> Self {
        Self { exponent }
    }

    /// Rounds a pixel density down to the nearest power of ten.
    pub fn from_seconds_per_px(seconds_per_px: f64) -> PipelineResult<Self> {
        if !seconds_per_px.is_finite() || seconds_per_px <= 0.0 {
            return Err(PipelineError::DegenerateInput(format!(
                "seconds per pixel must be finite and > 0, got {seconds_per_px}"
            )));
        }
        Ok(Self {
            exponent: floor_log10(seconds_per_px)?,
        })
    }

    #[must_use]
    pub const fn exponent(self) -> i32 {
        self.exponent
    }

    #[must_use]
    pub fn seconds_per_px(self) -> f64 {
        10f64.powi(self.exponent)
    }

    /// `true` when one pixel spans at least `10^threshold_exponent` seconds.
    #[must_use]
    pub const fn is_at_least(self, threshold_exponent: i32) -> bool {
        self.exponent >= threshold_exponent
    }
}

impl From<Resolution> for f64 {
    fn from(resolution: Resolution) -> Self {
        resolution.seconds_per_px()
    }
}

impl TryFrom<f64> for Resolution {
    type Error = PipelineError;

    fn try_from(seconds_per_px: f64) -> PipelineResult<Self> {
        let resolution = Self::from_seconds_per_px(seconds_per_px)?;
        let rounded = resolution.seconds_per_px();
        if (rounded - seconds_per_px).abs() > seconds_per_px * 1e-9 {
            return Err(PipelineError::InvalidData(format!(
                "resolution {seconds_per_px} s/px is not a power of ten"
            )));
        }
        Ok(resolution)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1e{} s/px", self.exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::{Resolution, floor_log10};

    #[test]
    fn floor_log10_is_exact_on_powers_of_ten() {
        for exponent in -12..=12 {
            let value = 10f64.powi(exponent);
            assert_eq!(floor_log10(value).expect("positive"), exponent);
        }
    }

    #[test]
    fn floor_log10_rejects_zero() {
        let err = floor_log10(0.0).expect_err("zero must fail");
        assert!(format!("{err}").contains("log10"));
    }

    #[test]
    fn resolution_rejects_values_that_are_not_powers_of_ten() {
        let err = Resolution::try_from(0.003).expect_err("0.003 is not a power of ten");
        assert!(format!("{err}").contains("not a power of ten"));
        assert_eq!(
            Resolution::try_from(0.001).expect("power of ten"),
            Resolution::from_exponent(-3)
        );
    }
}
