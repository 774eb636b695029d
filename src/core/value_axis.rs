use crate::error::{PipelineError, PipelineResult};

const UNIT_PREFIXES: [&str; 6] = ["", "K", "M", "G", "T", "E"];

/// Y-axis extent for a counter track.
///
/// The top of the axis is rounded up to a quarter of a power of ten
/// (7.5K, 10K, 12.5K, ...) so that small changes in the observed extremes
/// do not make the scale jump between rounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueAxis {
    y_max: f64,
    y_range: f64,
    unit_group: usize,
    bipolar: bool,
}

impl ValueAxis {
    pub fn from_extremes(minimum_value: f64, maximum_value: f64) -> PipelineResult<Self> {
        if !minimum_value.is_finite() || !maximum_value.is_finite() {
            return Err(PipelineError::InvalidData(
                "value axis extremes must be finite".to_owned(),
            ));
        }

        let max_value = maximum_value.max(0.0);
        let magnitude = minimum_value.abs().max(max_value);
        let exponent = magnitude.max(1.0).log10().ceil() as i32;
        let quarter = 10f64.powi(exponent) / 4.0;
        let y_max = (magnitude / quarter).ceil() * quarter;
        let bipolar = minimum_value < 0.0;
        let y_range = if bipolar { y_max * 2.0 } else { y_max };

        Ok(Self {
            y_max,
            y_range,
            unit_group: (exponent.max(0) / 3) as usize,
            bipolar,
        })
    }

    #[must_use]
    pub fn y_max(self) -> f64 {
        self.y_max
    }

    /// Total value range covered by the axis height.
    #[must_use]
    pub fn y_range(self) -> f64 {
        self.y_range
    }

    /// `true` when the axis is centered on zero to show negative values.
    #[must_use]
    pub fn is_bipolar(self) -> bool {
        self.bipolar
    }

    /// Pixel height of `value` inside an axis `height_px` tall, rounded.
    #[must_use]
    pub fn scaled_height(self, value: f64, height_px: f64) -> f64 {
        if self.y_range == 0.0 {
            return 0.0;
        }
        (value / self.y_range * height_px).round()
    }

    /// Formats `y_max` with a metric prefix, e.g. `2.5 GHz`.
    ///
    /// `prefix_offset` shifts the prefix for values stored in a scaled unit
    /// (kHz values use an offset of 1 with unit `Hz`).
    #[must_use]
    pub fn label(self, unit: &str, prefix_offset: usize) -> String {
        let mantissa = self.y_max / 10f64.powi((self.unit_group * 3) as i32);
        let prefix_index = (self.unit_group + prefix_offset).min(UNIT_PREFIXES.len() - 1);
        format!("{mantissa} {}{unit}", UNIT_PREFIXES[prefix_index])
    }
}
