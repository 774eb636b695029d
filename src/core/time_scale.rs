use crate::core::{LinearScale, TimeSpan};
use crate::error::{PipelineError, PipelineResult};

/// Maps a time span onto a pixel interval and back.
///
/// A zero-duration span or a zero-width pixel range is rejected at
/// construction, so every mapping method divides by a non-zero extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    span: TimeSpan,
    linear: LinearScale,
}

impl TimeScale {
    pub fn new(span: TimeSpan, px_range: (f64, f64)) -> PipelineResult<Self> {
        if span.duration() <= 0.0 {
            return Err(PipelineError::DegenerateInput(
                "time scale span must have non-zero duration".to_owned(),
            ));
        }
        let linear = LinearScale::new((span.start(), span.end()), px_range)?;
        Ok(Self { span, linear })
    }

    /// Maps `span` onto `[0, width_px]`.
    pub fn from_width(span: TimeSpan, width_px: f64) -> PipelineResult<Self> {
        if !width_px.is_finite() || width_px <= 0.0 {
            return Err(PipelineError::DegenerateInput(format!(
                "time scale width must be finite and > 0, got {width_px}"
            )));
        }
        Self::new(span, (0.0, width_px))
    }

    #[must_use]
    pub fn span(self) -> TimeSpan {
        self.span
    }

    #[must_use]
    pub fn px_range(self) -> (f64, f64) {
        self.linear.range()
    }

    #[must_use]
    pub fn width_px(self) -> f64 {
        let (start, end) = self.linear.range();
        (end - start).abs()
    }

    pub fn time_to_px(self, time: f64) -> PipelineResult<f64> {
        self.linear.domain_to_pixel(time)
    }

    pub fn px_to_time(self, px: f64) -> PipelineResult<f64> {
        self.linear.pixel_to_domain(px)
    }

    pub fn delta_time_to_px(self, delta_time: f64) -> PipelineResult<f64> {
        self.linear.domain_delta_to_pixels(delta_time)
    }

    pub fn delta_px_to_duration(self, delta_px: f64) -> PipelineResult<f64> {
        self.linear.pixel_delta_to_domain(delta_px)
    }
}
