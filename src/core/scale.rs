use crate::error::{PipelineError, PipelineResult};

/// Affine map between a value domain and a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
    range_start: f64,
    range_end: f64,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> PipelineResult<Self> {
        let (domain_start, domain_end) = domain;
        let (range_start, range_end) = range;
        if !domain_start.is_finite()
            || !domain_end.is_finite()
            || !range_start.is_finite()
            || !range_end.is_finite()
        {
            return Err(PipelineError::InvalidData(
                "scale domain and range must be finite".to_owned(),
            ));
        }
        if domain_start == domain_end {
            return Err(PipelineError::DegenerateInput(
                "scale domain must have non-zero extent".to_owned(),
            ));
        }
        if range_start == range_end {
            return Err(PipelineError::DegenerateInput(
                "scale range must have non-zero extent".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
            range_start,
            range_end,
        })
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    pub fn domain_to_pixel(self, value: f64) -> PipelineResult<f64> {
        if !value.is_finite() {
            return Err(PipelineError::InvalidData("value must be finite".to_owned()));
        }

        let normalized = (value - self.domain_start) / self.domain_span();
        Ok(self.range_start + normalized * self.range_span())
    }

    pub fn pixel_to_domain(self, pixel: f64) -> PipelineResult<f64> {
        if !pixel.is_finite() {
            return Err(PipelineError::InvalidData("pixel must be finite".to_owned()));
        }

        let normalized = (pixel - self.range_start) / self.range_span();
        Ok(self.domain_start + normalized * self.domain_span())
    }

    pub fn domain_delta_to_pixels(self, delta: f64) -> PipelineResult<f64> {
        if !delta.is_finite() {
            return Err(PipelineError::InvalidData(
                "domain delta must be finite".to_owned(),
            ));
        }
        Ok(delta * self.range_span() / self.domain_span())
    }

    pub fn pixel_delta_to_domain(self, delta_px: f64) -> PipelineResult<f64> {
        if !delta_px.is_finite() {
            return Err(PipelineError::InvalidData(
                "pixel delta must be finite".to_owned(),
            ));
        }
        Ok(delta_px * self.domain_span() / self.range_span())
    }

    fn domain_span(self) -> f64 {
        self.domain_end - self.domain_start
    }

    fn range_span(self) -> f64 {
        self.range_end - self.range_start
    }
}
