use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

const NANOS_PER_SECOND: f64 = 1e9;

/// Closed time interval in seconds with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSpan")]
pub struct TimeSpan {
    start: f64,
    end: f64,
}

#[derive(Deserialize)]
struct RawTimeSpan {
    start: f64,
    end: f64,
}

impl TryFrom<RawTimeSpan> for TimeSpan {
    type Error = PipelineError;

    fn try_from(raw: RawTimeSpan) -> PipelineResult<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeSpan {
    pub fn new(start: f64, end: f64) -> PipelineResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(PipelineError::InvalidData(
                "time span bounds must be finite".to_owned(),
            ));
        }
        if end < start {
            return Err(PipelineError::InvalidData(format!(
                "time span end ({end}) must be >= start ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(self) -> f64 {
        self.start
    }

    #[must_use]
    pub fn end(self) -> f64 {
        self.end
    }

    #[must_use]
    pub fn duration(self) -> f64 {
        self.end - self.start
    }

    #[must_use]
    pub fn contains(self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    /// Returns `true` when `other` lies entirely inside this span.
    #[must_use]
    pub fn covers(self, other: TimeSpan) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Widens the span by its own duration on both sides.
    #[must_use]
    pub fn padded_by_duration(self) -> Self {
        let duration = self.duration();
        Self {
            start: self.start - duration,
            end: self.end + duration,
        }
    }

    #[must_use]
    pub fn intersection(self, other: TimeSpan) -> Option<TimeSpan> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Self { start, end })
    }
}

/// Converts seconds to whole nanoseconds, rounding to nearest. Saturates at
/// the `i64` bounds.
#[must_use]
pub fn seconds_to_ns(seconds: f64) -> i64 {
    (seconds * NANOS_PER_SECOND).round() as i64
}

#[must_use]
pub fn ns_to_seconds(ns: i64) -> f64 {
    ns as f64 / NANOS_PER_SECOND
}
