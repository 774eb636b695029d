use serde::{Deserialize, Serialize};

use crate::core::{Resolution, TimeSpan, ValueAxis, search_last_at_or_before};
use crate::error::{PipelineError, PipelineResult};

/// Idle value reported by the cpuidle counter while the CPU is running.
pub const CPU_IDLE_NONE: f64 = 4_294_967_295.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferKind {
    Slice,
    Summary,
    Counter,
}

/// Per-event scheduling slices plus the auxiliary frequency series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceBuffer {
    pub start: f64,
    pub end: f64,
    pub resolution: Resolution,
    pub starts: Vec<f64>,
    pub ends: Vec<f64>,
    pub utids: Vec<u32>,
    pub freq_starts: Vec<f64>,
    pub freqs: Vec<f64>,
    /// Set when the slice query hit its row cap and `end` was pulled back
    /// to the last returned slice.
    #[serde(default)]
    pub truncated: bool,
}

impl SliceBuffer {
    #[must_use]
    pub fn with_capacity(
        start: f64,
        end: f64,
        resolution: Resolution,
        slice_rows: usize,
        freq_rows: usize,
    ) -> Self {
        Self {
            start,
            end,
            resolution,
            starts: Vec::with_capacity(slice_rows),
            ends: Vec::with_capacity(slice_rows),
            utids: Vec::with_capacity(slice_rows),
            freq_starts: Vec::with_capacity(freq_rows),
            freqs: Vec::with_capacity(freq_rows),
            truncated: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Pulls `end` back to the last slice's end when exactly `row_cap` slices
    /// were returned. Returns whether truncation happened.
    pub fn truncate_to_row_cap(&mut self, row_cap: usize) -> bool {
        if row_cap == 0 || self.starts.len() != row_cap {
            return false;
        }
        if let Some(&last_end) = self.ends.last() {
            self.end = last_end.max(self.start);
            self.truncated = true;
        }
        self.truncated
    }

    fn validate(&self) -> PipelineResult<()> {
        let slices = self.starts.len();
        if self.ends.len() != slices || self.utids.len() != slices {
            return Err(PipelineError::InvalidData(format!(
                "slice columns differ in length: starts={slices}, ends={}, utids={}",
                self.ends.len(),
                self.utids.len()
            )));
        }
        if self.freq_starts.len() != self.freqs.len() {
            return Err(PipelineError::InvalidData(format!(
                "frequency columns differ in length: starts={}, values={}",
                self.freq_starts.len(),
                self.freqs.len()
            )));
        }
        Ok(())
    }
}

/// Fixed-size per-bucket aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBuffer {
    pub start: f64,
    pub end: f64,
    pub resolution: Resolution,
    pub bucket_size_seconds: f64,
    pub utilizations: Vec<f64>,
    pub freqs: Vec<f64>,
    pub idles: Vec<f64>,
}

impl SummaryBuffer {
    /// Creates a summary whose arrays all hold `num_buckets` zeros.
    #[must_use]
    pub fn zeroed(
        start: f64,
        end: f64,
        resolution: Resolution,
        bucket_size_seconds: f64,
        num_buckets: usize,
    ) -> Self {
        Self {
            start,
            end,
            resolution,
            bucket_size_seconds,
            utilizations: vec![0.0; num_buckets],
            freqs: vec![0.0; num_buckets],
            idles: vec![0.0; num_buckets],
        }
    }

    #[must_use]
    pub fn num_buckets(&self) -> usize {
        self.utilizations.len()
    }

    #[must_use]
    pub fn bucket_start(&self, bucket: usize) -> f64 {
        self.start + bucket as f64 * self.bucket_size_seconds
    }

    fn validate(&self) -> PipelineResult<()> {
        let buckets = self.utilizations.len();
        if self.freqs.len() != buckets || self.idles.len() != buckets {
            return Err(PipelineError::InvalidData(format!(
                "summary columns differ in length: utilizations={buckets}, freqs={}, idles={}",
                self.freqs.len(),
                self.idles.len()
            )));
        }
        if !self.bucket_size_seconds.is_finite() || self.bucket_size_seconds <= 0.0 {
            return Err(PipelineError::InvalidData(
                "summary bucket size must be finite and > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

/// CPU frequency counter samples with their axis extremes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterBuffer {
    pub start: f64,
    pub end: f64,
    pub resolution: Resolution,
    pub maximum_value: f64,
    pub minimum_value: f64,
    pub ts_starts: Vec<f64>,
    pub ts_ends: Vec<f64>,
    pub freq_khz: Vec<u32>,
    pub idle_values: Vec<f64>,
    pub idles: Vec<bool>,
}

/// One counter sample located by [`CounterBuffer::sample_at`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterSample {
    pub start: f64,
    pub end: f64,
    pub freq_khz: u32,
    pub idle_value: f64,
    pub idle: bool,
}

impl CounterSample {
    /// The idle state value, or `None` while the CPU is running.
    #[must_use]
    pub fn idle_state(self) -> Option<f64> {
        (self.idle_value != CPU_IDLE_NONE).then_some(self.idle_value)
    }
}

impl CounterBuffer {
    #[must_use]
    pub fn len(&self) -> usize {
        self.ts_starts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ts_starts.is_empty()
    }

    /// Sample whose start is the last one at or before `time`.
    #[must_use]
    pub fn sample_at(&self, time: f64) -> Option<CounterSample> {
        let index = search_last_at_or_before(&self.ts_starts, time)?;
        Some(CounterSample {
            start: self.ts_starts[index],
            end: *self.ts_ends.get(index)?,
            freq_khz: *self.freq_khz.get(index)?,
            idle_value: *self.idle_values.get(index)?,
            idle: *self.idles.get(index)?,
        })
    }

    pub fn value_axis(&self) -> PipelineResult<ValueAxis> {
        ValueAxis::from_extremes(self.minimum_value, self.maximum_value)
    }

    fn validate(&self) -> PipelineResult<()> {
        let samples = self.ts_starts.len();
        if self.ts_ends.len() != samples
            || self.freq_khz.len() != samples
            || self.idle_values.len() != samples
            || self.idles.len() != samples
        {
            return Err(PipelineError::InvalidData(format!(
                "counter columns differ in length: starts={samples}, ends={}, freqs={}, idle_values={}, idles={}",
                self.ts_ends.len(),
                self.freq_khz.len(),
                self.idle_values.len(),
                self.idles.len()
            )));
        }
        Ok(())
    }
}

/// Result of one query round, published to the surface as an immutable
/// snapshot that replaces the track's previous buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackDataBuffer {
    Slice(SliceBuffer),
    Summary(SummaryBuffer),
    Counter(CounterBuffer),
}

impl TrackDataBuffer {
    #[must_use]
    pub fn kind(&self) -> BufferKind {
        match self {
            Self::Slice(_) => BufferKind::Slice,
            Self::Summary(_) => BufferKind::Summary,
            Self::Counter(_) => BufferKind::Counter,
        }
    }

    #[must_use]
    pub fn start(&self) -> f64 {
        match self {
            Self::Slice(buffer) => buffer.start,
            Self::Summary(buffer) => buffer.start,
            Self::Counter(buffer) => buffer.start,
        }
    }

    #[must_use]
    pub fn end(&self) -> f64 {
        match self {
            Self::Slice(buffer) => buffer.end,
            Self::Summary(buffer) => buffer.end,
            Self::Counter(buffer) => buffer.end,
        }
    }

    #[must_use]
    pub fn resolution(&self) -> Resolution {
        match self {
            Self::Slice(buffer) => buffer.resolution,
            Self::Summary(buffer) => buffer.resolution,
            Self::Counter(buffer) => buffer.resolution,
        }
    }

    pub fn span(&self) -> PipelineResult<TimeSpan> {
        TimeSpan::new(self.start(), self.end())
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Slice(buffer) if buffer.truncated)
    }

    /// Checks `start <= end` and that parallel columns share a length.
    pub fn validate(&self) -> PipelineResult<()> {
        self.span()?;
        match self {
            Self::Slice(buffer) => buffer.validate(),
            Self::Summary(buffer) => buffer.validate(),
            Self::Counter(buffer) => buffer.validate(),
        }
    }
}
