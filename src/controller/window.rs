use crate::config::PipelineConfig;
use crate::core::{Resolution, ns_to_seconds, seconds_to_ns};
use crate::error::{PipelineError, PipelineResult};

/// Largest absolute window bound, in seconds, a plan accepts. Keeps every
/// nanosecond bound, bucket size and difference well inside `i64`.
pub const MAX_WINDOW_SECONDS: f64 = 2.0e9;
const MAX_WINDOW_NS: f64 = MAX_WINDOW_SECONDS * 1e9;

/// How a round turns the requested window into data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// One aggregate per bucket of `bucket_size_ns`.
    Quantized { bucket_size_ns: i64 },
    /// Individual events, capped at the configured row limit.
    Raw,
}

/// Nanosecond window a round writes into the engine's window table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    pub window_start_ns: i64,
    pub window_dur_ns: i64,
    pub end_ns: i64,
    pub mode: FetchMode,
}

impl WindowPlan {
    /// Picks the fetch mode for `resolution` and aligns the window start down
    /// to a bucket boundary in quantized mode.
    pub fn for_request(
        start: f64,
        end: f64,
        resolution: Resolution,
        config: &PipelineConfig,
    ) -> PipelineResult<Self> {
        let (start_ns, end_ns) = window_bounds_ns(start, end)?;

        let mode = if resolution.is_at_least(config.quantize_threshold_exponent) {
            let bucket_size_ns =
                (resolution.seconds_per_px() * f64::from(config.pixels_per_bucket) * 1e9).round();
            if !(1.0..=MAX_WINDOW_NS).contains(&bucket_size_ns) {
                return Err(PipelineError::DegenerateInput(format!(
                    "bucket size for {resolution} is out of range"
                )));
            }
            FetchMode::Quantized {
                bucket_size_ns: bucket_size_ns as i64,
            }
        } else {
            FetchMode::Raw
        };

        let window_start_ns = match mode {
            FetchMode::Quantized { bucket_size_ns } => {
                start_ns.div_euclid(bucket_size_ns) * bucket_size_ns
            }
            FetchMode::Raw => start_ns,
        };

        Ok(Self {
            window_start_ns,
            window_dur_ns: (end_ns - window_start_ns).max(1),
            end_ns,
            mode,
        })
    }

    /// Window limited to `[start, end]` with no quantization.
    pub fn unquantized(start: f64, end: f64) -> PipelineResult<Self> {
        let (window_start_ns, end_ns) = window_bounds_ns(start, end)?;
        Ok(Self {
            window_start_ns,
            window_dur_ns: (end_ns - window_start_ns).max(1),
            end_ns,
            mode: FetchMode::Raw,
        })
    }

    #[must_use]
    pub fn is_quantized(&self) -> bool {
        matches!(self.mode, FetchMode::Quantized { .. })
    }

    #[must_use]
    pub fn quantum_ns(&self) -> i64 {
        match self.mode {
            FetchMode::Quantized { bucket_size_ns } => bucket_size_ns,
            FetchMode::Raw => 0,
        }
    }

    #[must_use]
    pub fn window_start(&self) -> f64 {
        ns_to_seconds(self.window_start_ns)
    }

    /// `ceil((end - window_start) / bucket_size)`; zero in raw mode.
    #[must_use]
    pub fn num_buckets(&self) -> usize {
        match self.mode {
            FetchMode::Quantized { bucket_size_ns } => {
                let span_ns = (self.end_ns - self.window_start_ns).max(0);
                let buckets = span_ns / bucket_size_ns + i64::from(span_ns % bucket_size_ns != 0);
                buckets as usize
            }
            FetchMode::Raw => 0,
        }
    }

    #[must_use]
    pub fn update_statement(&self, window_table: &str) -> String {
        format!(
            "update {window_table} set window_start={}, window_dur={}, quantum={} where rowid = 0;",
            self.window_start_ns,
            self.window_dur_ns,
            self.quantum_ns()
        )
    }
}

fn window_bounds_ns(start: f64, end: f64) -> PipelineResult<(i64, i64)> {
    let in_range = |bound: f64| bound.is_finite() && bound.abs() <= MAX_WINDOW_SECONDS;
    if !in_range(start) || !in_range(end) || end < start {
        return Err(PipelineError::InvalidData(format!(
            "bounds request window [{start}, {end}] is invalid"
        )));
    }
    Ok((seconds_to_ns(start), seconds_to_ns(end)))
}
