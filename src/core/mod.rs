pub mod buffer;
pub mod gridlines;
pub mod resolution;
pub mod scale;
pub mod search;
pub mod time_scale;
pub mod time_span;
pub mod types;
pub mod value_axis;

pub use buffer::{
    BufferKind, CPU_IDLE_NONE, CounterBuffer, CounterSample, SliceBuffer, SummaryBuffer,
    TrackDataBuffer,
};
pub use gridlines::{GridlineConfig, Gridlines};
pub use resolution::{Resolution, choose_step_size};
pub use scale::LinearScale;
pub use search::search_last_at_or_before;
pub use time_scale::TimeScale;
pub use time_span::{TimeSpan, ns_to_seconds, seconds_to_ns};
pub use types::TrackId;
pub use value_axis::ValueAxis;
