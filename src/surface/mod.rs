//! Consumer side: per-track caches, request debouncing and the timeline
//! state that ties them to the visible window.

mod cache;
mod debounce;
mod driver;
mod timeline;

pub use cache::TrackDataCache;
pub use debounce::BoundsDebouncer;
pub use driver::SurfaceDriver;
pub use timeline::{Timeline, TrackStatus, TrackView};
