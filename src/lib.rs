//! tracks-rs: bounds-driven incremental query/cache pipeline for timeline
//! tracks.
//!
//! A surface ([`surface::Timeline`]) checks whether each track's cached
//! buffer covers the visible window at the current resolution. Misses are
//! debounced into padded bounds requests for a producer
//! ([`pipeline::Producer`]), whose per-kind track controllers query an
//! external engine and publish typed buffers back to the surface.

pub mod config;
pub mod controller;
pub mod core;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod surface;
pub mod telemetry;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
