use std::sync::Arc;

use smallvec::{SmallVec, smallvec};

use crate::core::{Resolution, TimeSpan, TrackDataBuffer};

/// Latest published buffer of one track.
///
/// A published buffer replaces the previous one outright; ranges are never
/// merged.
#[derive(Debug, Clone, Default)]
pub struct TrackDataCache {
    buffer: Option<Arc<TrackDataBuffer>>,
}

impl TrackDataCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn buffer(&self) -> Option<&Arc<TrackDataBuffer>> {
        self.buffer.as_ref()
    }

    /// Stores `buffer`, returning the one it replaced.
    pub fn replace(&mut self, buffer: Arc<TrackDataBuffer>) -> Option<Arc<TrackDataBuffer>> {
        self.buffer.replace(buffer)
    }

    pub fn clear(&mut self) -> Option<Arc<TrackDataBuffer>> {
        self.buffer.take()
    }

    /// `true` when the cached buffer spans `visible` at exactly `resolution`.
    #[must_use]
    pub fn is_satisfied(&self, visible: TimeSpan, resolution: Resolution) -> bool {
        self.buffer.as_deref().is_some_and(|buffer| {
            visible.start() >= buffer.start()
                && visible.end() <= buffer.end()
                && buffer.resolution() == resolution
        })
    }

    /// Parts of `visible` the cached buffer does not cover, left to right.
    #[must_use]
    pub fn loading_regions(&self, visible: TimeSpan) -> SmallVec<[TimeSpan; 2]> {
        let Some(covered) = self
            .buffer
            .as_deref()
            .and_then(|buffer| buffer.span().ok())
            .and_then(|span| span.intersection(visible))
        else {
            return smallvec![visible];
        };

        let mut regions = SmallVec::new();
        if covered.start() > visible.start() {
            if let Ok(left) = TimeSpan::new(visible.start(), covered.start()) {
                regions.push(left);
            }
        }
        if covered.end() < visible.end() {
            if let Ok(right) = TimeSpan::new(covered.end(), visible.end()) {
                regions.push(right);
            }
        }
        regions
    }
}
