use indexmap::IndexMap;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

use super::{
    CPU_FREQ_TRACK_KIND, CPU_SLICE_TRACK_KIND, CpuFreqTrackController, CpuSliceTrackController,
    TrackController, TrackControllerArgs,
};

pub type ControllerConstructor = fn(TrackControllerArgs) -> PipelineResult<Box<dyn TrackController>>;

/// Maps a track kind string to the constructor of its controller.
///
/// Registration order is kept so `kinds()` lists kinds deterministically.
#[derive(Debug, Clone, Default)]
pub struct TrackControllerRegistry {
    constructors: IndexMap<String, ControllerConstructor>,
}

impl TrackControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in CPU track kinds.
    #[must_use]
    pub fn with_builtin_track_kinds() -> Self {
        let mut registry = Self::new();
        register_builtin_track_kinds(&mut registry);
        registry
    }

    pub fn register(
        &mut self,
        kind: impl Into<String>,
        constructor: ControllerConstructor,
    ) -> PipelineResult<()> {
        let kind = kind.into();
        if self.constructors.contains_key(&kind) {
            return Err(PipelineError::DuplicateTrackKind(kind));
        }
        debug!(%kind, "registered track kind");
        self.constructors.insert(kind, constructor);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn create(
        &self,
        kind: &str,
        args: TrackControllerArgs,
    ) -> PipelineResult<Box<dyn TrackController>> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| PipelineError::UnknownTrackKind(kind.to_owned()))?;
        constructor(args)
    }
}

/// Adds the CPU slice and CPU frequency kinds. Kinds already present are
/// left untouched.
pub fn register_builtin_track_kinds(registry: &mut TrackControllerRegistry) {
    let builtins: [(&str, ControllerConstructor); 2] = [
        (CPU_SLICE_TRACK_KIND, CpuSliceTrackController::create),
        (CPU_FREQ_TRACK_KIND, CpuFreqTrackController::create),
    ];
    for (kind, constructor) in builtins {
        if let Err(PipelineError::DuplicateTrackKind(kind)) =
            registry.register(kind, constructor)
        {
            debug!(%kind, "track kind already registered, keeping existing constructor");
        }
    }
}
