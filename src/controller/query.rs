use std::sync::Arc;

use tracing::debug;

use crate::core::TrackId;
use crate::engine::{QueryEngine, QueryResult};
use crate::error::PipelineResult;

use super::{DerivedView, DerivedViewKind};

/// Per-track query helper: checked execution, track-scoped table names and
/// bookkeeping of the derived views created during setup.
pub struct TrackQueries {
    engine: Arc<dyn QueryEngine>,
    track_id: TrackId,
    suffix: String,
    views: Vec<DerivedView>,
}

impl TrackQueries {
    /// `instance` distinguishes controllers that reuse a track id, so a
    /// removed track's teardown never drops a successor's views.
    #[must_use]
    pub fn new(engine: Arc<dyn QueryEngine>, track_id: TrackId, instance: u64) -> Self {
        let suffix = format!("{}_{instance}", track_id.sql_suffix());
        Self {
            engine,
            track_id,
            suffix,
            views: Vec::new(),
        }
    }

    #[must_use]
    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    #[must_use]
    pub fn table_name(&self, base: &str) -> String {
        format!("{base}_{}", self.suffix)
    }

    #[must_use]
    pub fn derived_views(&self) -> &[DerivedView] {
        &self.views
    }

    /// Executes `query`, turning an engine error string into an error.
    pub async fn query(&self, query: &str) -> PipelineResult<QueryResult> {
        let response = self.engine.execute(query).await;
        response.into_result(query).inspect_err(|err| {
            debug!(track_id = %self.track_id, error = %err, "query failed");
        })
    }

    pub async fn create_view(&mut self, base: &str, select: &str) -> PipelineResult<String> {
        let name = self.table_name(base);
        self.query(&format!("create view if not exists {name} as {select};"))
            .await?;
        self.record(&name, DerivedViewKind::View);
        Ok(name)
    }

    pub async fn create_virtual_table(
        &mut self,
        base: &str,
        module: &str,
    ) -> PipelineResult<String> {
        let name = self.table_name(base);
        self.query(&format!(
            "create virtual table if not exists {name} using {module};"
        ))
        .await?;
        self.record(&name, DerivedViewKind::VirtualTable);
        Ok(name)
    }

    /// Drops derived views newest first. A failed drop leaves it and every
    /// older view recorded so a later teardown can retry.
    pub async fn drop_derived_views(&mut self) -> PipelineResult<()> {
        while let Some(view) = self.views.last() {
            self.query(&view.drop_statement()).await?;
            self.views.pop();
        }
        Ok(())
    }

    fn record(&mut self, name: &str, kind: DerivedViewKind) {
        if !self.views.iter().any(|view| view.name == name) {
            self.views.push(DerivedView {
                name: name.to_owned(),
                kind,
            });
        }
    }
}
