#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use serde_json::json;
use tokio::sync::Semaphore;
use tracks_rs::config::PipelineConfig;
use tracks_rs::controller::TrackControllerArgs;
use tracks_rs::core::TrackId;
use tracks_rs::engine::{Column, QueryEngine, QueryResponse};

/// In-memory query engine answering by substring match.
///
/// Rules registered later take precedence. Queries matching no rule get an
/// empty successful response, which covers DDL and window updates.
#[derive(Default)]
pub struct ScriptedEngine {
    rules: Mutex<Vec<(String, QueryResponse)>>,
    gates: Mutex<Vec<(String, Arc<Semaphore>)>>,
    log: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, needle: &str, response: QueryResponse) {
        self.rules
            .lock()
            .expect("rules lock")
            .push((needle.to_owned(), response));
    }

    pub fn fail(&self, needle: &str, message: &str) {
        self.respond(needle, QueryResponse::failed(message));
    }

    /// Makes queries containing `needle` wait until the returned semaphore
    /// receives a permit per query.
    pub fn hold(&self, needle: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .expect("gates lock")
            .push((needle.to_owned(), Arc::clone(&gate)));
        gate
    }

    pub fn queries(&self) -> Vec<String> {
        self.log.lock().expect("log lock").clone()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.queries()
            .iter()
            .filter(|query| query.contains(needle))
            .count()
    }

    fn gate_for(&self, query: &str) -> Option<Arc<Semaphore>> {
        self.gates
            .lock()
            .expect("gates lock")
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, gate)| Arc::clone(gate))
    }

    fn response_for(&self, query: &str) -> QueryResponse {
        self.rules
            .lock()
            .expect("rules lock")
            .iter()
            .rev()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map_or_else(QueryResponse::empty, |(_, response)| response.clone())
    }

    fn record(&self, query: &str) {
        self.log.lock().expect("log lock").push(query.to_owned());
    }
}

impl QueryEngine for ScriptedEngine {
    fn execute<'a>(&'a self, query: &'a str) -> BoxFuture<'a, QueryResponse> {
        Box::pin(async move {
            self.record(query);
            if let Some(gate) = self.gate_for(query) {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            self.response_for(query)
        })
    }
}

pub fn longs(name: &str, values: &[i64]) -> Column {
    Column::long(name, values.to_vec())
}

pub fn doubles(name: &str, values: &[f64]) -> Column {
    Column::double(name, values.to_vec())
}

pub fn strings(name: &str, values: &[&str]) -> Column {
    Column::string(name, values.iter().map(|value| (*value).to_owned()).collect())
}

pub fn controller_args(engine: Arc<ScriptedEngine>, track_id: &str, cpu: u32) -> TrackControllerArgs {
    TrackControllerArgs {
        track_id: TrackId::new(track_id),
        instance: 0,
        engine,
        config: json!({ "cpu": cpu }),
        pipeline: PipelineConfig::default(),
    }
}
