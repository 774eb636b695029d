use futures::future::BoxFuture;
use tracing::{debug, info};

use crate::core::{CounterBuffer, Resolution, TrackDataBuffer, TrackId, ns_to_seconds};
use crate::error::{PipelineError, PipelineResult};

use super::activity::{create_counter_activity_views, idle_none_literal};
use super::{
    CpuTrackConfig, ExtremesCache, SetupState, TrackController, TrackControllerArgs,
    TrackQueries, WindowPlan,
};

pub const CPU_FREQ_TRACK_KIND: &str = "cpu_freq";

/// Frequency and idle-state counter samples of one CPU.
pub struct CpuFreqTrackController {
    config: CpuTrackConfig,
    queries: TrackQueries,
    setup: SetupState,
    extremes: Option<ExtremesCache>,
}

impl CpuFreqTrackController {
    pub fn new(args: TrackControllerArgs) -> PipelineResult<Self> {
        let config = CpuTrackConfig::from_value(&args.track_id, &args.config)?;
        Ok(Self {
            config,
            queries: TrackQueries::new(args.engine, args.track_id, args.instance),
            setup: SetupState::default(),
            extremes: None,
        })
    }

    pub fn create(args: TrackControllerArgs) -> PipelineResult<Box<dyn TrackController>> {
        Ok(Box::new(Self::new(args)?))
    }

    #[must_use]
    pub fn config(&self) -> CpuTrackConfig {
        self.config
    }

    /// Extremes observed so far, `None` before the first successful setup.
    #[must_use]
    pub fn extremes(&self) -> Option<ExtremesCache> {
        self.extremes
    }

    #[must_use]
    pub fn maximum_value(&self) -> f64 {
        self.observed().effective_maximum(self.config.maximum_value)
    }

    #[must_use]
    pub fn minimum_value(&self) -> f64 {
        self.observed().effective_minimum(self.config.minimum_value)
    }

    fn observed(&self) -> ExtremesCache {
        self.extremes
            .unwrap_or(ExtremesCache::from_observation(0.0, 0.0))
    }

    async fn update(
        &mut self,
        start: f64,
        end: f64,
        resolution: Resolution,
    ) -> PipelineResult<TrackDataBuffer> {
        let plan = WindowPlan::unquantized(start, end)?;

        if !self.setup.is_ready() {
            let prior_failures = self.setup.begin();
            let outcome = self.create_derived_views().await;
            self.setup.complete(prior_failures, &outcome);
            outcome?;
        }

        let window = self.queries.table_name("window");
        self.queries.query(&plan.update_statement(&window)).await?;

        let activity = self.queries.table_name("activity");
        let rows = self
            .queries
            .query(&format!(
                "select ts, dur, idle, freq_value, idle_value from {activity} order by ts;"
            ))
            .await?;

        let samples = rows.num_records();
        let mut buffer = CounterBuffer {
            start,
            end,
            resolution,
            maximum_value: self.maximum_value(),
            minimum_value: self.minimum_value(),
            ts_starts: Vec::with_capacity(samples),
            ts_ends: Vec::with_capacity(samples),
            freq_khz: Vec::with_capacity(samples),
            idle_values: Vec::with_capacity(samples),
            idles: Vec::with_capacity(samples),
        };

        let freq_values = rows.numbers(3)?;
        let idle_values = rows.numbers(4)?;
        for ((((&ts, &dur), &idle), &freq), &idle_value) in rows
            .longs(0)?
            .iter()
            .zip(rows.longs(1)?)
            .zip(rows.longs(2)?)
            .zip(&freq_values)
            .zip(&idle_values)
        {
            let ts_start = ns_to_seconds(ts);
            buffer.ts_starts.push(ts_start);
            buffer.ts_ends.push(ts_start + ns_to_seconds(dur));
            buffer.idles.push(idle != 0);
            buffer.freq_khz.push(frequency_khz(freq)?);
            buffer.idle_values.push(idle_value);
        }

        debug!(
            track_id = %self.queries.track_id(),
            samples = buffer.len(),
            maximum_value = buffer.maximum_value,
            "cpu frequency round complete"
        );
        Ok(TrackDataBuffer::Counter(buffer))
    }

    async fn create_derived_views(&mut self) -> PipelineResult<()> {
        let cpu = self.config.cpu;
        let extremes = self
            .queries
            .query(&format!(
                "select max(value), min(value) from counters where name = 'cpufreq' and ref = {cpu};"
            ))
            .await?;
        let maximum = extremes.numbers(0)?.first().copied();
        let minimum = extremes.numbers(1)?.first().copied();
        if let (Some(maximum), Some(minimum)) = (maximum, minimum) {
            self.extremes
                .get_or_insert(ExtremesCache::from_observation(0.0, 0.0))
                .observe(minimum, maximum);
            info!(
                track_id = %self.queries.track_id(),
                maximum,
                minimum,
                "observed cpu frequency extremes"
            );
        }

        let window = self
            .queries
            .create_virtual_table("window", "window")
            .await?;
        let span_activity =
            create_counter_activity_views(&mut self.queries, cpu, &window).await?;

        let idle_none = idle_none_literal();
        self.queries
            .create_view(
                "activity",
                &format!(
                    "select ts, dur, quantum_ts, cpu, \
                     case idle_value when {idle_none} then 0 else 1 end as idle, \
                     freq_value, idle_value from {span_activity}"
                ),
            )
            .await?;
        Ok(())
    }
}

fn frequency_khz(value: f64) -> PipelineResult<u32> {
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(PipelineError::QueryShape(format!(
            "frequency {value} is not a valid kHz value"
        )));
    }
    Ok(value.round() as u32)
}

impl TrackController for CpuFreqTrackController {
    fn kind(&self) -> &'static str {
        CPU_FREQ_TRACK_KIND
    }

    fn track_id(&self) -> &TrackId {
        self.queries.track_id()
    }

    fn setup_state(&self) -> &SetupState {
        &self.setup
    }

    fn on_bounds_change(
        &mut self,
        start: f64,
        end: f64,
        resolution: Resolution,
    ) -> BoxFuture<'_, PipelineResult<TrackDataBuffer>> {
        Box::pin(self.update(start, end, resolution))
    }

    fn on_destroy(&mut self) -> BoxFuture<'_, PipelineResult<()>> {
        Box::pin(async move {
            self.queries.drop_derived_views().await?;
            self.setup = SetupState::Uninitialized;
            Ok(())
        })
    }
}
