use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::core::{
    Resolution, SliceBuffer, SummaryBuffer, TrackDataBuffer, TrackId, ns_to_seconds,
};
use crate::error::{PipelineError, PipelineResult};

use super::activity::{create_counter_activity_views, idle_none_literal};
use super::{
    CpuTrackConfig, FetchMode, SetupState, TrackController, TrackControllerArgs, TrackQueries,
    WindowPlan,
};

pub const CPU_SLICE_TRACK_KIND: &str = "cpu_slices";

/// Scheduling slices of one CPU.
///
/// Fine resolutions fetch individual slices (capped at the configured row
/// limit); coarse ones fetch per-bucket utilization and peak
/// frequency/idle values.
pub struct CpuSliceTrackController {
    config: CpuTrackConfig,
    pipeline: PipelineConfig,
    queries: TrackQueries,
    setup: SetupState,
}

impl CpuSliceTrackController {
    pub fn new(args: TrackControllerArgs) -> PipelineResult<Self> {
        let config = CpuTrackConfig::from_value(&args.track_id, &args.config)?;
        Ok(Self {
            config,
            pipeline: args.pipeline,
            queries: TrackQueries::new(args.engine, args.track_id, args.instance),
            setup: SetupState::default(),
        })
    }

    pub fn create(args: TrackControllerArgs) -> PipelineResult<Box<dyn TrackController>> {
        Ok(Box::new(Self::new(args)?))
    }

    #[must_use]
    pub fn config(&self) -> CpuTrackConfig {
        self.config
    }

    async fn update(
        &mut self,
        start: f64,
        end: f64,
        resolution: Resolution,
    ) -> PipelineResult<TrackDataBuffer> {
        let plan = WindowPlan::for_request(start, end, resolution, &self.pipeline)?;

        if !self.setup.is_ready() {
            let prior_failures = self.setup.begin();
            let outcome = self.create_derived_views().await;
            self.setup.complete(prior_failures, &outcome);
            outcome?;
        }

        let window = self.queries.table_name("window");
        self.queries.query(&plan.update_statement(&window)).await?;

        let buffer = match plan.mode {
            FetchMode::Quantized { bucket_size_ns } => TrackDataBuffer::Summary(
                self.compute_summary(&plan, end, resolution, bucket_size_ns)
                    .await?,
            ),
            FetchMode::Raw => TrackDataBuffer::Slice(
                self.compute_slices(plan.window_start(), end, resolution)
                    .await?,
            ),
        };
        debug!(
            track_id = %self.queries.track_id(),
            kind = ?buffer.kind(),
            start = buffer.start(),
            end = buffer.end(),
            %resolution,
            "cpu slice round complete"
        );
        Ok(buffer)
    }

    async fn create_derived_views(&mut self) -> PipelineResult<()> {
        let cpu = self.config.cpu;
        let window = self
            .queries
            .create_virtual_table("window", "window")
            .await?;
        self.queries
            .create_virtual_table(
                "span_sched",
                &format!("span_join(sched PARTITIONED cpu, {window} PARTITIONED cpu)"),
            )
            .await?;
        let span_activity =
            create_counter_activity_views(&mut self.queries, cpu, &window).await?;

        let idle_none = idle_none_literal();
        self.queries
            .create_view(
                "activity",
                &format!(
                    "select ts, dur, quantum_ts, cpu, \
                     case idle_value when {idle_none} then 'freq' else 'idle' end as name, \
                     case idle_value when {idle_none} then freq_value else idle_value end as value \
                     from {span_activity}"
                ),
            )
            .await?;
        Ok(())
    }

    async fn compute_summary(
        &self,
        plan: &WindowPlan,
        end: f64,
        resolution: Resolution,
        bucket_size_ns: i64,
    ) -> PipelineResult<SummaryBuffer> {
        let cpu = self.config.cpu;
        let num_buckets = plan.num_buckets();
        let span_sched = self.queries.table_name("span_sched");
        let activity = self.queries.table_name("activity");

        let utilization_query = format!(
            "select quantum_ts as bucket, sum(dur)/cast({bucket_size_ns} as float) as utilization \
             from {span_sched} where cpu = {cpu} and utid != 0 group by quantum_ts"
        );
        let activity_query = format!(
            "select quantum_ts as bucket, name, max(value) as value \
             from {activity} where cpu = {cpu} group by quantum_ts, name"
        );

        let (utilization, peaks) = futures::try_join!(
            self.queries.query(&utilization_query),
            self.queries.query(&activity_query),
        )?;

        let mut summary = SummaryBuffer::zeroed(
            plan.window_start(),
            end,
            resolution,
            ns_to_seconds(bucket_size_ns),
            num_buckets,
        );
        let track_id = self.queries.track_id();

        let utilization_values = utilization.numbers(1)?;
        for (&bucket, &value) in utilization.longs(0)?.iter().zip(&utilization_values) {
            if let Some(slot) = bucket_slot(track_id, bucket, num_buckets) {
                summary.utilizations[slot] = value;
            }
        }

        let peak_values = peaks.numbers(2)?;
        for ((&bucket, name), &value) in peaks
            .longs(0)?
            .iter()
            .zip(peaks.strings(1)?)
            .zip(&peak_values)
        {
            let Some(slot) = bucket_slot(track_id, bucket, num_buckets) else {
                continue;
            };
            if name == "idle" {
                summary.idles[slot] = value;
            } else {
                summary.freqs[slot] = value;
            }
        }
        Ok(summary)
    }

    async fn compute_slices(
        &self,
        start: f64,
        end: f64,
        resolution: Resolution,
    ) -> PipelineResult<SliceBuffer> {
        let cpu = self.config.cpu;
        let limit = self.pipeline.raw_row_limit;
        let span_sched = self.queries.table_name("span_sched");
        let activity = self.queries.table_name("activity");

        let slice_query = format!(
            "select ts, dur, utid from {span_sched} \
             where cpu = {cpu} and utid != 0 order by ts limit {limit};"
        );
        let freq_query = format!(
            "select ts, case name when 'freq' then value else 0.0 end as freq_or_zero \
             from {activity} where cpu = {cpu} order by ts;"
        );

        let (slice_rows, freq_rows) = futures::try_join!(
            self.queries.query(&slice_query),
            self.queries.query(&freq_query),
        )?;

        let mut slices = SliceBuffer::with_capacity(
            start,
            end,
            resolution,
            slice_rows.num_records(),
            freq_rows.num_records(),
        );

        for ((&ts, &dur), &utid) in slice_rows
            .longs(0)?
            .iter()
            .zip(slice_rows.longs(1)?)
            .zip(slice_rows.longs(2)?)
        {
            let start_sec = ns_to_seconds(ts);
            slices.starts.push(start_sec);
            slices.ends.push(start_sec + ns_to_seconds(dur));
            slices.utids.push(u32::try_from(utid).map_err(|_| {
                PipelineError::QueryShape(format!("utid {utid} does not fit in u32"))
            })?);
        }
        if slices.truncate_to_row_cap(limit) {
            debug!(
                track_id = %self.queries.track_id(),
                limit,
                end = slices.end,
                "slice query hit row cap, truncating buffer end"
            );
        }

        let freq_values = freq_rows.numbers(1)?;
        for (&ts, &value) in freq_rows.longs(0)?.iter().zip(&freq_values) {
            slices.freq_starts.push(ns_to_seconds(ts));
            slices.freqs.push(value);
        }
        Ok(slices)
    }
}

fn bucket_slot(track_id: &TrackId, bucket: i64, num_buckets: usize) -> Option<usize> {
    let slot = usize::try_from(bucket)
        .ok()
        .filter(|&slot| slot < num_buckets);
    if slot.is_none() {
        warn!(%track_id, bucket, num_buckets, "skipping summary row outside the window");
    }
    slot
}

impl TrackController for CpuSliceTrackController {
    fn kind(&self) -> &'static str {
        CPU_SLICE_TRACK_KIND
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
