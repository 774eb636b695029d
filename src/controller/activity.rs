use crate::core::CPU_IDLE_NONE;
use crate::error::PipelineResult;

use super::TrackQueries;

/// Creates the views joining the `cpufreq` and `cpuidle` counters of `cpu`,
/// split at the boundaries of `window`. Returns the joined table's name,
/// whose rows carry `freq_value`, `idle_value` and `quantum_ts`.
pub(super) async fn create_counter_activity_views(
    queries: &mut TrackQueries,
    cpu: u32,
    window: &str,
) -> PipelineResult<String> {
    let freq = queries
        .create_view("freq", &counter_select(cpu, "cpufreq", "freq"))
        .await?;
    let idle = queries
        .create_view("idle", &counter_select(cpu, "cpuidle", "idle"))
        .await?;
    let freq_idle = queries
        .create_virtual_table(
            "freq_idle",
            &format!("span_join({freq} PARTITIONED cpu, {idle} PARTITIONED cpu)"),
        )
        .await?;
    queries
        .create_virtual_table(
            "span_activity",
            &format!("span_join({freq_idle} PARTITIONED cpu, {window} PARTITIONED cpu)"),
        )
        .await
}

/// SQL literal of the "CPU is running" idle value.
pub(super) fn idle_none_literal() -> u64 {
    CPU_IDLE_NONE as u64
}

fn counter_select(cpu: u32, counter: &str, prefix: &str) -> String {
    format!(
        "select ts, dur, ref as cpu, name as {prefix}_name, value as {prefix}_value \
         from counters where name = '{counter}' and ref = {cpu} and ref_type = 'cpu'"
    )
}
