//! Stats command implementation.

use super::{load_history, load_queue, CommandResult};
use learnsync_model::{now_millis, SyncHistory, TypeStats, DEFAULT_HISTORY_LIMIT};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Sync-state statistics derived from the persisted snapshots.
#[derive(Debug, Serialize)]
pub struct StatsOutput {
    /// Data directory inspected.
    pub path: String,
    /// Pending items in the persisted queue.
    pub queue_size: usize,
    /// Retained history records.
    pub history_records: usize,
    /// All-time success records.
    pub total_synced: u64,
    /// Success records in the last 24 hours.
    pub synced_last_24_hours: u64,
    /// Success records in the last 7 days.
    pub synced_last_7_days: u64,
    /// Success records / total records * 100.
    pub success_rate: f64,
    /// Per-type tallies.
    pub by_type: BTreeMap<String, TypeStats>,
    /// Failed records in the last 24 hours (up to 10).
    pub recent_failures: usize,
}

/// Runs the stats command.
pub async fn run(path: &Path, format: &str) -> CommandResult {
    let items = load_queue(path).await?;
    let records = load_history(path).await?;

    let history = SyncHistory::with_records(DEFAULT_HISTORY_LIMIT, records);
    let stats = history.stats(now_millis());

    let output = StatsOutput {
        path: path.display().to_string(),
        queue_size: items.len(),
        history_records: history.len(),
        total_synced: stats.total_synced,
        synced_last_24_hours: stats.synced_last_24_hours,
        synced_last_7_days: stats.synced_last_7_days,
        success_rate: stats.success_rate,
        by_type: stats
            .by_type
            .iter()
            .map(|(t, s)| (t.to_string(), *s))
            .collect(),
        recent_failures: stats.recent_failures.len(),
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Sync state at {}", output.path);
    println!("  queue size:        {}", output.queue_size);
    println!("  history records:   {}", output.history_records);
    println!("  total synced:      {}", output.total_synced);
    println!("  last 24 hours:     {}", output.synced_last_24_hours);
    println!("  last 7 days:       {}", output.synced_last_7_days);
    println!("  success rate:      {:.1}%", output.success_rate);
    println!("  recent failures:   {}", output.recent_failures);
    if !output.by_type.is_empty() {
        println!("  by type:");
        for (sync_type, tally) in &output.by_type {
            println!(
                "    {:<18} success {:>5}  failed {:>5}  total {:>5}",
                sync_type, tally.success, tally.failed, tally.total
            );
        }
    }
    Ok(())
}
