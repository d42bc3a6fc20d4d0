//! History dump command implementation.

use super::{load_history, CommandResult};
use learnsync_model::SyncStatus;
use std::path::Path;

/// Runs the history command.
pub async fn run(path: &Path, limit: usize, failures_only: bool) -> CommandResult {
    let records = load_history(path).await?;

    let mut shown: Vec<_> = records
        .iter()
        .filter(|r| !failures_only || r.status == SyncStatus::Failed)
        .collect();
    if shown.is_empty() {
        println!("no matching history records");
        return Ok(());
    }

    // Records are oldest-first; show the most recent tail
    let skip = shown.len().saturating_sub(limit);
    shown.drain(..skip);

    println!("{} record(s)", shown.len());
    for record in shown {
        let error = record
            .error
            .as_deref()
            .map(|e| format!("  ({e})"))
            .unwrap_or_default();
        println!(
            "  {}  {:<8} {:<18} item {}  retry {}  {}ms{}",
            record.timestamp_ms,
            record.status,
            record.sync_type,
            record.sync_item_id,
            record.retry_count,
            record.duration_ms,
            error,
        );
    }
    Ok(())
}
