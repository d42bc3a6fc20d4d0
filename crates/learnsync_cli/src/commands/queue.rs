//! Queue listing command implementation.

use super::{load_queue, CommandResult};
use learnsync_model::now_millis;
use std::path::Path;

/// Runs the queue command.
pub async fn run(path: &Path) -> CommandResult {
    let mut items = load_queue(path).await?;
    if items.is_empty() {
        println!("queue is empty");
        return Ok(());
    }

    // Show scheduling order: priority band, then enqueue time
    items.sort_by_key(|i| i.schedule_key());

    let now = now_millis();
    println!("{} pending item(s)", items.len());
    for item in &items {
        let age_secs = now.saturating_sub(item.enqueued_at_ms) / 1000;
        println!(
            "  {}  {:<9} {:<18} {:<20} retries {}/{}  deps {}  age {}s",
            item.id,
            item.priority,
            item.sync_type,
            item.action,
            item.retry_count,
            item.max_retries,
            item.dependencies.len(),
            age_secs,
        );
    }
    Ok(())
}
