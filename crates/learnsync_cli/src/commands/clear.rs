//! Clear command implementation.

use super::{CommandResult, HISTORY_COLLECTION, QUEUE_COLLECTION};
use learnsync_store::{FileStore, SnapshotStore};
use std::path::Path;

/// Runs the clear command.
pub async fn run(path: &Path, clear_queue: bool, clear_history: bool) -> CommandResult {
    let store = FileStore::new(path);
    if clear_queue {
        store.clear(QUEUE_COLLECTION).await?;
        println!("queue snapshot cleared");
    }
    if clear_history {
        store.clear(HISTORY_COLLECTION).await?;
        println!("history snapshot cleared");
    }
    Ok(())
}
