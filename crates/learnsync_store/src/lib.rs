//! # learnsync Store
//!
//! Snapshot persistence boundary for the learnsync engine.
//!
//! Stores are **opaque byte stores** keyed by collection name - they do not
//! interpret the snapshots they hold. The engine owns all snapshot encoding;
//! stores only provide durable `get`/`put`/`clear` with creation-on-first-use
//! semantics.
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For tests and ephemeral sessions
//! - [`FileStore`] - One file per collection, atomic replacement
//!
//! ## Example
//!
//! ```rust
//! use learnsync_store::{MemoryStore, SnapshotStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = MemoryStore::new();
//! store.put("sync_queue", b"snapshot bytes").await.unwrap();
//! let bytes = store.get("sync_queue").await.unwrap();
//! assert_eq!(bytes.as_deref(), Some(&b"snapshot bytes"[..]));
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::SnapshotStore;
