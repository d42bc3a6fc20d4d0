//! Error types for the sync engine.

use learnsync_model::SyncType;
use learnsync_store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the dispatch can be retried.
        retryable: bool,
    },

    /// Dispatch exceeded the type's timeout.
    #[error("dispatch timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// A dependency has no recorded successful sync yet.
    #[error("item {item}: dependency {dependency} has not succeeded yet")]
    DependencyNotMet {
        /// The gated item.
        item: Uuid,
        /// The unsatisfied dependency.
        dependency: Uuid,
    },

    /// The payload variant does not match the item's declared type.
    #[error("payload of type {found} does not match item type {expected}")]
    PayloadMismatch {
        /// The item's declared type.
        expected: SyncType,
        /// The payload's actual type.
        found: SyncType,
    },

    /// A conflict whose policy does not auto-resolve.
    #[error("unresolved conflict for item {0}; manual resolution required")]
    UnresolvedConflict(Uuid),

    /// Snapshot store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Snapshot or payload encoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if a failed dispatch may be retried.
    ///
    /// Dependency failures are retryable by design: dependent items retry
    /// until their prerequisite lands, bounded by their own retry ceiling.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Timeout { .. } => true,
            SyncError::DependencyNotMet { .. } => true,
            _ => false,
        }
    }
}
