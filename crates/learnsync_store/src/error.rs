//! Error types for snapshot stores.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in a snapshot store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An I/O error, with the path it occurred on.
    #[error("i/o error at {path}: {source}")]
    Io {
        /// The path involved.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The collection name is not usable as a storage key.
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),
}

impl StoreError {
    /// Wraps an I/O error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Validates a collection name: non-empty, no path separators.
pub(crate) fn validate_collection(name: &str) -> StoreResult<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(StoreError::InvalidCollection(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_validation() {
        assert!(validate_collection("sync_queue").is_ok());
        assert!(validate_collection("sync-history.v2").is_ok());
        assert!(validate_collection("").is_err());
        assert!(validate_collection("a/b").is_err());
        assert!(validate_collection("a\\b").is_err());
        assert!(validate_collection("..").is_err());
    }

    #[test]
    fn error_display_carries_path() {
        let err = StoreError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/x"));
    }
}
