//! Common error types for artrank

use thiserror::Error;

/// Common result type for artrank operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the ranking engine
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested artwork does not exist in the durable store
    #[error("Artwork not found: {0}")]
    ArtworkNotFound(String),

    /// Another updater holds the per-artwork lock; safe to retry
    #[error("Lock contention on artwork {0}")]
    LockContention(String),

    /// Per-user action ceiling reached inside the rolling window
    #[error("Rate limit exceeded: {action} (limit {limit}/window)")]
    RateLimitExceeded { action: String, limit: u32 },

    /// Fast store unreachable or command failed
    #[error("Fast store unavailable: {0}")]
    StoreUnavailable(String),

    /// A batch flush completed with per-artwork failures
    #[error("Batch flush partially failed: {failed} of {processed} artwork groups")]
    BatchPartialFailure { processed: usize, failed: usize },

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the caller may retry the same request unchanged.
    ///
    /// Only lock contention qualifies; rate-limit rejections are terminal
    /// for the current window.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::LockContention(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_contention_is_retryable() {
        assert!(Error::LockContention("a-1".into()).is_retryable());
    }

    #[test]
    fn rate_limit_is_not_retryable() {
        let err = Error::RateLimitExceeded {
            action: "like".into(),
            limit: 10,
        };
        assert!(!err.is_retryable());
    }
}
