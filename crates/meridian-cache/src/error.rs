//! Error types for the Meridian cache system

use thiserror::Error;

/// Main error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Cache key not found: {0}")]
    KeyNotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache backend error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Capacity exceeded
    #[error("Cache capacity exceeded")]
    CapacityExceeded,

    /// Invalid key format
    #[error("Invalid key format: {0}")]
    InvalidKey(String),

    /// Invalid value format
    #[error("Invalid value format: {0}")]
    InvalidValue(String),

    /// Generic error
    #[error("Cache error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

impl CacheError {
    /// Check if the error is retriable
    pub fn is_retriable(&self) -> bool {
        matches!(self, CacheError::Timeout | CacheError::Backend(_))
    }

    /// Check if the error indicates a missing key
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::KeyNotFound(_))
    }
}
