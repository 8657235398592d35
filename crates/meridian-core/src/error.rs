//! Error types for the Meridian Core library.

use thiserror::Error;

/// The main error type for Meridian Core operations.
#[derive(Error, Debug)]
pub enum MeridianError {
    /// Error during coordinate reference system transformation
    #[error("CRS transformation error: {0}")]
    TransformError(String),

    /// Invalid coordinate reference system specification
    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    /// Error during projection operations
    #[error("Projection error: {0}")]
    ProjectionError(String),
}

/// A specialized Result type for Meridian Core operations.
pub type Result<T> = std::result::Result<T, MeridianError>;

impl From<proj::ProjError> for MeridianError {
    fn from(err: proj::ProjError) -> Self {
        MeridianError::ProjectionError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeridianError::InvalidCrs("bogus".to_string());
        assert_eq!(err.to_string(), "Invalid CRS: bogus");
    }
}
