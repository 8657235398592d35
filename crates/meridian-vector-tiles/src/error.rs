//! Error types for vector tile operations

/// Result type alias for vector tile operations
pub type Result<T> = std::result::Result<T, Error>;

/// Vector tile error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A path segment failed to parse into a valid tile coordinate.
    #[error("Invalid tile coordinate: {0}")]
    InvalidCoordinate(String),

    /// Requested zoom level is outside the supported range.
    #[error("Invalid zoom level: {zoom} (min: {min}, max: {max})")]
    InvalidZoom { zoom: u8, min: u8, max: u8 },

    /// The admin-layer path segment isn't in the closed allow-list.
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    /// The backing tile query failed.
    #[error("tile query failed: {0}")]
    TileQuery(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::InvalidZoom {
            zoom: 30,
            min: 0,
            max: 24,
        };
        assert_eq!(err.to_string(), "Invalid zoom level: 30 (min: 0, max: 24)");
    }
}
