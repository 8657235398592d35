//! Error taxonomy for the LiDAR canopy-height-model pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LidarError>;

#[derive(Debug, Error)]
pub enum LidarError {
    /// The submitted polygon, or a parameter derived from it, was malformed.
    #[error("bad input: {0}")]
    BadInput(String),

    /// The tile index or raster source returned a malformed or unusable
    /// response.
    #[error("upstream service error: {0}")]
    Upstream(String),

    /// No MNS/MNT tile pair covers the requested area.
    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl LidarError {
    pub fn bad_input(msg: impl Into<String>) -> Self {
        Self::BadInput(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
