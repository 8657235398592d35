//! Error types and HTTP mapping for the tile and polygon-analysis service.
//!
//! Client-facing messages are a short, fixed category string per variant —
//! the underlying detail is logged via `tracing` but never serialized into
//! the response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// The error surface for the tile and polygon-analysis service.
///
/// `CacheError` has no variant here: cache reads that fail are treated as a
/// miss and cache writes that fail are swallowed, both resolved at the call
/// site before a `ServerError` would ever be constructed.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed request: unparseable coordinates, invalid GeoJSON, an
    /// admin layer outside the allow-list, a polygon too large to analyze.
    #[error("bad input: {0}")]
    BadInput(String),

    /// A protected route was called without an identity on the request
    /// context.
    #[error("unauthorized")]
    Unauthorized,

    /// A database query failed.
    #[error("query error: {0}")]
    QueryError(String),

    /// An external service (tile index, raster endpoint) failed or
    /// returned an unusable response.
    #[error("upstream error: {0}")]
    UpstreamError(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was canceled before completion; no partial results were
    /// written. Never actually reaches a client — the connection is gone by
    /// the time this would be constructed — but kept so task-group
    /// cancellation has a typed outcome to propagate internally.
    #[error("canceled")]
    Canceled,

    /// Configuration, I/O, or serialization failures that have no more
    /// specific client-facing category. Surfaces as a generic 500, same as
    /// `QueryError`.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short category string; never the underlying error detail.
    pub code: String,
    pub message: String,
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadInput(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::QueryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::UpstreamError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Canceled => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadInput(_) => "BAD_INPUT",
            ServerError::Unauthorized => "UNAUTHORIZED",
            ServerError::QueryError(_) => "QUERY_ERROR",
            ServerError::UpstreamError(_) => "UPSTREAM_ERROR",
            ServerError::NotFound(_) => "NOT_FOUND",
            ServerError::Canceled => "CANCELED",
            ServerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The fixed, detail-free message sent to clients.
    fn client_message(&self) -> &'static str {
        match self {
            ServerError::BadInput(_) => "the request could not be processed",
            ServerError::Unauthorized => "authentication required",
            ServerError::QueryError(_) => "a server error occurred",
            ServerError::UpstreamError(_) => "a server error occurred",
            ServerError::NotFound(_) => "resource not found",
            ServerError::Canceled => "request canceled",
            ServerError::Internal(_) => "a server error occurred",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.client_message().to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match status {
            StatusCode::INTERNAL_SERVER_ERROR => tracing::error!("{}", self),
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => tracing::debug!("{}", self),
            _ => tracing::warn!("{}", self),
        }

        (status, Json(self.to_response())).into_response()
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadInput(err.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl From<meridian_db::DbError> for ServerError {
    fn from(err: meridian_db::DbError) -> Self {
        match err {
            meridian_db::DbError::NotFound(msg) => ServerError::NotFound(msg),
            other => ServerError::QueryError(other.to_string()),
        }
    }
}

impl From<meridian_vector_tiles::Error> for ServerError {
    fn from(err: meridian_vector_tiles::Error) -> Self {
        match err {
            meridian_vector_tiles::Error::LayerNotFound(msg) => ServerError::BadInput(msg),
            meridian_vector_tiles::Error::InvalidCoordinate(msg) => ServerError::BadInput(msg),
            meridian_vector_tiles::Error::InvalidZoom { .. } => ServerError::BadInput(err.to_string()),
            other => ServerError::QueryError(other.to_string()),
        }
    }
}

impl From<meridian_analysis::AnalysisError> for ServerError {
    fn from(err: meridian_analysis::AnalysisError) -> Self {
        use meridian_analysis::AnalysisError;

        match err {
            AnalysisError::InvalidGeometry(msg) => ServerError::BadInput(msg),
            AnalysisError::InvalidParameters(msg) => ServerError::BadInput(msg),
            AnalysisError::ComputationError(msg) => ServerError::QueryError(msg),
            AnalysisError::CoreError(msg) => ServerError::QueryError(msg),
            AnalysisError::IoError(_) | AnalysisError::SerializationError(_) => {
                ServerError::QueryError(err.to_string())
            }
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<meridian_lidar::LidarError> for ServerError {
    fn from(err: meridian_lidar::LidarError) -> Self {
        match err {
            meridian_lidar::LidarError::BadInput(msg) => ServerError::BadInput(msg),
            meridian_lidar::LidarError::NotFound(msg) => ServerError::NotFound(msg),
            meridian_lidar::LidarError::Upstream(msg) => ServerError::UpstreamError(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_the_error_kind_table() {
        assert_eq!(ServerError::BadInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServerError::QueryError("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ServerError::UpstreamError("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ServerError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn client_message_never_echoes_the_backend_detail() {
        let err = ServerError::QueryError("relation forest_parcels does not exist".to_string());
        let response = err.to_response();
        assert!(!response.message.contains("relation"));
        assert_eq!(response.code, "QUERY_ERROR");
    }
}
