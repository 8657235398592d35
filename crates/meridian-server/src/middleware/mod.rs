//! Middleware components for request processing
//!
//! This module contains middleware for authentication, logging, and other
//! cross-cutting concerns.

pub mod auth;
pub mod logging;

pub use auth::require_identity;
pub use logging::RequestLogging;

use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

/// Request ID middleware
///
/// Adds a unique request ID to each request for tracing
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    // Add request ID to extensions
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let response = next.run(req).await;

    // Add request ID to response headers
    let mut response = response;
    response.headers_mut().insert(
        "X-Request-ID",
        request_id.parse().unwrap(),
    );

    response
}

/// Request ID type
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_id() {
        let id = RequestId(Uuid::new_v4().to_string());
        assert!(!id.as_str().is_empty());
    }
}
