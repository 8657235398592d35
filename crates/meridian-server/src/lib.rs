//! Meridian Server — tile serving, polygon-composition analysis, and the
//! LiDAR canopy-height-model pipeline, exposed over HTTP.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use state::AppState;

/// Initializes the server: builds application state then the router.
pub async fn init_server(config: ServerConfig) -> ServerResult<Router> {
    info!("Initializing Meridian tile/analysis server v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config.clone()).await?;
    let app = build_router(state, &config)?;

    info!("Meridian server initialized successfully");
    Ok(app)
}

/// Builds the main application router with all routes and middleware.
fn build_router(state: AppState, config: &ServerConfig) -> ServerResult<Router> {
    let cors = build_cors_layer(config)?;

    let app = routes::app_routes(state.clone())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::logging::RequestLogging::layer))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(cors);

    Ok(app)
}

/// Builds the CORS layer from configuration.
fn build_cors_layer(config: &ServerConfig) -> ServerResult<CorsLayer> {
    use tower_http::cors::Any;

    let mut cors = CorsLayer::new();

    if config.cors.allow_any_origin {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<http::HeaderValue> =
            config.cors.allowed_origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors = cors.allow_origin(origins);
    }

    let methods: Vec<http::Method> = config.cors.allowed_methods.iter().filter_map(|m| m.parse().ok()).collect();
    cors = cors.allow_methods(methods);

    let headers: Vec<http::header::HeaderName> =
        config.cors.allowed_headers.iter().filter_map(|h| h.parse().ok()).collect();
    cors = cors.allow_headers(headers);

    if config.cors.allow_credentials {
        cors = cors.allow_credentials(true);
    }

    Ok(cors)
}

/// Starts the server and listens on the configured address.
pub async fn serve(config: ServerConfig) -> ServerResult<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Internal(format!("invalid host/port: {e}")))?;

    info!("Starting Meridian server on {}", addr);

    let app = init_server(config.clone()).await?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Internal(format!("failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Internal(format!("server error: {e}")))?;

    warn!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a reachable PostGIS database"]
    async fn test_server_initialization() {
        let config = ServerConfig::default();
        let result = init_server(config).await;
        assert!(result.is_ok());
    }
}
