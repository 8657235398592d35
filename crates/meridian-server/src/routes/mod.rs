//! HTTP route definitions: tile serving, the `/graphql` analysis dispatch,
//! the LiDAR CHM image endpoint, and the liveness probe.

pub mod graphql;
pub mod health;
pub mod lidar;
pub mod tiles;

use axum::{middleware, routing::get, Router};

use crate::middleware::require_identity;
use crate::state::AppState;

/// Builds the full route tree.
///
/// Forest/cadastre tiles and `/graphql` require an identity on the request;
/// admin tiles, the CHM image endpoint, and the liveness probe do not.
pub fn app_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/tiles/foret/:z/:x/:y", get(tiles::forest_tile))
        .route("/tiles/cadastre/:z/:x/:y", get(tiles::cadastre_tile))
        .route("/graphql", axum::routing::post(graphql::handle))
        .layer(middleware::from_fn_with_state(state, require_identity));

    let open = Router::new()
        .route("/tiles/admin/:layer/:z/:x/:y", get(tiles::admin_tile))
        .route("/lidar/chm/:id", get(lidar::chm_image))
        .route("/healthz", get(health::healthz));

    Router::new().merge(protected).merge(open)
}
