//! `/tiles/foret`, `/tiles/admin`, and `/tiles/cadastre` handlers.
//!
//! Every handler parses the path into a [`meridian_vector_tiles::TileRequest`]
//! before touching the producer, so malformed coordinates or an
//! out-of-allow-list admin layer fail fast as `400` without a database
//! round trip. An empty tile (no intersecting features) is `204 No
//! Content`; a non-empty tile is `200` with an MVT body.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use meridian_vector_tiles::TileRequest;

use crate::error::ServerResult;
use crate::state::AppState;

const MVT_CONTENT_TYPE: &str = "application/vnd.mapbox-vector-tile";

async fn serve(state: &AppState, request: TileRequest) -> ServerResult<Response> {
    let bytes = state.tiles.produce(&request).await?;

    if bytes.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(([(header::CONTENT_TYPE, MVT_CONTENT_TYPE)], bytes).into_response())
}

pub async fn forest_tile(
    State(state): State<AppState>,
    Path((z, x, y)): Path<(String, String, String)>,
) -> ServerResult<Response> {
    let request = TileRequest::forest(&z, &x, &y)?;
    serve(&state, request).await
}

pub async fn cadastre_tile(
    State(state): State<AppState>,
    Path((z, x, y)): Path<(String, String, String)>,
) -> ServerResult<Response> {
    let request = TileRequest::cadastre(&z, &x, &y)?;
    serve(&state, request).await
}

pub async fn admin_tile(
    State(state): State<AppState>,
    Path((layer, z, x, y)): Path<(String, String, String, String)>,
) -> ServerResult<Response> {
    let request = TileRequest::admin(&layer, &z, &x, &y)?;
    serve(&state, request).await
}
