//! `GET /lidar/chm/:id` — serves a previously rendered CHM PNG overlay.
//! The `.png` suffix is accepted and stripped; neither form requires auth.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio::fs;

use crate::error::ServerResult;
use crate::state::AppState;

pub async fn chm_image(State(state): State<AppState>, Path(id): Path<String>) -> ServerResult<Response> {
    let id = id.strip_suffix(".png").unwrap_or(&id);
    let path = state.lidar.chm_image_path(id).await?;
    let bytes = fs::read(&path).await.map_err(|e| crate::error::ServerError::NotFound(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}
