//! Single `/graphql` POST endpoint dispatching on an `operation` field to
//! the `analyzePolygon` or `analyzeLidar` resolver. Both take the same
//! shape: a bare GeoJSON `Polygon`/`MultiPolygon` geometry.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GraphQlRequest {
    pub operation: String,
    pub geometry: Value,
}

pub async fn handle(State(state): State<AppState>, Json(body): Json<GraphQlRequest>) -> ServerResult<Json<Value>> {
    let geojson_text = body.geometry.to_string();

    match body.operation.as_str() {
        "analyzePolygon" => {
            let stats = state.analyzer.analyze(&geojson_text).await?;
            Ok(Json(serde_json::to_value(stats)?))
        }
        "analyzeLidar" => {
            let result = state.lidar.analyze(&geojson_text).await?;
            Ok(Json(serde_json::to_value(result)?))
        }
        other => Err(ServerError::BadInput(format!("unknown operation: {other}"))),
    }
}
