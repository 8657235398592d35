//! `GET /healthz` — liveness probe. Ambient, no spec counterpart: every
//! teacher server crate exposes one.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    status: &'static str,
    database: bool,
}

pub async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    let database = state.pool.health_check().await.is_ok();
    let status = if database { "ok" } else { "degraded" };
    let code = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (code, Json(HealthBody { status, database }))
}
