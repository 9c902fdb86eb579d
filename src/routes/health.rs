use axum::Json;
use serde::Serialize;

pub const LIVE_STATUS: &str = "ZapManejo backend live";

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// GET / — fixed payload, answered without touching the database.
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: LIVE_STATUS,
    })
}
