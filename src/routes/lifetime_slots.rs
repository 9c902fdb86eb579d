use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::lifetime_slot::LifetimeSlot;

use super::db_error;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/lifetime-slots", get(list_lifetime_slots))
}

/// GET /api/lifetime-slots — seeded life-stage reference data, in order.
pub async fn list_lifetime_slots(
    State(state): State<AppState>,
) -> Result<Json<Vec<LifetimeSlot>>, StatusCode> {
    queries::list_lifetime_slots(&state.db)
        .await
        .map(Json)
        .map_err(db_error)
}
