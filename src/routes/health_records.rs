use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use garde::Validate;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::health_record::{HealthRecord, NewHealthRecord};

use super::auth::AuthUser;
use super::{db_error, invalid};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/health-records",
        get(list_health_records).post(create_health_record),
    )
}

/// GET /api/health-records
pub async fn list_health_records(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<HealthRecord>>, StatusCode> {
    queries::list_health_records(&state.db, user.id)
        .await
        .map(Json)
        .map_err(db_error)
}

/// POST /api/health-records
pub async fn create_health_record(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NewHealthRecord>,
) -> Result<(StatusCode, Json<HealthRecord>), StatusCode> {
    req.validate().map_err(invalid)?;
    if let Some(animal_id) = req.animal_id {
        // Records may only point at the caller's own animals.
        queries::get_animal(&state.db, user.id, animal_id)
            .await
            .map_err(db_error)?
            .ok_or(StatusCode::NOT_FOUND)?;
    }
    let record = queries::create_health_record(&state.db, user.id, &req)
        .await
        .map_err(db_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}
