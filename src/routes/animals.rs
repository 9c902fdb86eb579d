use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use garde::Validate;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::animal::{AnimalResponse, NewAnimal};

use super::auth::AuthUser;
use super::{db_error, invalid};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/animals", get(list_animals).post(create_animal))
        .route("/api/animals/{id}", get(get_animal).delete(delete_animal))
}

/// GET /api/animals
pub async fn list_animals(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AnimalResponse>>, StatusCode> {
    let today = Utc::now().date_naive();
    let animals = queries::list_animals(&state.db, user.id)
        .await
        .map_err(db_error)?;
    Ok(Json(
        animals
            .into_iter()
            .map(|animal| AnimalResponse::new(animal, today))
            .collect(),
    ))
}

/// POST /api/animals
pub async fn create_animal(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NewAnimal>,
) -> Result<(StatusCode, Json<AnimalResponse>), StatusCode> {
    req.validate().map_err(invalid)?;
    let animal = queries::create_animal(&state.db, user.id, &req)
        .await
        .map_err(db_error)?;
    tracing::info!(user_id = user.id, animal_id = animal.id, "Animal created");
    Ok((
        StatusCode::CREATED,
        Json(AnimalResponse::new(animal, Utc::now().date_naive())),
    ))
}

/// GET /api/animals/{id}
pub async fn get_animal(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AnimalResponse>, StatusCode> {
    queries::get_animal(&state.db, user.id, id)
        .await
        .map_err(db_error)?
        .map(|animal| Json(AnimalResponse::new(animal, Utc::now().date_naive())))
        .ok_or(StatusCode::NOT_FOUND)
}

/// DELETE /api/animals/{id}
pub async fn delete_animal(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    if queries::delete_animal(&state.db, user.id, id)
        .await
        .map_err(db_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
