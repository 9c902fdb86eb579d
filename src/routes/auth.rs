use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use garde::Validate;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest};
use crate::services::password;

use super::{db_error, invalid};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

/// Caller identity taken from a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let claims = state.jwt.verify(token.trim()).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            StatusCode::UNAUTHORIZED
        })?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), StatusCode> {
    req.validate().map_err(invalid)?;
    let email = req.email.trim().to_lowercase();

    let hash = password::hash_password(&req.password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let user = queries::create_user(
        &state.db,
        &email,
        &hash,
        req.name.as_deref(),
        req.phone.as_deref(),
    )
    .await
    .map_err(|e| {
        let duplicate = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if duplicate {
            StatusCode::CONFLICT
        } else {
            db_error(e)
        }
    })?;

    let token = state.jwt.issue(user.id, &user.email).map_err(|e| {
        tracing::error!(error = %e, "Token signing failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    metrics::counter!("auth_registrations_total").increment(1);
    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, StatusCode> {
    req.validate().map_err(invalid)?;
    let email = req.email.trim().to_lowercase();

    let user = queries::find_user_by_email(&state.db, &email)
        .await
        .map_err(db_error)?;

    let Some(user) = user.filter(|u| password::verify_password(&req.password, &u.password_hash))
    else {
        metrics::counter!("auth_logins_total", "outcome" => "rejected").increment(1);
        return Err(StatusCode::UNAUTHORIZED);
    };

    let token = state.jwt.issue(user.id, &user.email).map_err(|e| {
        tracing::error!(error = %e, "Token signing failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    metrics::counter!("auth_logins_total", "outcome" => "accepted").increment(1);
    Ok(Json(AuthResponse { token, user }))
}
