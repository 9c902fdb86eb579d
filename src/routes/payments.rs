use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use garde::Validate;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::payment::{NewPayment, Payment};

use super::auth::AuthUser;
use super::{db_error, invalid};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/payments", get(list_payments).post(create_payment))
}

/// GET /api/payments
pub async fn list_payments(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Payment>>, StatusCode> {
    queries::list_payments(&state.db, user.id)
        .await
        .map(Json)
        .map_err(db_error)
}

/// POST /api/payments — records a pending payment awaiting provider confirmation.
pub async fn create_payment(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NewPayment>,
) -> Result<(StatusCode, Json<Payment>), StatusCode> {
    req.validate().map_err(invalid)?;
    let payment = queries::create_payment(&state.db, user.id, &req)
        .await
        .map_err(db_error)?;
    tracing::info!(
        user_id = user.id,
        reference = %payment.reference,
        amount_cents = payment.amount_cents,
        "Payment recorded"
    );
    Ok((StatusCode::CREATED, Json(payment)))
}
