use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod animals;
pub mod auth;
pub mod health;
pub mod health_records;
pub mod lifetime_slots;
pub mod metrics;
pub mod payments;
pub mod whatsapp;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Wire every endpoint group onto one application.
pub fn router(
    state: AppState,
    cors: CorsLayer,
    prometheus: Option<Arc<PrometheusHandle>>,
) -> Router {
    let mut app = Router::new()
        .route("/", get(health::liveness))
        .merge(auth::routes())
        .merge(animals::routes())
        .merge(health_records::routes())
        .merge(lifetime_slots::routes())
        .merge(payments::routes())
        .merge(whatsapp::routes())
        .with_state(state);

    if let Some(handle) = prometheus {
        app = app.route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(handle),
        );
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}

pub(crate) fn db_error(e: sqlx::Error) -> StatusCode {
    tracing::error!(error = %e, "Database error");
    StatusCode::INTERNAL_SERVER_ERROR
}

pub(crate) fn invalid(report: garde::Report) -> StatusCode {
    tracing::debug!(%report, "Request validation failed");
    StatusCode::UNPROCESSABLE_ENTITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cors::{cors_layer, resolve_origins};
    use crate::services::jwt::JwtService;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    const VERIFY_TOKEN: &str = "verify-me";

    /// Router over a pool that never connects: any handler touching the
    /// database would fail, so passing tests prove they did not.
    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/unreachable")
            .unwrap();
        let state = AppState::new(pool, JwtService::new("test-secret"), VERIFY_TOKEN);
        router(state, cors_layer(resolve_origins(None)), None)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn liveness_returns_fixed_payload_without_database() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "ZapManejo backend live" }));
    }

    #[tokio::test]
    async fn webhook_handshake_echoes_challenge() {
        let uri = format!(
            "/webhook/whatsapp?hub.mode=subscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=1158201444"
        );
        let response = app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "1158201444");
    }

    #[tokio::test]
    async fn webhook_handshake_rejects_wrong_token() {
        let response = app()
            .oneshot(
                Request::get("/webhook/whatsapp?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn webhook_event_is_acknowledged() {
        let payload = serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [
                            { "from": "5511999999999", "type": "text", "text": { "body": "vacinei o lote 3" } }
                        ]
                    }
                }]
            }]
        });
        let response = app()
            .oneshot(
                Request::post("/webhook/whatsapp")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "EVENT_RECEIVED");
    }

    #[tokio::test]
    async fn unreadable_webhook_payload_is_still_acknowledged() {
        for (content_type, body) in [
            ("application/json", "not json"),
            ("text/plain", "{\"object\": \"whatsapp_business_account\"}"),
            ("application/json", "{\"entry\": \"wrong shape\"}"),
        ] {
            let response = app()
                .oneshot(
                    Request::post("/webhook/whatsapp")
                        .header(header::CONTENT_TYPE, content_type)
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{body}");
            assert_eq!(body_string(response).await, "EVENT_RECEIVED");
        }
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/animals", "/api/health-records", "/api/payments"] {
            let response = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }

        let response = app()
            .oneshot(
                Request::get("/api/animals")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn cors_preflight_admits_default_origin() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/animals")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }
}
