use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::jwt::JwtService;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt: Arc<JwtService>,
    pub whatsapp_verify_token: Arc<str>,
}

impl AppState {
    pub fn new(db: PgPool, jwt: JwtService, whatsapp_verify_token: &str) -> Self {
        Self {
            db,
            jwt: Arc::new(jwt),
            whatsapp_verify_token: Arc::from(whatsapp_verify_token),
        }
    }

    pub fn from_config(db: PgPool, config: &AppConfig) -> Self {
        Self::new(
            db,
            JwtService::new(&config.jwt_secret),
            &config.whatsapp_verify_token,
        )
    }
}
