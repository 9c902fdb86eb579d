use serde::{Deserialize, Serialize};

/// Stored life-stage bucket; rows come from `db::seed::LIFETIME_SLOTS`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LifetimeSlot {
    pub id: i64,
    pub code: String,
    pub label: String,
    pub min_age_months: i32,
    pub max_age_months: Option<i32>,
    pub position: i32,
}
