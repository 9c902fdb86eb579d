use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// A vaccination, deworming or treatment event.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HealthRecord {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animal_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brinco: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub product: Option<String>,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewHealthRecord {
    #[garde(skip)]
    pub animal_id: Option<i64>,

    #[garde(length(max = 64))]
    pub brinco: Option<String>,

    #[serde(rename = "type")]
    #[garde(length(min = 1, max = 100))]
    pub kind: String,

    #[garde(length(max = 200))]
    pub product: Option<String>,

    #[garde(skip)]
    pub date: DateTime<Utc>,

    #[garde(length(max = 2000))]
    pub notes: Option<String>,
}
