use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub method: Option<String>,
    pub reference: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewPayment {
    #[garde(range(min = 1))]
    pub amount_cents: i64,

    #[garde(length(equal = 3))]
    pub currency: Option<String>,

    #[garde(length(max = 32))]
    pub method: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_text() {
        assert_eq!(PaymentStatus::Refunded.to_string(), "refunded");
        assert_eq!("paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert!("settled".parse::<PaymentStatus>().is_err());
    }
}
