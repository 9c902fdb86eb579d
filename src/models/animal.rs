use chrono::{DateTime, Datelike, NaiveDate, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::db::seed;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Animal {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    /// Ear tag identifier.
    pub brinco: String,
    pub name: Option<String>,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Animal {
    /// Whole months between birth and `today`; `None` without a birth date.
    pub fn age_in_months(&self, today: NaiveDate) -> Option<i32> {
        let birth = self.birth_date?;
        let mut months = (today.year() - birth.year()) * 12 + today.month() as i32
            - birth.month() as i32;
        if today.day() < birth.day() {
            months -= 1;
        }
        Some(months)
    }

    pub fn lifetime_stage(&self, today: NaiveDate) -> Option<&'static str> {
        self.age_in_months(today)
            .and_then(seed::slot_for_age)
            .map(|slot| slot.code)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewAnimal {
    #[garde(length(min = 1, max = 64))]
    pub brinco: String,

    #[garde(length(max = 200))]
    pub name: Option<String>,

    #[garde(length(max = 100))]
    pub breed: Option<String>,

    #[garde(length(max = 16))]
    pub sex: Option<String>,

    #[garde(skip)]
    pub birth_date: Option<NaiveDate>,

    #[garde(range(min = 0.0, max = 5000.0))]
    pub weight_kg: Option<f64>,

    #[garde(length(max = 2000))]
    pub notes: Option<String>,
}

/// Animal as returned by the API, with its current life stage.
#[derive(Debug, Serialize)]
pub struct AnimalResponse {
    #[serde(flatten)]
    pub animal: Animal,
    pub lifetime_stage: Option<&'static str>,
}

impl AnimalResponse {
    pub fn new(animal: Animal, today: NaiveDate) -> Self {
        let lifetime_stage = animal.lifetime_stage(today);
        Self {
            animal,
            lifetime_stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animal_born(birth: Option<NaiveDate>) -> Animal {
        Animal {
            id: 1,
            user_id: 1,
            brinco: "BR-0001".to_string(),
            name: None,
            breed: Some("Nelore".to_string()),
            sex: Some("F".to_string()),
            birth_date: birth,
            weight_kg: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn age_counts_completed_months() {
        let animal = animal_born(NaiveDate::from_ymd_opt(2024, 3, 15));
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(animal.age_in_months(today), Some(11));
        assert_eq!(animal.lifetime_stage(today), Some("weaner"));

        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(animal.age_in_months(today), Some(12));
        assert_eq!(animal.lifetime_stage(today), Some("yearling"));
    }

    #[test]
    fn unknown_birth_date_has_no_stage() {
        let animal = animal_born(None);
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(animal.lifetime_stage(today), None);
    }
}
