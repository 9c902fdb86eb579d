use sqlx::PgPool;
use uuid::Uuid;

use crate::models::animal::{Animal, NewAnimal};
use crate::models::health_record::{HealthRecord, NewHealthRecord};
use crate::models::lifetime_slot::LifetimeSlot;
use crate::models::payment::{NewPayment, Payment, PaymentStatus};
use crate::models::user::User;

const ANIMAL_COLUMNS: &str =
    "id, user_id, brinco, name, breed, sex, birth_date, weight_kg, notes, created_at";

/// Insert a user; a duplicate email surfaces as a unique-violation database error.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    name: Option<&str>,
    phone: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, name, phone)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, password_hash, name, phone, plan, created_at
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(phone)
    .fetch_one(pool)
    .await
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password_hash, name, phone, plan, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn list_animals(pool: &PgPool, user_id: i64) -> Result<Vec<Animal>, sqlx::Error> {
    sqlx::query_as::<_, Animal>(&format!(
        "SELECT {ANIMAL_COLUMNS} FROM animals WHERE user_id = $1 ORDER BY brinco ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get_animal(
    pool: &PgPool,
    user_id: i64,
    animal_id: i64,
) -> Result<Option<Animal>, sqlx::Error> {
    sqlx::query_as::<_, Animal>(&format!(
        "SELECT {ANIMAL_COLUMNS} FROM animals WHERE user_id = $1 AND id = $2"
    ))
    .bind(user_id)
    .bind(animal_id)
    .fetch_optional(pool)
    .await
}

pub async fn create_animal(
    pool: &PgPool,
    user_id: i64,
    animal: &NewAnimal,
) -> Result<Animal, sqlx::Error> {
    sqlx::query_as::<_, Animal>(&format!(
        r#"
        INSERT INTO animals (user_id, brinco, name, breed, sex, birth_date, weight_kg, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {ANIMAL_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&animal.brinco)
    .bind(&animal.name)
    .bind(&animal.breed)
    .bind(&animal.sex)
    .bind(animal.birth_date)
    .bind(animal.weight_kg)
    .bind(&animal.notes)
    .fetch_one(pool)
    .await
}

/// Returns whether a row was removed.
pub async fn delete_animal(pool: &PgPool, user_id: i64, animal_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM animals WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(animal_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_health_records(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<HealthRecord>, sqlx::Error> {
    sqlx::query_as::<_, HealthRecord>(
        r#"
        SELECT id, user_id, animal_id, brinco, type, product, date, notes, created_at
        FROM health_records
        WHERE user_id = $1
        ORDER BY date DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn create_health_record(
    pool: &PgPool,
    user_id: i64,
    record: &NewHealthRecord,
) -> Result<HealthRecord, sqlx::Error> {
    sqlx::query_as::<_, HealthRecord>(
        r#"
        INSERT INTO health_records (user_id, animal_id, brinco, type, product, date, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, animal_id, brinco, type, product, date, notes, created_at
        "#,
    )
    .bind(user_id)
    .bind(record.animal_id)
    .bind(&record.brinco)
    .bind(&record.kind)
    .bind(&record.product)
    .bind(record.date)
    .bind(&record.notes)
    .fetch_one(pool)
    .await
}

pub async fn list_payments(pool: &PgPool, user_id: i64) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, user_id, amount_cents, currency, status, method, reference, paid_at, created_at
        FROM payments
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Record a pending payment under a fresh external reference.
pub async fn create_payment(
    pool: &PgPool,
    user_id: i64,
    payment: &NewPayment,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (user_id, amount_cents, currency, status, method, reference)
        VALUES ($1, $2, COALESCE($3, 'BRL'), $4, $5, $6)
        RETURNING id, user_id, amount_cents, currency, status, method, reference, paid_at, created_at
        "#,
    )
    .bind(user_id)
    .bind(payment.amount_cents)
    .bind(payment.currency.as_deref().map(str::to_uppercase))
    .bind(PaymentStatus::Pending.to_string())
    .bind(&payment.method)
    .bind(Uuid::new_v4().to_string())
    .fetch_one(pool)
    .await
}

pub async fn list_lifetime_slots(pool: &PgPool) -> Result<Vec<LifetimeSlot>, sqlx::Error> {
    sqlx::query_as::<_, LifetimeSlot>(
        r#"
        SELECT id, code, label, min_age_months, max_age_months, position
        FROM lifetime_slots
        ORDER BY position ASC
        "#,
    )
    .fetch_all(pool)
    .await
}
