use async_trait::async_trait;
use sqlx::PgPool;

/// One reference row of the `lifetime_slots` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifetimeSlotSeed {
    pub code: &'static str,
    pub label: &'static str,
    pub min_age_months: i32,
    /// `None` means the slot has no upper bound.
    pub max_age_months: Option<i32>,
    pub position: i32,
}

pub const LIFETIME_SLOTS: &[LifetimeSlotSeed] = &[
    LifetimeSlotSeed {
        code: "calf",
        label: "Calf",
        min_age_months: 0,
        max_age_months: Some(8),
        position: 1,
    },
    LifetimeSlotSeed {
        code: "weaner",
        label: "Weaner",
        min_age_months: 8,
        max_age_months: Some(12),
        position: 2,
    },
    LifetimeSlotSeed {
        code: "yearling",
        label: "Yearling",
        min_age_months: 12,
        max_age_months: Some(24),
        position: 3,
    },
    LifetimeSlotSeed {
        code: "young_adult",
        label: "Young adult",
        min_age_months: 24,
        max_age_months: Some(36),
        position: 4,
    },
    LifetimeSlotSeed {
        code: "adult",
        label: "Adult",
        min_age_months: 36,
        max_age_months: None,
        position: 5,
    },
];

/// Slot whose `[min, max)` range holds `age_months`.
pub fn slot_for_age(age_months: i32) -> Option<&'static LifetimeSlotSeed> {
    LIFETIME_SLOTS.iter().find(|slot| {
        age_months >= slot.min_age_months && slot.max_age_months.map_or(true, |max| age_months < max)
    })
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to count lifetime slots: {0}")]
    Count(#[source] sqlx::Error),

    #[error("Failed to insert lifetime slots: {0}")]
    Insert(#[source] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Inserted(usize),
    AlreadySeeded(i64),
    Skipped,
}

#[async_trait]
pub trait SeedStore: Send + Sync {
    async fn count_lifetime_slots(&self) -> Result<i64, sqlx::Error>;

    /// Insert every slot or none of them.
    async fn insert_lifetime_slots(&self, slots: &[LifetimeSlotSeed]) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl SeedStore for PgPool {
    async fn count_lifetime_slots(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM lifetime_slots")
            .fetch_one(self)
            .await
    }

    async fn insert_lifetime_slots(&self, slots: &[LifetimeSlotSeed]) -> Result<(), sqlx::Error> {
        let mut tx = self.begin().await?;
        for slot in slots {
            sqlx::query(
                r#"
                INSERT INTO lifetime_slots (code, label, min_age_months, max_age_months, position)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (code) DO NOTHING
                "#,
            )
            .bind(slot.code)
            .bind(slot.label)
            .bind(slot.min_age_months)
            .bind(slot.max_age_months)
            .bind(slot.position)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }
}

pub async fn try_seed_lifetime_slots<S>(store: &S) -> Result<SeedOutcome, SeedError>
where
    S: SeedStore + ?Sized,
{
    let existing = store
        .count_lifetime_slots()
        .await
        .map_err(SeedError::Count)?;
    if existing > 0 {
        return Ok(SeedOutcome::AlreadySeeded(existing));
    }

    store
        .insert_lifetime_slots(LIFETIME_SLOTS)
        .await
        .map_err(SeedError::Insert)?;
    Ok(SeedOutcome::Inserted(LIFETIME_SLOTS.len()))
}

/// Populate `lifetime_slots` only when it is empty. Errors degrade to a warning.
pub async fn seed_lifetime_slots<S>(store: &S) -> SeedOutcome
where
    S: SeedStore + ?Sized,
{
    match try_seed_lifetime_slots(store).await {
        Ok(SeedOutcome::Inserted(n)) => {
            tracing::info!(inserted = n, "Lifetime slots seeded");
            metrics::gauge!("lifetime_slots_seeded").set(n as f64);
            SeedOutcome::Inserted(n)
        }
        Ok(outcome) => {
            tracing::info!("Lifetime slots already present, skipping seed");
            outcome
        }
        Err(e) => {
            tracing::warn!(error = %e, "Lifetime slot seeding failed; continuing without seed data");
            SeedOutcome::Skipped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate::fake::FakeStore;

    #[tokio::test]
    async fn seeding_twice_keeps_row_count() {
        let store = FakeStore::default();

        assert_eq!(
            seed_lifetime_slots(&store).await,
            SeedOutcome::Inserted(LIFETIME_SLOTS.len())
        );
        let after_first = store.slots.lock().unwrap().len();

        assert_eq!(
            seed_lifetime_slots(&store).await,
            SeedOutcome::AlreadySeeded(after_first as i64)
        );
        assert_eq!(store.slots.lock().unwrap().len(), after_first);
    }

    #[tokio::test]
    async fn non_empty_table_is_left_alone() {
        let store = FakeStore::default();
        store.slots.lock().unwrap().push(LIFETIME_SLOTS[0].clone());

        assert_eq!(seed_lifetime_slots(&store).await, SeedOutcome::AlreadySeeded(1));
        assert_eq!(store.slots.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_failure_is_not_fatal() {
        let store = FakeStore {
            fail_seed_insert: true,
            ..Default::default()
        };
        assert_eq!(seed_lifetime_slots(&store).await, SeedOutcome::Skipped);
        assert!(matches!(
            try_seed_lifetime_slots(&store).await,
            Err(SeedError::Insert(_))
        ));
    }

    #[test]
    fn slots_cover_every_age_without_gaps() {
        for pair in LIFETIME_SLOTS.windows(2) {
            assert_eq!(pair[0].max_age_months, Some(pair[1].min_age_months));
        }
        assert_eq!(slot_for_age(0).map(|s| s.code), Some("calf"));
        assert_eq!(slot_for_age(8).map(|s| s.code), Some("weaner"));
        assert_eq!(slot_for_age(23).map(|s| s.code), Some("yearling"));
        assert_eq!(slot_for_age(240).map(|s| s.code), Some("adult"));
        assert_eq!(slot_for_age(-1), None);
    }
}
