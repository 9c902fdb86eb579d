use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::{BTreeMap, BTreeSet};

use super::schema::{
    column_index_name, column_index_statement, ColumnDef, IndexDef, SchemaDescriptor, TableDef,
    SCHEMA,
};
use super::seed::{self, SeedStore};

/// Live columns per table and index names, as reported by the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSchema {
    tables: BTreeMap<String, BTreeSet<String>>,
    indexes: BTreeSet<String>,
}

impl LiveSchema {
    pub fn insert(&mut self, table: impl Into<String>, column: impl Into<String>) {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(column.into());
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.tables
            .get(table)
            .is_some_and(|columns| columns.contains(column))
    }

    pub fn insert_index(&mut self, name: impl Into<String>) {
        self.indexes.insert(name.into());
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains(name)
    }
}

/// Structural changes needed to bring a live schema in line with the descriptor.
#[derive(Debug, Default)]
pub struct MigrationPlan {
    pub create_tables: Vec<&'static TableDef>,
    pub add_columns: Vec<(&'static TableDef, &'static ColumnDef)>,
    /// Per-column indexes missing on tables that already exist.
    pub add_indexes: Vec<(&'static TableDef, &'static ColumnDef)>,
}

impl MigrationPlan {
    /// Diff declared tables against the live schema. Undeclared live columns are left alone.
    pub fn compute(descriptor: &SchemaDescriptor, live: &LiveSchema) -> Self {
        let mut plan = MigrationPlan::default();
        for table in descriptor.tables {
            if !live.has_table(table.name) {
                plan.create_tables.push(table);
                continue;
            }
            for column in table.columns {
                if !live.has_column(table.name, column.name) {
                    plan.add_columns.push((table, column));
                }
                if column.indexed && !live.has_index(&column_index_name(table.name, column.name)) {
                    plan.add_indexes.push((table, column));
                }
            }
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.create_tables.is_empty() && self.add_columns.is_empty() && self.add_indexes.is_empty()
    }

    /// DDL in execution order. Every statement is guarded so a re-run is harmless.
    pub fn statements(&self) -> Vec<String> {
        let mut statements = Vec::new();
        for table in &self.create_tables {
            statements.push(table.create_statement());
            statements.extend(table.column_index_statements());
        }
        for (table, column) in &self.add_columns {
            statements.push(format!(
                "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {}",
                table.name,
                column.added_definition()
            ));
        }
        for (table, column) in &self.add_indexes {
            statements.push(column_index_statement(table.name, column.name));
        }
        statements
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("Failed to inspect database schema: {0}")]
    Inspect(#[source] sqlx::Error),

    #[error("Failed to migrate database schema: {0}")]
    Apply(#[source] sqlx::Error),
}

/// Read and change table structure. Implemented for `PgPool`; tests use fakes.
#[async_trait]
pub trait SchemaInspector: Send + Sync {
    async fn live_schema(&self, tables: &[String]) -> Result<LiveSchema, sqlx::Error>;

    /// Run all statements atomically.
    async fn apply(&self, statements: &[String]) -> Result<(), sqlx::Error>;

    async fn create_index(&self, index: &IndexDef) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl SchemaInspector for PgPool {
    async fn live_schema(&self, tables: &[String]) -> Result<LiveSchema, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT table_name::TEXT AS table_name, column_name::TEXT AS column_name
            FROM information_schema.columns
            WHERE table_schema = current_schema()
              AND table_name::TEXT = ANY($1)
            "#,
        )
        .bind(tables.to_vec())
        .fetch_all(self)
        .await?;

        let mut live = LiveSchema::default();
        for row in rows {
            let table: String = row.try_get("table_name")?;
            let column: String = row.try_get("column_name")?;
            live.insert(table, column);
        }

        let indexes: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT indexname::TEXT
            FROM pg_indexes
            WHERE schemaname = current_schema()
              AND tablename::TEXT = ANY($1)
            "#,
        )
        .bind(tables.to_vec())
        .fetch_all(self)
        .await?;
        for name in indexes {
            live.insert_index(name);
        }
        Ok(live)
    }

    async fn apply(&self, statements: &[String]) -> Result<(), sqlx::Error> {
        let mut tx = self.begin().await?;
        for statement in statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await
    }

    async fn create_index(&self, index: &IndexDef) -> Result<(), sqlx::Error> {
        sqlx::query(&index.create_statement()).execute(self).await?;
        Ok(())
    }
}

/// Reconcile the structure of every declared table. Returns the plan that was applied.
pub async fn migrate_schema<S>(
    store: &S,
    descriptor: &SchemaDescriptor,
) -> Result<MigrationPlan, MigrateError>
where
    S: SchemaInspector + ?Sized,
{
    let live = store
        .live_schema(&descriptor.table_names())
        .await
        .map_err(MigrateError::Inspect)?;

    let plan = MigrationPlan::compute(descriptor, &live);
    if plan.is_empty() {
        tracing::info!("Database schema already up to date");
        return Ok(plan);
    }

    tracing::info!(
        create_tables = plan.create_tables.len(),
        add_columns = plan.add_columns.len(),
        add_indexes = plan.add_indexes.len(),
        "Applying schema changes"
    );
    store
        .apply(&plan.statements())
        .await
        .map_err(MigrateError::Apply)?;
    Ok(plan)
}

/// Create the supplementary indexes. Failures are logged and skipped.
/// Returns how many indexes are confirmed present.
pub async fn ensure_indexes<S>(store: &S, indexes: &[IndexDef]) -> usize
where
    S: SchemaInspector + ?Sized,
{
    let mut created = 0;
    for index in indexes {
        match store.create_index(index).await {
            Ok(()) => created += 1,
            Err(e) => tracing::warn!(index = index.name, error = %e, "Failed to create index"),
        }
    }
    created
}

/// Full startup reconciliation: structure (fatal), indexes (warn), seed data (warn).
pub async fn run_with<S>(store: &S, descriptor: &SchemaDescriptor) -> Result<(), MigrateError>
where
    S: SchemaInspector + SeedStore + ?Sized,
{
    tracing::info!("Starting database migration");
    migrate_schema(store, descriptor).await?;
    tracing::info!("Database schema migrated successfully");

    tracing::info!("Creating indexes");
    let created = ensure_indexes(store, descriptor.indexes).await;
    tracing::info!(created, total = descriptor.indexes.len(), "Indexes ensured");

    tracing::info!("Seeding lifetime slots");
    seed::seed_lifetime_slots(store).await;

    tracing::info!("Migration completed successfully");
    Ok(())
}

pub async fn run(pool: &PgPool) -> Result<(), MigrateError> {
    run_with(pool, &SCHEMA).await
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::db::seed::LifetimeSlotSeed;
    use std::sync::Mutex;

    /// In-memory stand-in that executes DDL by updating a `LiveSchema`.
    #[derive(Default)]
    pub struct FakeStore {
        pub live: Mutex<LiveSchema>,
        pub indexes: Mutex<BTreeSet<String>>,
        pub applied: Mutex<Vec<String>>,
        pub slots: Mutex<Vec<LifetimeSlotSeed>>,
        pub fail_apply: bool,
        pub fail_index: bool,
        pub fail_seed_insert: bool,
    }

    #[async_trait]
    impl SchemaInspector for FakeStore {
        async fn live_schema(&self, _tables: &[String]) -> Result<LiveSchema, sqlx::Error> {
            Ok(self.live.lock().unwrap().clone())
        }

        async fn apply(&self, statements: &[String]) -> Result<(), sqlx::Error> {
            if self.fail_apply {
                return Err(sqlx::Error::Protocol("permission denied".into()));
            }
            self.applied.lock().unwrap().extend(statements.iter().cloned());
            // Mirror the effect of the DDL on the fake's view of the schema.
            let mut live = self.live.lock().unwrap();
            for table in SCHEMA.tables {
                for column in table.columns {
                    live.insert(table.name, column.name);
                    if column.indexed {
                        live.insert_index(column_index_name(table.name, column.name));
                    }
                }
            }
            Ok(())
        }

        async fn create_index(&self, index: &IndexDef) -> Result<(), sqlx::Error> {
            if self.fail_index {
                return Err(sqlx::Error::Protocol("must be owner of table animals".into()));
            }
            self.indexes.lock().unwrap().insert(index.name.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl SeedStore for FakeStore {
        async fn count_lifetime_slots(&self) -> Result<i64, sqlx::Error> {
            Ok(self.slots.lock().unwrap().len() as i64)
        }

        async fn insert_lifetime_slots(&self, slots: &[LifetimeSlotSeed]) -> Result<(), sqlx::Error> {
            if self.fail_seed_insert {
                return Err(sqlx::Error::Protocol("read-only transaction".into()));
            }
            self.slots.lock().unwrap().extend(slots.iter().cloned());
            Ok(())
        }
    }
}
