//! Declared relational layout. The migrator reconciles the live database
//! against `SCHEMA`; nothing else changes table structure.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub default: Option<&'static str>,
    pub references: Option<&'static str>,
    /// Plain btree index named `idx_<table>_<column>`, recreated whenever it goes missing.
    pub indexed: bool,
}

impl ColumnDef {
    pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
            unique: false,
            primary_key: false,
            default: None,
            references: None,
            indexed: false,
        }
    }

    pub const fn id() -> Self {
        Self {
            primary_key: true,
            nullable: false,
            ..Self::new("id", "BIGSERIAL")
        }
    }

    pub const fn created_at() -> Self {
        Self::new("created_at", "TIMESTAMPTZ").not_null().default("NOW()")
    }

    pub const fn not_null(self) -> Self {
        Self { nullable: false, ..self }
    }

    pub const fn unique(self) -> Self {
        Self { unique: true, ..self }
    }

    pub const fn default(self, expr: &'static str) -> Self {
        Self { default: Some(expr), ..self }
    }

    pub const fn references(self, target: &'static str) -> Self {
        Self { references: Some(target), ..self }
    }

    pub const fn indexed(self) -> Self {
        Self { indexed: true, ..self }
    }

    /// Column clause for `CREATE TABLE`.
    pub fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        self.push_tail(&mut sql);
        sql
    }

    /// Column clause for `ALTER TABLE .. ADD COLUMN` on a table that may
    /// already hold rows: `NOT NULL` only survives alongside a default.
    pub fn added_definition(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if !self.nullable && self.default.is_some() {
            sql.push_str(" NOT NULL");
        }
        self.push_tail(&mut sql);
        sql
    }

    fn push_tail(&self, sql: &mut String) {
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if let Some(target) = self.references {
            sql.push_str(" REFERENCES ");
            sql.push_str(target);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    pub fn create_statement(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDef::definition).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            columns.join(", ")
        )
    }

    pub fn column_index_statements(&self) -> impl Iterator<Item = String> + '_ {
        self.columns
            .iter()
            .filter(|c| c.indexed)
            .map(move |c| column_index_statement(self.name, c.name))
    }
}

pub fn column_index_name(table: &str, column: &str) -> String {
    format!("idx_{table}_{column}")
}

pub fn column_index_statement(table: &str, column: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {table}({column})",
        column_index_name(table, column)
    )
}

/// Secondary index that only speeds up lookups; losing it is not fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub table: &'static str,
    pub column: &'static str,
}

impl IndexDef {
    pub fn create_statement(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {}({})",
            self.name, self.table, self.column
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchemaDescriptor {
    pub tables: &'static [TableDef],
    pub indexes: &'static [IndexDef],
}

impl SchemaDescriptor {
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.to_string()).collect()
    }
}

pub const USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("email", "TEXT").not_null().unique(),
        ColumnDef::new("password_hash", "TEXT").not_null(),
        ColumnDef::new("name", "TEXT"),
        ColumnDef::new("phone", "TEXT"),
        ColumnDef::new("plan", "TEXT").not_null().default("'free'"),
        ColumnDef::created_at(),
    ],
};

pub const ANIMALS: TableDef = TableDef {
    name: "animals",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", "BIGINT")
            .not_null()
            .references("users(id)")
            .indexed(),
        ColumnDef::new("brinco", "TEXT").not_null(),
        ColumnDef::new("name", "TEXT"),
        ColumnDef::new("breed", "TEXT"),
        ColumnDef::new("sex", "TEXT"),
        ColumnDef::new("birth_date", "DATE"),
        ColumnDef::new("weight_kg", "DOUBLE PRECISION"),
        ColumnDef::new("notes", "TEXT"),
        ColumnDef::created_at(),
    ],
};

pub const HEALTH_RECORDS: TableDef = TableDef {
    name: "health_records",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", "BIGINT")
            .not_null()
            .references("users(id)")
            .indexed(),
        ColumnDef::new("animal_id", "BIGINT").references("animals(id) ON DELETE SET NULL"),
        ColumnDef::new("brinco", "TEXT"),
        ColumnDef::new("type", "TEXT").not_null(),
        ColumnDef::new("product", "TEXT"),
        ColumnDef::new("date", "TIMESTAMPTZ").not_null(),
        ColumnDef::new("notes", "TEXT"),
        ColumnDef::created_at(),
    ],
};

pub const COST_CONFIGS: TableDef = TableDef {
    name: "cost_configs",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", "BIGINT")
            .not_null()
            .references("users(id)")
            .indexed(),
        ColumnDef::new("category", "TEXT").not_null(),
        ColumnDef::new("amount_cents", "BIGINT").not_null().default("0"),
        ColumnDef::new("unit", "TEXT"),
        ColumnDef::new("notes", "TEXT"),
        ColumnDef::created_at(),
    ],
};

pub const PAYMENTS: TableDef = TableDef {
    name: "payments",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", "BIGINT")
            .not_null()
            .references("users(id)")
            .indexed(),
        ColumnDef::new("amount_cents", "BIGINT").not_null(),
        ColumnDef::new("currency", "TEXT").not_null().default("'BRL'"),
        ColumnDef::new("status", "TEXT").not_null().default("'pending'"),
        ColumnDef::new("method", "TEXT"),
        ColumnDef::new("reference", "TEXT").not_null().unique(),
        ColumnDef::new("paid_at", "TIMESTAMPTZ"),
        ColumnDef::created_at(),
    ],
};

pub const LIFETIME_SLOTS: TableDef = TableDef {
    name: "lifetime_slots",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("code", "TEXT").not_null().unique(),
        ColumnDef::new("label", "TEXT").not_null(),
        ColumnDef::new("min_age_months", "INTEGER").not_null(),
        ColumnDef::new("max_age_months", "INTEGER"),
        ColumnDef::new("position", "INTEGER").not_null(),
    ],
};

/// Tables in dependency order: referenced tables come first.
pub const SCHEMA: SchemaDescriptor = SchemaDescriptor {
    tables: &[
        USERS,
        ANIMALS,
        HEALTH_RECORDS,
        COST_CONFIGS,
        PAYMENTS,
        LIFETIME_SLOTS,
    ],
    indexes: &[
        IndexDef {
            name: "idx_animals_brinco",
            table: "animals",
            column: "brinco",
        },
        IndexDef {
            name: "idx_animals_birth",
            table: "animals",
            column: "birth_date",
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_statement_renders_constraints() {
        let sql = PAYMENTS.create_statement();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS payments ("));
        assert!(sql.contains("id BIGSERIAL PRIMARY KEY"));
        assert!(sql.contains("user_id BIGINT NOT NULL REFERENCES users(id)"));
        assert!(sql.contains("status TEXT NOT NULL DEFAULT 'pending'"));
        assert!(sql.contains("reference TEXT NOT NULL UNIQUE"));
        assert!(sql.contains("paid_at TIMESTAMPTZ,"));
    }

    #[test]
    fn added_columns_drop_not_null_without_default() {
        let brinco = ANIMALS.columns.iter().find(|c| c.name == "brinco").unwrap();
        assert_eq!(brinco.added_definition(), "brinco TEXT");

        let plan = USERS.columns.iter().find(|c| c.name == "plan").unwrap();
        assert_eq!(plan.added_definition(), "plan TEXT NOT NULL DEFAULT 'free'");
    }

    #[test]
    fn referenced_tables_are_declared_first() {
        let position = |name: &str| SCHEMA.tables.iter().position(|t| t.name == name).unwrap();
        for table in SCHEMA.tables {
            for column in table.columns {
                if let Some(target) = column.references {
                    let target_table = target.split('(').next().unwrap();
                    assert!(
                        position(target_table) < position(table.name),
                        "{} references {} before it is created",
                        table.name,
                        target_table
                    );
                }
            }
        }
    }

    #[test]
    fn supplementary_indexes_target_animals() {
        let statements: Vec<String> = SCHEMA.indexes.iter().map(IndexDef::create_statement).collect();
        assert_eq!(
            statements,
            vec![
                "CREATE INDEX IF NOT EXISTS idx_animals_brinco ON animals(brinco)",
                "CREATE INDEX IF NOT EXISTS idx_animals_birth ON animals(birth_date)",
            ]
        );
    }
}
