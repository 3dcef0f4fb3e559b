//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    if current_version < 2 {
        migrate_v2(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (2)", [])?;
        tracing::info!("Applied schema migration v2");
    }

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- PRODUCTS
        -- Reference nutrient values at a base quantity
        -- ============================================
        CREATE TABLE products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            brand TEXT,
            unit TEXT NOT NULL DEFAULT 'g',
            quantity REAL NOT NULL,              -- reference quantity, e.g. 100
            protein REAL NOT NULL DEFAULT 0,     -- grams per reference quantity
            fat REAL NOT NULL DEFAULT 0,
            carbs REAL NOT NULL DEFAULT 0,
            calories REAL NOT NULL DEFAULT 0,
            user_created INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (quantity > 0)
        );

        CREATE INDEX idx_products_name ON products(name);

        -- ============================================
        -- MEAL ENTRIES
        -- Consumed portions with nutrients at the eaten quantity
        -- ============================================
        CREATE TABLE meal_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id INTEGER REFERENCES products(id) ON DELETE SET NULL,
            product_name TEXT NOT NULL,
            meal_type TEXT NOT NULL,
            date TEXT NOT NULL,                  -- local calendar day, YYYY-MM-DD
            timezone TEXT NOT NULL DEFAULT 'UTC',
            quantity REAL NOT NULL,
            protein REAL NOT NULL,
            fat REAL NOT NULL,
            carbs REAL NOT NULL,
            calories REAL NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_meal_entries_date ON meal_entries(date);
        "#,
    )?;

    Ok(())
}

/// Migration v2: Body weight history
fn migrate_v2(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE weight_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            weight_kg REAL NOT NULL,
            date TEXT NOT NULL,                  -- local calendar day, YYYY-MM-DD
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (weight_kg > 0)
        );

        CREATE INDEX idx_weight_entries_date ON weight_entries(date);
        "#,
    )?;

    Ok(())
}
