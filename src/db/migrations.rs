//! Versioned schema migrations
//!
//! Each step runs once and is recorded in `schema_migrations`.

use rusqlite::Connection;

use super::connection::DbResult;

type Migration = fn(&Connection) -> DbResult<()>;

/// Steps in version order; the last entry is the current schema
const MIGRATIONS: &[(i32, Migration)] = &[(1, migrate_v1)];

pub const SCHEMA_VERSION: i32 = 1;

/// Apply every step newer than the stored version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current = get_schema_version(conn)?;
    for (version, migrate) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        migrate(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [version])?;
        tracing::info!(version, "applied schema migration");
    }

    Ok(())
}

/// Profiles, history entries and delivery orders
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- USER PROFILES
        -- Inputs for daily-needs estimation
        -- ============================================
        CREATE TABLE user_profiles (
            user_id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            dob_month INTEGER NOT NULL CHECK(dob_month BETWEEN 1 AND 12),
            dob_year INTEGER NOT NULL,
            gender TEXT NOT NULL,
            weight_kg REAL NOT NULL,
            height_feet INTEGER NOT NULL,
            height_inches INTEGER NOT NULL,
            activity_level TEXT NOT NULL DEFAULT 'moderate',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- NUTRITION HISTORY
        -- Normalized entries per user, queried by trailing window
        -- ============================================
        CREATE TABLE nutrition_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            food TEXT NOT NULL,
            source TEXT NOT NULL CHECK(source IN ('manual', 'image', 'order')),

            calories REAL NOT NULL DEFAULT 0,
            protein REAL NOT NULL DEFAULT 0,     -- grams
            carbs REAL NOT NULL DEFAULT 0,       -- grams
            fat REAL NOT NULL DEFAULT 0,         -- grams
            fiber REAL NOT NULL DEFAULT 0,       -- grams
            sugar REAL NOT NULL DEFAULT 0,       -- grams
            vitamins TEXT NOT NULL DEFAULT '',   -- comma-joined labels
            minerals TEXT NOT NULL DEFAULT '',   -- comma-joined labels

            recorded_at TEXT NOT NULL,           -- 2025-03-10T18:30:00Z or bare 2025-03-10
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_history_user_time ON nutrition_history(user_id, recorded_at);

        -- ============================================
        -- ORDERS
        -- Delivery order history per platform
        -- ============================================
        CREATE TABLE orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            platform TEXT NOT NULL,              -- e.g. "uber-eats"
            restaurant TEXT NOT NULL,
            items TEXT NOT NULL,                 -- JSON array of item names
            total REAL NOT NULL DEFAULT 0,
            order_date TEXT NOT NULL,            -- ISO date: "2025-03-10"
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_orders_platform_date ON orders(platform, order_date);
        "#,
    )?;

    Ok(())
}

/// Highest applied version, 0 on a fresh store
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?)
}
