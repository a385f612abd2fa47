//! SQLite pool

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

const POOL_SIZE: u32 = 8;

const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;
     PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA busy_timeout = 5000;";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database pool error: {0}")]
    Connection(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored data is invalid: {0}")]
    InvalidData(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Shared handle to the nutrition store. Clones share one pool.
#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl Database {
    /// Open (or create) the store at `path` without touching the schema
    pub fn new<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let manager = SqliteConnectionManager::file(path)
            .with_flags(flags)
            .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));

        let pool = Pool::builder().max_size(POOL_SIZE).build(manager)?;
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Open the store and apply pending migrations
    pub fn open_migrated<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let database = Self::new(path)?;
        database.with_conn(super::migrations::run_migrations)?;
        Ok(database)
    }

    fn checkout(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    pub fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        let conn = self.checkout()?;
        f(&conn)
    }

    /// Mutable access, needed to open a transaction
    pub fn with_conn_mut<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut Connection) -> DbResult<T>,
    {
        let mut conn = self.checkout()?;
        f(&mut conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::{get_schema_version, SCHEMA_VERSION};

    #[test]
    fn test_open_migrated_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let database = Database::open_migrated(dir.path().join("test.db")).unwrap();
        let version = database.with_conn(get_schema_version).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_clones_share_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let first = Database::open_migrated(dir.path().join("shared.db")).unwrap();
        let second = first.clone();

        first
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO orders (platform, restaurant, items, total, order_date)
                     VALUES ('uber-eats', 'KFC', '[]', 1.0, '2025-03-05')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let count: i64 = second
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM orders", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 1);
    }
}
