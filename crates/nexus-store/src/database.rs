use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::schema;

/// Shared handle to one SQLite connection.
///
/// rusqlite connections are `Send` but not `Sync`, so every access goes
/// through a `parking_lot` mutex. Clones share the connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    location: PathBuf,
}

impl Database {
    /// Open (creating if needed) the database file at `path` and bring its
    /// schema up to date.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| StoreError::Io(format!("{}: {e}", dir.display())))?;
        }
        let conn = Connection::open(path)?;
        let db = Self::prepare(conn, path.to_path_buf())?;
        info!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Private in-memory database, used by tests and `:memory:` setups.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::prepare(Connection::open_in_memory()?, PathBuf::from(":memory:"))
    }

    fn prepare(conn: Connection, location: PathBuf) -> Result<Self, StoreError> {
        conn.execute_batch(schema::PRAGMAS)?;
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        })
    }

    /// Run `f` against the connection while holding the lock.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let guard = self.conn.lock();
        f(&guard)
    }

    /// Run `f` inside an `IMMEDIATE` transaction. `Ok` commits; an error
    /// drops the transaction, rolling back everything `f` wrote.
    pub fn with_tx<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    {
        let mut guard = self.conn.lock();
        let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    pub fn location(&self) -> &Path {
        &self.location
    }
}

/// Bring the schema to `SCHEMA_VERSION`, tracked in `PRAGMA user_version`.
fn migrate(conn: &Connection) -> Result<(), StoreError> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if current > schema::SCHEMA_VERSION {
        return Err(StoreError::Database(format!(
            "schema version {current} is newer than this build ({})",
            schema::SCHEMA_VERSION
        )));
    }
    if current < schema::SCHEMA_VERSION {
        debug!(from = current, to = schema::SCHEMA_VERSION, "migrating schema");
        conn.execute_batch(schema::CREATE_TABLES)?;
        conn.pragma_update(None, "user_version", schema::SCHEMA_VERSION)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(db: &Database) -> u32 {
        db.with_conn(|conn| Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?))
            .unwrap()
    }

    #[test]
    fn in_memory_is_migrated() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.location(), Path::new(":memory:"));
        assert_eq!(user_version(&db), schema::SCHEMA_VERSION);

        let tables: Vec<String> = db
            .with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table'
                     AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let names = stmt.query_map([], |row| row.get(0))?;
                Ok(names.collect::<Result<_, _>>()?)
            })
            .unwrap();
        assert_eq!(tables, vec!["comments", "tickets", "users"]);
    }

    #[test]
    fn reopening_a_file_keeps_data() {
        let dir = std::env::temp_dir().join(format!("nexus-store-{}", uuid::Uuid::now_v7()));
        let path = dir.join("nested").join("desk.db");

        let first = Database::open(&path).unwrap();
        first
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO users (username, password_hash, role, display_name, created_at)
                     VALUES ('dean', 'h', 'dean', 'Dean', '2025-01-01T00:00:00.000000Z')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        drop(first);

        let second = Database::open(&path).unwrap();
        let users: i64 = second
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(users, 1);
        assert_eq!(user_version(&second), schema::SCHEMA_VERSION);
        drop(second);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", schema::SCHEMA_VERSION + 1)
            .unwrap();
        assert!(matches!(migrate(&conn), Err(StoreError::Database(_))));
    }

    #[test]
    fn error_in_transaction_rolls_back() {
        let db = Database::in_memory().unwrap();
        let result: Result<(), StoreError> = db.with_tx(|tx| {
            tx.execute(
                "INSERT INTO users (username, password_hash, role, display_name, created_at)
                 VALUES ('a', 'h', 'student', 'A', '2025-01-01T00:00:00.000000Z')",
                [],
            )?;
            Err(StoreError::Conflict("forced".into()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn comment_requires_existing_ticket() {
        let db = Database::in_memory().unwrap();
        let result = db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (ticket_id, author_id, author_name, body, created_at)
                 VALUES (999, 1, 'x', 'y', '2025-01-01T00:00:00.000000Z')",
                [],
            )?;
            Ok(())
        });
        assert!(result.is_err());
    }
}
