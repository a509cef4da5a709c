/// Store connection, schema verification and session pooling.
///
/// The dataset is a pre-populated SQLite file managed outside this service.
/// It is opened read-only; the service never creates or alters tables.
/// Startup goes through `Store::open`, which refuses to return a store
/// unless both tables and all expected columns are present.

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Static definition of the tables the service reads.
///
/// The service only checks the live store against it. Tests and fixtures
/// execute it to build throwaway stores.
pub const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS station (
        id INTEGER PRIMARY KEY,
        station TEXT NOT NULL,
        name TEXT NOT NULL,
        latitude FLOAT NOT NULL,
        longitude FLOAT NOT NULL,
        elevation FLOAT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS measurement (
        id INTEGER PRIMARY KEY,
        station TEXT NOT NULL,
        date TEXT NOT NULL,
        prcp FLOAT,
        tobs FLOAT NOT NULL
    );
";

/// Tables and the columns each must carry. Extra columns are tolerated.
pub const EXPECTED_TABLES: &[(&str, &[&str])] = &[
    ("station", &["station", "name", "latitude", "longitude", "elevation"]),
    ("measurement", &["station", "date", "prcp", "tobs"]),
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(
        "database file not found: {0}\n\n  \
         Point DATABASE_PATH (or --database) at the climate dataset, \
         e.g. Resources/hawaii.sqlite"
    )]
    MissingDatabaseFile(PathBuf),

    #[error("failed to open SQLite database: {0}")]
    ConnectionFailed(#[from] rusqlite::Error),

    #[error("required table '{0}' does not exist in the store")]
    MissingTable(String),

    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Process-wide handle on the dataset.
///
/// Holds a small pool of idle read-only connections. Query operations borrow
/// one for the duration of a closure via `with_session`.
pub struct Store {
    path: PathBuf,
    pool_size: usize,
    idle: Mutex<Vec<Connection>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("pool_size", &self.pool_size)
            .field("idle", &self.idle.lock().len())
            .finish()
    }
}

impl Store {
    /// Opens the store at `path` and verifies its schema.
    ///
    /// Fails if the file is missing, cannot be opened, or lacks a required
    /// table or column. The verified connection seeds the pool.
    pub fn open(path: impl AsRef<Path>, pool_size: usize) -> Result<Store, StoreError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(StoreError::MissingDatabaseFile(path));
        }

        let conn = open_read_only(&path)?;
        verify_schema(&conn)?;
        info!(path = %path.display(), pool_size, "store opened and schema verified");

        Ok(Store {
            path,
            pool_size: pool_size.max(1),
            idle: Mutex::new(vec![conn]),
        })
    }

    /// Runs `work` with a pooled connection.
    ///
    /// The connection goes back to the pool once `work` returns, whether it
    /// succeeded or not. Nothing borrowed from the connection can escape the
    /// closure, so callers always get owned data back.
    pub fn with_session<T, E>(&self, work: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let conn = self.checkout()?;
        let result = work(&conn);
        self.release(conn);
        result
    }

    fn checkout(&self) -> Result<Connection, StoreError> {
        if let Some(conn) = self.idle.lock().pop() {
            return Ok(conn);
        }
        debug!(path = %self.path.display(), "pool empty, opening new connection");
        open_read_only(&self.path)
    }

    fn release(&self, conn: Connection) {
        let mut idle = self.idle.lock();
        if idle.len() < self.pool_size {
            idle.push(conn);
        }
    }
}

fn open_read_only(path: &Path) -> Result<Connection, StoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Ok(Connection::open_with_flags(path, flags)?)
}

/// Checks every table in `EXPECTED_TABLES` exists with its required columns.
pub fn verify_schema(conn: &Connection) -> Result<(), StoreError> {
    for (table, columns) in EXPECTED_TABLES {
        let present = table_columns(conn, table)?;
        if present.is_empty() {
            return Err(StoreError::MissingTable(table.to_string()));
        }
        if let Some(missing) = columns.iter().find(|c| !present.iter().any(|p| p == *c)) {
            return Err(StoreError::MissingColumn {
                table: table.to_string(),
                column: missing.to_string(),
            });
        }
    }
    Ok(())
}

/// Column names of `table`; empty when the table does not exist.
fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
